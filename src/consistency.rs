//! rule based neighbor consistency.
//!
//! a [`ConsistencyFilter`] decides, for every neighbor and every candidate
//! consistency level, whether the neighbor may vote.

use crate::neighbor::Neighbor;
use crate::table::TrainingTable;

pub trait ConsistencyFilter {
    /// fills `Neighbor::consistent` with one flag per level. minority class
    /// neighbors are tested against `s_min_levels`, the others against
    /// `s_maj_levels`. must keep the number and order of neighbors
    fn mark_consistency_levels(
        &self,
        query: &[f64],
        neighbors: &mut [Neighbor],
        minority: usize,
        s_min_levels: &[f64],
        s_maj_levels: &[f64],
    );
}

/// consistency of the local rule spanned by the query and a neighbor.
///
/// the rule covers every retrieved neighbor inside the axis aligned box
/// whose opposite corners are the query and the neighbor. the consistency
/// is `(same - other) / (same + other)` over the covered neighbors, so a
/// pure rule scores `1` and the neighbor itself always counts as `same`.
/// a neighbor is consistent at level `s` when its score is at least `s`.
#[derive(Debug, Clone, Copy)]
pub struct RuleConsistencyFilter<'a> {
    table: &'a TrainingTable,
}

impl<'a> RuleConsistencyFilter<'a> {
    pub fn new(table: &'a TrainingTable) -> Self {
        Self { table }
    }

    /// score of the rule spanned by `query` and `neighbors[target]`
    pub fn rule_consistency(&self, query: &[f64], neighbors: &[Neighbor], target: usize) -> f64 {
        let anchor = &self.table.record(neighbors[target].index).data;
        let class = neighbors[target].class;

        let mut same = 0usize;
        let mut other = 0usize;

        for neighbor in neighbors {
            let data = &self.table.record(neighbor.index).data;

            let covered = query
                .iter()
                .zip(anchor)
                .zip(data)
                .all(|((q, a), v)| q.min(*a) <= *v && *v <= q.max(*a));

            if !covered {
                continue;
            }

            if neighbor.class == class {
                same += 1;
            } else {
                other += 1;
            }
        }

        (same as f64 - other as f64) / (same + other) as f64
    }
}

impl ConsistencyFilter for RuleConsistencyFilter<'_> {
    fn mark_consistency_levels(
        &self,
        query: &[f64],
        neighbors: &mut [Neighbor],
        minority: usize,
        s_min_levels: &[f64],
        s_maj_levels: &[f64],
    ) {
        let scores: Vec<f64> = (0..neighbors.len())
            .map(|target| self.rule_consistency(query, neighbors, target))
            .collect();

        for (neighbor, score) in neighbors.iter_mut().zip(scores) {
            let levels = if neighbor.class == minority {
                s_min_levels
            } else {
                s_maj_levels
            };

            neighbor.consistent.clear();
            neighbor.consistent.extend(levels.iter().map(|level| score >= *level));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::distance::Metric;
    use crate::neighbor::{BruteForceProvider, NeighborhoodProvider};

    fn table() -> TrainingTable {
        TrainingTable::from_labelled(vec![
            (vec![1.0, 1.0], "maj"),
            (vec![2.0, 2.0], "min"),
            (vec![1.5, 1.5], "maj"),
            (vec![3.0, 3.0], "maj"),
            (vec![-1.0, -1.0], "maj"),
        ])
        .unwrap()
    }

    #[test]
    fn pure_rule_scores_one() {
        let table = table();
        let filter = RuleConsistencyFilter::new(&table);
        let neighbors = BruteForceProvider::new(&table, Metric::Euclidean).vicinity(&[0.0, 0.0], 5);

        // the box from the origin to (1, 1) only covers (1, 1) itself
        let target = neighbors.iter().position(|n| n.index == 0).unwrap();

        assert_eq!(filter.rule_consistency(&[0.0, 0.0], &neighbors, target), 1.0);
    }

    #[test]
    fn mixed_rule_scores_below_one() {
        let table = table();
        let filter = RuleConsistencyFilter::new(&table);
        let neighbors = BruteForceProvider::new(&table, Metric::Euclidean).vicinity(&[0.0, 0.0], 5);

        // the box from the origin to (3, 3) covers 3 maj and 1 min objects
        let target = neighbors.iter().position(|n| n.index == 3).unwrap();

        assert_eq!(filter.rule_consistency(&[0.0, 0.0], &neighbors, target), 0.5);

        // the minority object at (2, 2) covers 2 maj objects and itself
        let target = neighbors.iter().position(|n| n.index == 1).unwrap();
        let score = filter.rule_consistency(&[0.0, 0.0], &neighbors, target);

        assert!((score - (-1.0 / 3.0)).abs() < 1e-12);
    }

    #[test]
    fn marks_one_flag_per_level() {
        let table = table();
        let filter = RuleConsistencyFilter::new(&table);
        let mut neighbors =
            BruteForceProvider::new(&table, Metric::Euclidean).vicinity(&[0.0, 0.0], 5);
        let order: Vec<usize> = neighbors.iter().map(|n| n.index).collect();
        let minority = table.decision().local_code("min").unwrap();

        filter.mark_consistency_levels(
            &[0.0, 0.0],
            &mut neighbors,
            minority,
            &[-1.0, 0.0],
            &[-1.0, 0.5, 1.0],
        );

        // order and count are kept
        assert_eq!(neighbors.iter().map(|n| n.index).collect::<Vec<_>>(), order);

        for neighbor in &neighbors {
            if neighbor.class == minority {
                assert_eq!(neighbor.consistent, vec![true, false]);
            } else {
                assert_eq!(neighbor.consistent.len(), 3);
                // unconstrained always passes
                assert!(neighbor.consistent[0]);
            }
        }

        let far = neighbors.iter().find(|n| n.index == 3).unwrap();

        assert_eq!(far.consistent, vec![true, true, false]);
    }

    #[test]
    fn marking_twice_is_stable() {
        let table = table();
        let filter = RuleConsistencyFilter::new(&table);
        let mut neighbors =
            BruteForceProvider::new(&table, Metric::Euclidean).vicinity(&[0.0, 0.0], 5);

        filter.mark_consistency_levels(&[0.0, 0.0], &mut neighbors, 1, &[0.0], &[0.0]);
        let first = neighbors.clone();
        filter.mark_consistency_levels(&[0.0, 0.0], &mut neighbors, 1, &[0.0], &[0.0]);

        assert_eq!(first, neighbors);
    }
}

//! neighborhood retrieval.
//!
//! a [`NeighborhoodProvider`] returns the objects nearest to a query sorted
//! by ascending distance. objects at equal distance come back in ascending
//! object index order, which keeps every classification deterministic.

use crate::ball_tree::BallTreeProvider;
use crate::distance::Metric;
use crate::table::TrainingTable;

/// one retrieved training object
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// index of the object in the training table
    pub index: usize,
    pub distance: f64,
    /// local decision code of the object
    pub class: usize,
    /// one flag per consistency level of the axis matching `class`. empty
    /// until a consistency filter marks the neighbor
    pub consistent: Vec<bool>,
}

impl Neighbor {
    pub fn new(index: usize, distance: f64, class: usize) -> Self {
        Self {
            index,
            distance,
            class,
            consistent: Vec::new(),
        }
    }

    /// whether the neighbor passed the filter at the given level index.
    /// unmarked neighbors always pass
    pub fn is_consistent(&self, level: usize) -> bool {
        self.consistent.get(level).copied().unwrap_or(true)
    }
}

/// source of distance ranked neighborhoods
pub trait NeighborhoodProvider {
    /// the `count` objects nearest to `query`, or every object when the
    /// table is smaller
    fn vicinity(&self, query: &[f64], count: usize) -> Vec<Neighbor>;
}

/// linear scan over every training object
#[derive(Debug, Clone, Copy)]
pub struct BruteForceProvider<'a> {
    table: &'a TrainingTable,
    metric: Metric,
}

impl<'a> BruteForceProvider<'a> {
    pub fn new(table: &'a TrainingTable, metric: Metric) -> Self {
        Self { table, metric }
    }
}

impl NeighborhoodProvider for BruteForceProvider<'_> {
    fn vicinity(&self, query: &[f64], count: usize) -> Vec<Neighbor> {
        // collect the records with the calculated distance from the query
        let mut collected: Vec<Neighbor> = self
            .table
            .records()
            .iter()
            .enumerate()
            .map(|(index, record)| {
                Neighbor::new(index, self.metric.distance(query, &record.data), record.class)
            })
            .collect();

        // sort_by is stable so records at equal distance keep their index
        // order. floats do not implement Ord so compare with f64::total_cmp
        collected.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        collected.truncate(count);

        collected
    }
}

/// builds the provider selected by the `indexing` switch
pub fn provider_for<'a>(
    table: &'a TrainingTable,
    metric: Metric,
    indexing: bool,
) -> Box<dyn NeighborhoodProvider + 'a> {
    if indexing {
        Box::new(BallTreeProvider::new(table, metric))
    } else {
        Box::new(BruteForceProvider::new(table, metric))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // (x, y) datapoints on a small graph
    fn table() -> TrainingTable {
        TrainingTable::from_labelled(vec![
            (vec![1.0, 1.0], "a"),
            (vec![2.0, 2.0], "b"),
            (vec![1.5, 2.5], "a"),
            (vec![1.0, 3.0], "b"),
            (vec![2.0, 1.0], "a"),
            (vec![1.0, 2.0], "b"),
            (vec![3.0, 1.0], "a"),
            (vec![2.5, 1.5], "b"),
        ])
        .unwrap()
    }

    #[test]
    fn vicinity_is_sorted_and_truncated() {
        let table = table();
        let provider = BruteForceProvider::new(&table, Metric::Euclidean);

        let found = provider.vicinity(&[1.5, 1.0], 3);

        assert_eq!(found.len(), 3);
        assert_eq!(found[0].distance, 0.5);
        assert_eq!(found[1].distance, 0.5);
        // equidistant records keep their index order
        assert_eq!(found[0].index, 0);
        assert_eq!(found[1].index, 4);
        assert!(found[2].distance >= found[1].distance);
    }

    #[test]
    fn vicinity_returns_whole_table_when_small() {
        let table = table();
        let provider = BruteForceProvider::new(&table, Metric::Manhattan);

        assert_eq!(provider.vicinity(&[0.0, 0.0], 100).len(), 8);
    }

    #[test]
    fn vicinity_carries_classes() {
        let table = table();
        let provider = BruteForceProvider::new(&table, Metric::Euclidean);

        let found = provider.vicinity(&[1.0, 3.0], 1);

        assert_eq!(found[0].index, 3);
        assert_eq!(found[0].distance, 0.0);
        assert_eq!(found[0].class, table.decision().local_code("b").unwrap());
    }

    #[test]
    fn unmarked_neighbor_is_consistent() {
        let mut neighbor = Neighbor::new(0, 1.0, 0);

        assert!(neighbor.is_consistent(3));

        neighbor.consistent = vec![true, false];

        assert!(neighbor.is_consistent(0));
        assert!(!neighbor.is_consistent(1));
    }
}

//! classification of one query at every point of a parameter grid.
//!
//! the neighborhood is retrieved once for the largest `k`. for every
//! `(s_min, s_maj)` level combination the neighbors are then scanned in
//! increasing `k`, accumulating votes as they go. whenever the distance
//! changes the accumulated vote decides every `k` since the previous
//! distance change, so neighbors tied at one distance always vote together.
//!
//! ```text
//! classify()
//!   ├─ retrieve()                 max_k + 1 neighbors, minus the query itself
//!   ├─ contradictory_prefix()     zero distance fast path
//!   ├─ mark_consistency_levels()  (consistency.rs)
//!   └─ per level combination
//!        ├─ fill_from_ratio()     both levels >= 0 and a contradictory prefix
//!        └─ per distance boundary: p_value() -> decide() for every p
//! ```

use std::ops::RangeInclusive;

use tracing::trace;

use crate::config::{InconsistencyPolicy, RionidaConfig, VotingScheme};
use crate::consistency::ConsistencyFilter;
use crate::error::{InternalError, RionidaError};
use crate::neighbor::{Neighbor, NeighborhoodProvider};
use crate::space::{GridIndex, ParameterSpace};
use crate::voting::DecisionDistribution;

/// marks a grid point that has not been decided yet
pub const UNSET: usize = usize::MAX;

/// the object being classified
#[derive(Debug, Clone, Copy)]
pub struct Query<'q> {
    pub data: &'q [f64],
    /// training index of the query when it is itself a training object.
    /// it is then left out of its own neighborhood
    pub exclude: Option<usize>,
}

impl<'q> Query<'q> {
    /// an object that is not part of the training table
    pub fn unseen(data: &'q [f64]) -> Self {
        Self {
            data,
            exclude: None,
        }
    }

    /// a training object classified in leave one out mode
    pub fn self_learning(data: &'q [f64], index: usize) -> Self {
        Self {
            data,
            exclude: Some(index),
        }
    }
}

/// options read by the sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    pub voting: VotingScheme,
    pub policy: InconsistencyPolicy,
    pub filter: bool,
    pub fast_path: bool,
}

impl From<&RionidaConfig> for SweepSettings {
    fn from(config: &RionidaConfig) -> Self {
        Self {
            voting: config.voting(),
            policy: config.inconsistency_policy(),
            filter: config.filter_neighbours_using_rules(),
            fast_path: config.zero_distance_fast_path(),
        }
    }
}

/// decision at one threshold. ties and NaN both resolve to the minority
pub fn decide(threshold: f64, p_value: f64, minority: usize) -> usize {
    if threshold > p_value {
        1 - minority
    } else {
        minority
    }
}

/// classifier producing one decision per point of a parameter grid
pub struct ParameterSweep<'a> {
    provider: &'a dyn NeighborhoodProvider,
    filter: &'a dyn ConsistencyFilter,
    settings: SweepSettings,
}

impl<'a> ParameterSweep<'a> {
    pub fn new(
        provider: &'a dyn NeighborhoodProvider,
        filter: &'a dyn ConsistencyFilter,
        settings: SweepSettings,
    ) -> Self {
        Self {
            provider,
            filter,
            settings,
        }
    }

    pub fn settings(&self) -> SweepSettings {
        self.settings
    }

    /// the `count` nearest neighbors of the query, skipping the query itself
    /// in self learning mode. relative order is preserved
    pub fn retrieve(&self, query: Query<'_>, count: usize) -> Vec<Neighbor> {
        match query.exclude {
            Some(own) => {
                let mut found = self.provider.vicinity(query.data, count + 1);

                found.retain(|neighbor| neighbor.index != own);
                found.truncate(count);
                found
            }
            None => self.provider.vicinity(query.data, count),
        }
    }

    /// one local decision code per flat index of `space`
    pub fn classify(
        &self,
        query: Query<'_>,
        minority: usize,
        space: &ParameterSpace,
    ) -> Result<Vec<usize>, RionidaError> {
        let max_k = space.max_k();
        let mut neighbors = self.retrieve(query, max_k + 1);
        let mut decisions = vec![UNSET; space.volume()];

        let zero_ratio = if self.settings.fast_path {
            contradictory_prefix(&neighbors, minority)
        } else {
            None
        };

        if let Some(ratio) = zero_ratio {
            trace!(ratio, "zero distance neighbors disagree");
        }

        let needs_sweep = zero_ratio.is_none() || has_unconstrained_level(space);

        if self.settings.filter && needs_sweep {
            self.filter.mark_consistency_levels(
                query.data,
                &mut neighbors,
                minority,
                space.s_min_axis().values(),
                space.majority_levels(),
            );
        }

        let mut distribution = DecisionDistribution::new();

        for s_maj in 0..space.s_maj_axis().size() {
            for s_min in 0..space.s_min_axis().size() {
                let levels = Levels {
                    s_min,
                    s_maj,
                    // majority neighbors read the s_min level in 3D mode
                    majority: if space.is_4d() { s_maj } else { s_min },
                };

                match zero_ratio {
                    Some(ratio) if levels.constrained(space) => {
                        fill_from_ratio(space, levels, ratio, minority, &mut decisions);
                    }
                    _ => {
                        distribution.reset();

                        self.sweep_levels(
                            &neighbors,
                            minority,
                            space,
                            levels,
                            &mut distribution,
                            &mut decisions,
                        );
                    }
                }
            }
        }

        verified(decisions)
    }

    /// scans the neighbors for one level combination
    fn sweep_levels(
        &self,
        neighbors: &[Neighbor],
        minority: usize,
        space: &ParameterSpace,
        levels: Levels,
        distribution: &mut DecisionDistribution,
        decisions: &mut [usize],
    ) {
        let max_k = space.max_k();

        // no evidence at k = 0
        write_range(space, levels, 0..=0, decisions, |_| 1 - minority);

        // first k that has not been decided yet
        let mut next_k = 1;

        for (i, neighbor) in neighbors.iter().enumerate() {
            if next_k > max_k {
                break;
            }

            let level = if neighbor.class == minority {
                levels.s_min
            } else {
                levels.majority
            };

            if self.settings.filter {
                let expected = if neighbor.class == minority {
                    space.s_min_axis().size()
                } else {
                    space.majority_levels().len()
                };

                debug_assert_eq!(
                    neighbor.consistent.len(),
                    expected,
                    "neighbor {} is missing consistency flags",
                    neighbor.index
                );
            }

            if !self.settings.filter || neighbor.is_consistent(level) {
                distribution.add(neighbor.class, neighbor.distance, self.settings.voting);
            }

            let boundary = neighbors
                .get(i + 1)
                .is_none_or(|next| next.distance != neighbor.distance);

            if !boundary {
                continue;
            }

            let p_value = self.p_value(distribution, neighbors, minority);
            let last_k = (i + 1).min(max_k);

            write_range(space, levels, next_k..=last_k, decisions, |threshold| {
                decide(threshold, p_value, minority)
            });

            next_k = i + 2;
        }

        // fewer neighbors than max_k, every remaining k sees them all
        if next_k <= max_k {
            let p_value = self.p_value(distribution, neighbors, minority);

            write_range(space, levels, next_k..=max_k, decisions, |threshold| {
                decide(threshold, p_value, minority)
            });
        }
    }

    /// minority share of the vote, applying the inconsistency policy when
    /// every vote was filtered out
    fn p_value(
        &self,
        distribution: &DecisionDistribution,
        neighbors: &[Neighbor],
        minority: usize,
    ) -> f64 {
        if !distribution.is_degenerate() {
            return distribution.p_value(minority);
        }

        match (self.settings.policy, neighbors.first()) {
            (InconsistencyPolicy::ZeroAndEqDistCount, Some(first)) => {
                let tied = neighbors
                    .iter()
                    .take_while(|neighbor| neighbor.distance == first.distance)
                    .count();

                let mut substitute = DecisionDistribution::new();

                substitute.add_all(&neighbors[..tied], self.settings.voting);
                substitute.p_value(minority)
            }
            _ => distribution.p_value(minority),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Levels {
    s_min: usize,
    s_maj: usize,
    majority: usize,
}

impl Levels {
    /// both classes are held to a consistency level of at least 0
    fn constrained(&self, space: &ParameterSpace) -> bool {
        space.s_min_axis().value_at(self.s_min) >= 0.0
            && space.majority_levels()[self.majority] >= 0.0
    }
}

/// whether some level combination leaves a class unconstrained. those
/// combinations are always swept in full
fn has_unconstrained_level(space: &ParameterSpace) -> bool {
    space.s_min_axis().values().iter().any(|s| *s < 0.0)
        || space.majority_levels().iter().any(|s| *s < 0.0)
}

/// writes the decision for every `k` in `ks` and every `p` threshold
fn write_range<F>(
    space: &ParameterSpace,
    levels: Levels,
    ks: RangeInclusive<usize>,
    decisions: &mut [usize],
    decision_for: F,
) where
    F: Fn(f64) -> usize,
{
    for (p, threshold) in space.p_axis().values().iter().enumerate() {
        let decision = decision_for(*threshold);

        for k in ks.clone() {
            let flat = space.flat_index(GridIndex {
                k,
                p,
                s_min: levels.s_min,
                s_maj: levels.s_maj,
            });

            decisions[flat] = decision;
        }
    }
}

/// minority share among the neighbors at distance 0, when they hold both
/// classes
fn contradictory_prefix(neighbors: &[Neighbor], minority: usize) -> Option<f64> {
    let mut counts = [0usize; 2];

    for neighbor in neighbors.iter().take_while(|n| n.distance == 0.0) {
        counts[neighbor.class] += 1;
    }

    if counts[0] == 0 || counts[1] == 0 {
        return None;
    }

    Some(counts[minority] as f64 / (counts[0] + counts[1]) as f64)
}

/// decides one level combination from the zero distance ratio alone.
/// neighbors beyond the zero distance prefix are not consulted
fn fill_from_ratio(
    space: &ParameterSpace,
    levels: Levels,
    ratio: f64,
    minority: usize,
    decisions: &mut [usize],
) {
    write_range(space, levels, 0..=0, decisions, |_| 1 - minority);
    write_range(space, levels, 1..=space.max_k(), decisions, |threshold| {
        decide(threshold, ratio, minority)
    });
}

fn verified(decisions: Vec<usize>) -> Result<Vec<usize>, RionidaError> {
    if let Some(index) = decisions.iter().position(|decision| *decision == UNSET) {
        return Err(InternalError::UnsetDecision { index }.into());
    }

    Ok(decisions)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::consistency::RuleConsistencyFilter;
    use crate::distance::Metric;
    use crate::neighbor::BruteForceProvider;
    use crate::space::{ParameterAxis, ParameterPoint};
    use crate::table::TrainingTable;

    /// a provider returning a fixed neighborhood
    struct Fixed(Vec<Neighbor>);

    impl NeighborhoodProvider for Fixed {
        fn vicinity(&self, _query: &[f64], count: usize) -> Vec<Neighbor> {
            self.0.iter().take(count).cloned().collect()
        }
    }

    /// a filter rejecting every neighbor at every level above -1
    struct RejectAll;

    impl ConsistencyFilter for RejectAll {
        fn mark_consistency_levels(
            &self,
            _query: &[f64],
            neighbors: &mut [Neighbor],
            _minority: usize,
            s_min_levels: &[f64],
            s_maj_levels: &[f64],
        ) {
            for neighbor in neighbors {
                let levels = if neighbor.class == 1 {
                    s_min_levels
                } else {
                    s_maj_levels
                };

                neighbor.consistent = levels.iter().map(|s| *s <= -1.0).collect();
            }
        }
    }

    fn settings(voting: VotingScheme) -> SweepSettings {
        SweepSettings {
            voting,
            policy: InconsistencyPolicy::ZeroDistCount,
            filter: false,
            fast_path: true,
        }
    }

    fn space(max_k: usize, p: &[f64], s_min: &[f64]) -> ParameterSpace {
        ParameterSpace::new_3d(
            ParameterAxis::new("k", (0..=max_k).collect()).unwrap(),
            ParameterAxis::new("p", p.to_vec()).unwrap(),
            ParameterAxis::new("s_min", s_min.to_vec()).unwrap(),
        )
        .unwrap()
    }

    fn at(space: &ParameterSpace, decisions: &[usize], k: usize, p: f64, s: f64) -> usize {
        let flat = space
            .index_of(&ParameterPoint {
                k,
                p,
                s_min: s,
                s_maj: s,
            })
            .unwrap();

        decisions[flat]
    }

    #[test]
    fn k_zero_is_majority() {
        let provider = Fixed(vec![Neighbor::new(0, 1.0, 1), Neighbor::new(1, 2.0, 1)]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));
        let space = space(2, &[0.0, 0.5, 1.0], &[-1.0]);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        for p in [0.0, 0.5, 1.0] {
            assert_eq!(at(&space, &decisions, 0, p, -1.0), 0);
            // every neighbor is minority so the share is 1
            assert_eq!(at(&space, &decisions, 1, p, -1.0), 1);
            assert_eq!(at(&space, &decisions, 2, p, -1.0), 1);
        }
    }

    #[test]
    fn threshold_tie_resolves_to_minority() {
        let provider = Fixed(vec![Neighbor::new(0, 1.0, 1), Neighbor::new(1, 2.0, 0)]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));
        let space = space(2, &[0.4, 0.5, 0.6], &[-1.0]);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        assert_eq!(at(&space, &decisions, 2, 0.4, -1.0), 1);
        assert_eq!(at(&space, &decisions, 2, 0.5, -1.0), 1);
        assert_eq!(at(&space, &decisions, 2, 0.6, -1.0), 0);
    }

    #[test]
    fn tied_neighbors_vote_together() {
        // neighbors 2 and 3 share a distance, so k = 2 already sees both
        let provider = Fixed(vec![
            Neighbor::new(0, 1.0, 0),
            Neighbor::new(1, 2.0, 1),
            Neighbor::new(2, 2.0, 1),
            Neighbor::new(3, 3.0, 0),
        ]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));
        let space = space(3, &[0.6, 0.7], &[-1.0]);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        // k = 1 sees one majority vote
        assert_eq!(at(&space, &decisions, 1, 0.6, -1.0), 0);
        // k = 2 and 3 see 2 of 3 minority votes
        assert_eq!(at(&space, &decisions, 2, 0.6, -1.0), 1);
        assert_eq!(at(&space, &decisions, 3, 0.6, -1.0), 1);
        assert_eq!(at(&space, &decisions, 3, 0.7, -1.0), 0);
    }

    #[test]
    fn small_neighborhood_fills_remaining_k() {
        let provider = Fixed(vec![Neighbor::new(0, 1.0, 1)]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));
        let space = space(4, &[0.5], &[-1.0]);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        assert_eq!(decisions, vec![0, 1, 1, 1, 1]);
    }

    #[test]
    fn self_learning_skips_query() {
        let provider = Fixed(vec![
            Neighbor::new(4, 0.0, 0),
            Neighbor::new(1, 1.0, 1),
            Neighbor::new(2, 2.0, 0),
        ]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));

        let found = sweep.retrieve(Query::self_learning(&[0.0], 4), 2);

        assert_eq!(found.iter().map(|n| n.index).collect::<Vec<_>>(), vec![1, 2]);

        let found = sweep.retrieve(Query::self_learning(&[0.0], 9), 2);

        assert_eq!(found.iter().map(|n| n.index).collect::<Vec<_>>(), vec![4, 1]);
    }

    #[test]
    fn filtered_out_votes_resolve_by_policy() {
        let provider = Fixed(vec![
            Neighbor::new(0, 1.0, 0),
            Neighbor::new(1, 1.0, 0),
            Neighbor::new(2, 2.0, 1),
        ]);
        let space = space(3, &[0.5], &[-1.0, 1.0]);
        let mut settings = settings(VotingScheme::Equal);

        settings.filter = true;

        // without substitution the empty vote goes to the minority
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings);
        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        assert_eq!(at(&space, &decisions, 2, 0.5, 1.0), 1);
        // unconstrained level keeps every vote
        assert_eq!(at(&space, &decisions, 2, 0.5, -1.0), 0);

        // substitution uses the two majority neighbors tied at distance 1
        settings.policy = InconsistencyPolicy::ZeroAndEqDistCount;

        let sweep = ParameterSweep::new(&provider, &RejectAll, settings);
        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        assert_eq!(at(&space, &decisions, 2, 0.5, 1.0), 0);
        assert_eq!(at(&space, &decisions, 3, 0.5, 1.0), 0);
    }

    #[test]
    fn fast_path_uses_zero_distance_ratio() {
        let provider = Fixed(vec![
            Neighbor::new(0, 0.0, 0),
            Neighbor::new(1, 0.0, 1),
            Neighbor::new(2, 0.0, 0),
            Neighbor::new(3, 0.5, 1),
        ]);
        let sweep = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal));
        let space = space(3, &[0.3, 1.0 / 3.0, 0.4], &[0.0, 1.0]);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        for s in [0.0, 1.0] {
            assert_eq!(at(&space, &decisions, 0, 0.3, s), 0);

            for k in 1..=3 {
                assert_eq!(at(&space, &decisions, k, 0.3, s), 1);
                assert_eq!(at(&space, &decisions, k, 1.0 / 3.0, s), 1);
                assert_eq!(at(&space, &decisions, k, 0.4, s), 0);
            }
        }
    }

    /// a majority and a minority object at the query, then three majority
    /// objects close by
    fn contradictory_origin() -> Fixed {
        Fixed(vec![
            Neighbor::new(0, 0.0, 0),
            Neighbor::new(1, 0.0, 1),
            Neighbor::new(2, 0.1, 0),
            Neighbor::new(3, 0.2, 0),
            Neighbor::new(4, 0.3, 0),
        ])
    }

    #[test]
    fn unconstrained_levels_sweep_past_zero_distance() {
        let provider = contradictory_origin();
        let space = space(4, &[0.5], &[-1.0]);
        let mut settings = settings(VotingScheme::Equal);

        let fast = ParameterSweep::new(&provider, &RejectAll, settings)
            .classify(Query::unseen(&[0.0]), 1, &space)
            .unwrap();

        settings.fast_path = false;

        let full = ParameterSweep::new(&provider, &RejectAll, settings)
            .classify(Query::unseen(&[0.0]), 1, &space)
            .unwrap();

        // k = 3 and 4 see the close majority objects
        assert_eq!(fast, vec![0, 1, 1, 0, 0]);
        assert_eq!(fast, full);
    }

    #[test]
    fn fast_path_only_covers_constrained_levels() {
        let provider = contradictory_origin();
        let space = space(4, &[0.5], &[-1.0, 0.0]);

        let decisions = ParameterSweep::new(&provider, &RejectAll, settings(VotingScheme::Equal))
            .classify(Query::unseen(&[0.0]), 1, &space)
            .unwrap();

        let unconstrained: Vec<usize> = (0..=4)
            .map(|k| at(&space, &decisions, k, 0.5, -1.0))
            .collect();
        let constrained: Vec<usize> = (0..=4)
            .map(|k| at(&space, &decisions, k, 0.5, 0.0))
            .collect();

        assert_eq!(unconstrained, vec![0, 1, 1, 0, 0]);
        assert_eq!(constrained, vec![0, 1, 1, 1, 1]);
    }

    /// a filter that forgets to mark anything
    struct MarkNothing;

    impl ConsistencyFilter for MarkNothing {
        fn mark_consistency_levels(
            &self,
            _query: &[f64],
            _neighbors: &mut [Neighbor],
            _minority: usize,
            _s_min_levels: &[f64],
            _s_maj_levels: &[f64],
        ) {
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "missing consistency flags")]
    fn unmarked_neighbors_are_caught_when_filtering() {
        let provider = Fixed(vec![Neighbor::new(0, 1.0, 0), Neighbor::new(1, 2.0, 1)]);
        let mut settings = settings(VotingScheme::Equal);

        settings.filter = true;

        let _ = ParameterSweep::new(&provider, &MarkNothing, settings).classify(
            Query::unseen(&[0.0]),
            1,
            &space(1, &[0.5], &[-1.0, 0.5]),
        );
    }

    #[test]
    fn consistent_duplicates_skip_fast_path() {
        let table = TrainingTable::from_labelled(vec![
            (vec![0.0], "a"),
            (vec![0.0], "a"),
            (vec![1.0], "b"),
            (vec![2.0], "b"),
            (vec![3.0], "a"),
        ])
        .unwrap();
        let provider = BruteForceProvider::new(&table, Metric::Euclidean);
        let filter = RuleConsistencyFilter::new(&table);
        let sweep = ParameterSweep::new(&provider, &filter, settings(VotingScheme::Equal));
        let space = space(2, &[0.5], &[-1.0]);

        assert_eq!(contradictory_prefix(&sweep.retrieve(Query::unseen(&[0.0]), 3), 1), None);

        let decisions = sweep.classify(Query::unseen(&[0.0]), 1, &space).unwrap();

        assert_eq!(decisions, vec![0, 0, 0]);
    }
}

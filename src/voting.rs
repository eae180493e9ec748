//! accumulation of weighted neighbor votes.

use crate::config::VotingScheme;
use crate::neighbor::Neighbor;

/// weight a single vote cast from the given distance.
///
/// inverse schemes give `+inf` at distance 0. [`DecisionDistribution`]
/// keeps such votes in a separate tally instead of adding infinities.
pub fn vote_weight(scheme: VotingScheme, distance: f64) -> f64 {
    match scheme {
        VotingScheme::Equal => 1.0,
        VotingScheme::InverseDistance => 1.0 / distance,
        VotingScheme::InverseSquareDistance => 1.0 / (distance * distance),
    }
}

/// vote weight accumulated per decision class.
///
/// votes cast from distance 0 under an inverse scheme are infinitely
/// heavy. they are counted in `exact` and, once present, decide the ratio
/// on their own.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DecisionDistribution {
    weights: [f64; 2],
    exact: [f64; 2],
}

impl DecisionDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// zeroes the buffer so it can be reused for the next level combination
    pub fn reset(&mut self) {
        self.weights = [0.0; 2];
        self.exact = [0.0; 2];
    }

    /// adds one vote for `class` cast from `distance`
    pub fn add(&mut self, class: usize, distance: f64, scheme: VotingScheme) {
        let weight = vote_weight(scheme, distance);

        if weight.is_infinite() {
            self.exact[class] += 1.0;
        } else {
            self.weights[class] += weight;
        }
    }

    /// adds the votes of every given neighbor
    pub fn add_all(&mut self, neighbors: &[Neighbor], scheme: VotingScheme) {
        for neighbor in neighbors {
            self.add(neighbor.class, neighbor.distance, scheme);
        }
    }

    /// finite weight accumulated for a class
    pub fn weight(&self, class: usize) -> f64 {
        self.weights[class]
    }

    /// true when no vote has been cast
    pub fn is_degenerate(&self) -> bool {
        self.weights == [0.0; 2] && self.exact == [0.0; 2]
    }

    /// share of the vote held by the minority class. NaN when no vote has
    /// been cast
    pub fn p_value(&self, minority: usize) -> f64 {
        let (votes, total) = if self.exact[0] + self.exact[1] > 0.0 {
            (self.exact[minority], self.exact[0] + self.exact[1])
        } else {
            (self.weights[minority], self.weights[0] + self.weights[1])
        };

        votes / total
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn equal_votes_count_neighbors() {
        let mut dist = DecisionDistribution::new();
        let neighbors = vec![
            Neighbor::new(0, 0.5, 0),
            Neighbor::new(1, 1.0, 1),
            Neighbor::new(2, 2.0, 0),
        ];

        dist.add_all(&neighbors, VotingScheme::Equal);

        assert_eq!(dist.weight(0), 2.0);
        assert_eq!(dist.weight(1), 1.0);
        assert_eq!(dist.p_value(1), 1.0 / 3.0);
    }

    #[test]
    fn inverse_schemes() {
        assert_eq!(vote_weight(VotingScheme::InverseDistance, 4.0), 0.25);
        assert_eq!(vote_weight(VotingScheme::InverseSquareDistance, 4.0), 0.0625);
        assert!(vote_weight(VotingScheme::InverseDistance, 0.0).is_infinite());

        let mut dist = DecisionDistribution::new();

        dist.add(0, 2.0, VotingScheme::InverseSquareDistance);
        dist.add(1, 1.0, VotingScheme::InverseSquareDistance);

        assert_eq!(dist.p_value(1), 1.0 / 1.25);
    }

    #[test]
    fn zero_distance_votes_dominate() {
        let mut dist = DecisionDistribution::new();

        dist.add(0, 0.1, VotingScheme::InverseDistance);
        dist.add(0, 0.0, VotingScheme::InverseDistance);
        dist.add(1, 0.0, VotingScheme::InverseDistance);
        dist.add(1, 0.0, VotingScheme::InverseDistance);

        assert_eq!(dist.p_value(1), 2.0 / 3.0);
        assert_eq!(dist.p_value(0), 1.0 / 3.0);
    }

    #[test]
    fn empty_distribution_is_degenerate() {
        let mut dist = DecisionDistribution::new();

        assert!(dist.is_degenerate());
        assert!(dist.p_value(0).is_nan());

        dist.add(1, 3.0, VotingScheme::Equal);
        assert!(!dist.is_degenerate());

        dist.reset();
        assert!(dist.is_degenerate());
    }
}

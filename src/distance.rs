use std::str::FromStr;

use crate::error::RionidaError;

/// represents the metric used when calculating distances between objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Metric {
    #[default]
    Euclidean,
    Manhattan,
}

impl Metric {
    /// calculates the distance between 2 sets of attribute values
    pub fn distance(&self, a_data: &[f64], b_data: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => euclidean(a_data, b_data),
            Metric::Manhattan => manhattan(a_data, b_data),
        }
    }
}

impl FromStr for Metric {
    type Err = RionidaError;

    fn from_str(given: &str) -> Result<Self, Self::Err> {
        match given.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "manhattan" | "city-block" => Ok(Self::Manhattan),
            _ => Err(RionidaError::UnknownMetric(given.to_owned())),
        }
    }
}

/// calculates the euclidean distance between 2 sets of datapoints
pub fn euclidean(a_data: &[f64], b_data: &[f64]) -> f64 {
    // we will expect the total datapoints from a and b to be the same and just
    // zip them together for the iterator chain
    a_data
        .iter()
        .zip(b_data)
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// calculates the manhattan distance between 2 sets of datapoints
pub fn manhattan(a_data: &[f64], b_data: &[f64]) -> f64 {
    a_data
        .iter()
        .zip(b_data)
        .map(|(a, b)| (a - b).abs())
        .sum::<f64>()
}

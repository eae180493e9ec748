//! the parameter grid swept by the classifier.
//!
//! a [`ParameterSpace`] is the cartesian product of the `k`, `p`, `s_min` and
//! `s_maj` axes. every grid point has a flat index computed as a mixed radix
//! number with `k` as the innermost digit:
//!
//! ```text
//! index = k + |k| * (p + |p| * (s_min + |s_min| * s_maj))
//! ```
//!
//! the sweep walks neighbors in increasing `k`, so consecutive `k` values for
//! one `(p, s_min, s_maj)` combination sit next to each other.

use std::fmt::Display;

use crate::error::RionidaError;

/// value of the single `s_maj` candidate in 3D mode. it lies outside the
/// consistency level domain so it can never be mistaken for a real level
pub const S_MAJ_ARTIFICIAL: f64 = -2.0;

/// an ordered list of candidate values for one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAxis<V> {
    name: String,
    values: Vec<V>,
}

impl<V> ParameterAxis<V>
where
    V: Copy + PartialEq + Display,
{
    /// creates an axis. the values must be non empty and unique
    pub fn new(name: impl Into<String>, values: Vec<V>) -> Result<Self, RionidaError> {
        let name = name.into();

        let has_duplicate = values
            .iter()
            .enumerate()
            .any(|(index, value)| values[..index].contains(value));

        if values.is_empty() || has_duplicate {
            return Err(RionidaError::InvalidAxis { axis: name });
        }

        Ok(Self { name, values })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// exact match lookup of a value
    pub fn index_of(&self, value: V) -> Result<usize, RionidaError> {
        self.values
            .iter()
            .position(|known| *known == value)
            .ok_or_else(|| RionidaError::UnknownAxisValue {
                axis: self.name.clone(),
                value: value.to_string(),
            })
    }

    pub fn value_at(&self, index: usize) -> V {
        self.values[index]
    }
}

/// one point of the parameter grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPoint {
    pub k: usize,
    pub p: f64,
    pub s_min: f64,
    pub s_maj: f64,
}

/// axis indices of one grid point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridIndex {
    pub k: usize,
    pub p: usize,
    pub s_min: usize,
    pub s_maj: usize,
}

/// cartesian product of the four parameter axes
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpace {
    k_axis: ParameterAxis<usize>,
    p_axis: ParameterAxis<f64>,
    s_min_axis: ParameterAxis<f64>,
    s_maj_axis: ParameterAxis<f64>,
    four_d: bool,
}

impl ParameterSpace {
    /// a space where `s_maj` is not an independent axis. the majority level
    /// is read from `s_min` wherever it is needed
    pub fn new_3d(
        k_axis: ParameterAxis<usize>,
        p_axis: ParameterAxis<f64>,
        s_min_axis: ParameterAxis<f64>,
    ) -> Result<Self, RionidaError> {
        let s_maj_axis = ParameterAxis::new("s_maj", vec![S_MAJ_ARTIFICIAL])?;

        Self::build(k_axis, p_axis, s_min_axis, s_maj_axis, false)
    }

    pub fn new_4d(
        k_axis: ParameterAxis<usize>,
        p_axis: ParameterAxis<f64>,
        s_min_axis: ParameterAxis<f64>,
        s_maj_axis: ParameterAxis<f64>,
    ) -> Result<Self, RionidaError> {
        Self::build(k_axis, p_axis, s_min_axis, s_maj_axis, true)
    }

    fn build(
        k_axis: ParameterAxis<usize>,
        p_axis: ParameterAxis<f64>,
        s_min_axis: ParameterAxis<f64>,
        s_maj_axis: ParameterAxis<f64>,
        four_d: bool,
    ) -> Result<Self, RionidaError> {
        // the sweep relies on k axis index == k value
        let contiguous = k_axis
            .values()
            .iter()
            .enumerate()
            .all(|(index, k)| index == *k);

        if !contiguous {
            return Err(RionidaError::InvalidAxis {
                axis: k_axis.name().to_owned(),
            });
        }

        Ok(Self {
            k_axis,
            p_axis,
            s_min_axis,
            s_maj_axis,
            four_d,
        })
    }

    pub fn is_4d(&self) -> bool {
        self.four_d
    }

    pub fn k_axis(&self) -> &ParameterAxis<usize> {
        &self.k_axis
    }

    pub fn p_axis(&self) -> &ParameterAxis<f64> {
        &self.p_axis
    }

    pub fn s_min_axis(&self) -> &ParameterAxis<f64> {
        &self.s_min_axis
    }

    pub fn s_maj_axis(&self) -> &ParameterAxis<f64> {
        &self.s_maj_axis
    }

    /// the levels majority neighbors are tested against. in 3D mode these
    /// are the `s_min` levels
    pub fn majority_levels(&self) -> &[f64] {
        if self.four_d {
            self.s_maj_axis.values()
        } else {
            self.s_min_axis.values()
        }
    }

    pub fn max_k(&self) -> usize {
        self.k_axis.size() - 1
    }

    pub fn volume(&self) -> usize {
        self.k_axis.size() * self.p_axis.size() * self.s_min_axis.size() * self.s_maj_axis.size()
    }

    /// flat index of a grid point given by its axis indices
    pub fn flat_index(&self, grid: GridIndex) -> usize {
        let k_size = self.k_axis.size();
        let p_size = self.p_axis.size();
        let s_min_size = self.s_min_axis.size();

        grid.k + k_size * (grid.p + p_size * (grid.s_min + s_min_size * grid.s_maj))
    }

    /// inverse of [`ParameterSpace::flat_index`]
    pub fn grid_index(&self, flat: usize) -> GridIndex {
        let k_size = self.k_axis.size();
        let p_size = self.p_axis.size();
        let s_min_size = self.s_min_axis.size();

        let mut rest = flat;
        let k = rest % k_size;
        rest /= k_size;
        let p = rest % p_size;
        rest /= p_size;
        let s_min = rest % s_min_size;
        rest /= s_min_size;

        GridIndex {
            k,
            p,
            s_min,
            s_maj: rest,
        }
    }

    /// flat index of a point. every value must be taken from its axis.
    /// in 3D mode `s_maj` is ignored
    pub fn index_of(&self, point: &ParameterPoint) -> Result<usize, RionidaError> {
        let grid = GridIndex {
            k: self.k_axis.index_of(point.k)?,
            p: self.p_axis.index_of(point.p)?,
            s_min: self.s_min_axis.index_of(point.s_min)?,
            s_maj: if self.four_d {
                self.s_maj_axis.index_of(point.s_maj)?
            } else {
                0
            },
        };

        Ok(self.flat_index(grid))
    }

    /// the point stored at a flat index. in 3D mode `s_maj` mirrors `s_min`
    pub fn point_at(&self, flat: usize) -> ParameterPoint {
        let grid = self.grid_index(flat);
        let s_min = self.s_min_axis.value_at(grid.s_min);

        ParameterPoint {
            k: self.k_axis.value_at(grid.k),
            p: self.p_axis.value_at(grid.p),
            s_min,
            s_maj: if self.four_d {
                self.s_maj_axis.value_at(grid.s_maj)
            } else {
                s_min
            },
        }
    }
}

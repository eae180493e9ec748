//! ball tree index over the training objects.
//!
//! every node stores a centroid and the radius of the ball around it that
//! holds all of its objects. a search keeps the best candidates in a max
//! heap and skips any ball that cannot hold an object closer than the
//! current worst candidate.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::distance::Metric;
use crate::neighbor::{Neighbor, NeighborhoodProvider};
use crate::table::TrainingTable;

const LEAF_SIZE: usize = 16;

#[derive(Debug)]
enum NodeContents {
    Internal {
        left: Box<BallNode>,
        right: Box<BallNode>,
    },
    Leaf {
        indices: Vec<usize>,
    },
}

#[derive(Debug)]
struct BallNode {
    centroid: Vec<f64>,
    radius: f64,
    contents: NodeContents,
}

/// a candidate in the search heap. ordered by distance and then by object
/// index so ties resolve exactly like the linear scan
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// neighborhood provider backed by a ball tree
#[derive(Debug)]
pub struct BallTreeProvider<'a> {
    table: &'a TrainingTable,
    metric: Metric,
    root: Option<BallNode>,
}

impl<'a> BallTreeProvider<'a> {
    pub fn new(table: &'a TrainingTable, metric: Metric) -> Self {
        let indices: Vec<usize> = (0..table.len()).collect();

        let root = if indices.is_empty() {
            None
        } else {
            Some(build_node(table, metric, indices))
        };

        Self {
            table,
            metric,
            root,
        }
    }

    fn search(&self, node: &BallNode, query: &[f64], count: usize, heap: &mut BinaryHeap<Candidate>) {
        if heap.len() == count {
            let lower_bound = (self.metric.distance(query, &node.centroid) - node.radius).max(0.0);

            if let Some(worst) = heap.peek() {
                // objects exactly at the worst distance may still win on
                // index, so only prune balls that are strictly farther
                if lower_bound > worst.distance + 1e-9 * (1.0 + worst.distance) {
                    return;
                }
            }
        }

        match &node.contents {
            NodeContents::Leaf { indices } => {
                for index in indices {
                    let candidate = Candidate {
                        distance: self.metric.distance(query, &self.table.record(*index).data),
                        index: *index,
                    };

                    if heap.len() < count {
                        heap.push(candidate);
                    } else if heap.peek().is_some_and(|worst| candidate < *worst) {
                        heap.pop();
                        heap.push(candidate);
                    }
                }
            }
            NodeContents::Internal { left, right } => {
                let to_left = self.metric.distance(query, &left.centroid);
                let to_right = self.metric.distance(query, &right.centroid);

                // visit the closer ball first to tighten the bound early
                if to_left <= to_right {
                    self.search(left, query, count, heap);
                    self.search(right, query, count, heap);
                } else {
                    self.search(right, query, count, heap);
                    self.search(left, query, count, heap);
                }
            }
        }
    }
}

impl NeighborhoodProvider for BallTreeProvider<'_> {
    fn vicinity(&self, query: &[f64], count: usize) -> Vec<Neighbor> {
        let Some(root) = &self.root else {
            return Vec::new();
        };

        if count == 0 {
            return Vec::new();
        }

        let mut heap = BinaryHeap::with_capacity(count + 1);

        self.search(root, query, count, &mut heap);

        heap.into_sorted_vec()
            .into_iter()
            .map(|candidate| {
                Neighbor::new(
                    candidate.index,
                    candidate.distance,
                    self.table.record(candidate.index).class,
                )
            })
            .collect()
    }
}

fn centroid(table: &TrainingTable, indices: &[usize]) -> Vec<f64> {
    let mut rtn = vec![0.0; table.attributes()];

    for index in indices {
        for (sum, value) in rtn.iter_mut().zip(&table.record(*index).data) {
            *sum += value;
        }
    }

    let len = indices.len() as f64;

    for sum in &mut rtn {
        *sum /= len;
    }

    rtn
}

/// dimension with the largest spread of values
fn widest_dimension(table: &TrainingTable, indices: &[usize]) -> usize {
    let mut best = (0, f64::NEG_INFINITY);

    for dim in 0..table.attributes() {
        let mut low = f64::INFINITY;
        let mut high = f64::NEG_INFINITY;

        for index in indices {
            let value = table.record(*index).data[dim];

            low = low.min(value);
            high = high.max(value);
        }

        if high - low > best.1 {
            best = (dim, high - low);
        }
    }

    best.0
}

fn build_node(table: &TrainingTable, metric: Metric, mut indices: Vec<usize>) -> BallNode {
    let centroid = centroid(table, &indices);
    let radius = indices
        .iter()
        .map(|index| metric.distance(&centroid, &table.record(*index).data))
        .fold(0.0, f64::max);

    if indices.len() <= LEAF_SIZE {
        return BallNode {
            centroid,
            radius,
            contents: NodeContents::Leaf { indices },
        };
    }

    let dim = widest_dimension(table, &indices);

    indices.sort_by(|a, b| {
        table.record(*a).data[dim]
            .total_cmp(&table.record(*b).data[dim])
            .then(a.cmp(b))
    });

    let right = indices.split_off(indices.len() / 2);

    BallNode {
        centroid,
        radius,
        contents: NodeContents::Internal {
            left: Box::new(build_node(table, metric, indices)),
            right: Box::new(build_node(table, metric, right)),
        },
    }
}

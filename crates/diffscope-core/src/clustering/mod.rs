//! Density-based semantic clustering of PR files.
//!
//! DBSCAN over cosine distance: clusters emerge without a predetermined
//! count, and low-density points are marked as noise rather than forced
//! into a group. Every noise point becomes its own singleton cluster, so
//! one clustering response always partitions the input file set exactly.
//!
//! Inputs with fewer than four files skip density clustering entirely;
//! that little data is statistically unreliable, so each file becomes a
//! singleton. Clustering never hard-fails: malformed embeddings degrade to
//! the same singleton fallback.

mod label;


use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::embedding::{cosine_similarity, l2_normalize};
use crate::types::round4;

/// Inputs below this size always produce singletons.
pub const MIN_ITEMS_FOR_DENSITY: usize = 4;

/// Default max cosine distance between neighbors.
pub const DEFAULT_EPS: f32 = 0.3;

/// Default min neighborhood size (self included) for a core point.
pub const DEFAULT_MIN_POINTS: usize = 2;

/// One file to be clustered, with the diff text used for labeling.
#[derive(Debug, Clone)]
pub struct ClusterItem {
    pub filename: String,
    pub patch: Option<String>,
}

/// A semantically coherent group of files.
///
/// `cluster_id` is dense and unique within one response, assigned after
/// the final size-sort; internal algorithm ids (including the negative ids
/// given to noise singletons) never escape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterGroup {
    pub cluster_id: usize,
    pub label: String,
    pub files: Vec<String>,
    pub coherence: f32,
}

/// DBSCAN-based clusterer with a singleton fallback for small inputs.
#[derive(Debug, Clone)]
pub struct SemanticClusterer {
    eps: f32,
    min_points: usize,
}

impl Default for SemanticClusterer {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_points: DEFAULT_MIN_POINTS,
        }
    }
}

impl SemanticClusterer {
    pub fn new(eps: f32, min_points: usize) -> Self {
        Self { eps, min_points }
    }

    /// Groups `items` by embedding density. Infallible: degraded inputs
    /// produce singleton groups instead of errors.
    pub fn cluster(&self, embeddings: &[Vec<f32>], items: &[ClusterItem]) -> Vec<ClusterGroup> {
        let n = items.len();

        if n == 0 {
            return Vec::new();
        }

        if n < MIN_ITEMS_FOR_DENSITY {
            return make_singletons(items);
        }

        if embeddings.len() != n {
            warn!(
                embeddings = embeddings.len(),
                items = n,
                "Embedding count does not match item count, falling back to singletons"
            );
            return make_singletons(items);
        }

        let dim = embeddings[0].len();
        if dim == 0 || embeddings.iter().any(|e| e.len() != dim) {
            warn!("Inconsistent embedding dimensions, falling back to singletons");
            return make_singletons(items);
        }

        let normalized: Vec<Vec<f32>> = embeddings
            .iter()
            .map(|e| {
                let mut v = e.clone();
                l2_normalize(&mut v);
                v
            })
            .collect();

        let assignments = self.dbscan(&normalized);

        let noise_count = assignments.iter().filter(|&&a| a < 0).count();
        debug!(
            items = n,
            noise = noise_count,
            "Density clustering complete"
        );

        // Group member indices by internal label, preserving first-seen
        // order. Noise points get unique negative ids so they stay apart.
        let mut order: Vec<i64> = Vec::new();
        let mut members: std::collections::HashMap<i64, Vec<usize>> =
            std::collections::HashMap::new();

        for (idx, &assignment) in assignments.iter().enumerate() {
            let key = if assignment < 0 {
                -(idx as i64 + 1000)
            } else {
                assignment
            };
            let bucket = members.entry(key).or_default();
            if bucket.is_empty() {
                order.push(key);
            }
            bucket.push(idx);
        }

        let mut groups: Vec<ClusterGroup> = order
            .into_iter()
            .map(|key| {
                let indices = &members[&key];
                let group_items: Vec<&ClusterItem> = indices.iter().map(|&i| &items[i]).collect();
                let group_vectors: Vec<&[f32]> =
                    indices.iter().map(|&i| normalized[i].as_slice()).collect();

                ClusterGroup {
                    cluster_id: 0,
                    label: label::generate_label(&group_items),
                    files: group_items.iter().map(|i| i.filename.clone()).collect(),
                    coherence: round4(coherence(&group_vectors)),
                }
            })
            .collect();

        // Size-sort then reassign dense ids; uniqueness and size-ordering
        // are the external contract, independent of internal labels.
        groups.sort_by(|a, b| b.files.len().cmp(&a.files.len()));
        for (id, group) in groups.iter_mut().enumerate() {
            group.cluster_id = id;
        }

        groups
    }

    /// Classic DBSCAN over cosine distance. Returns one assignment per
    /// point: a cluster id `>= 0` or `-1` for noise.
    fn dbscan(&self, points: &[Vec<f32>]) -> Vec<i64> {
        const UNVISITED: i64 = -2;
        const NOISE: i64 = -1;

        let n = points.len();
        let mut assignments = vec![UNVISITED; n];
        let mut next_cluster: i64 = 0;

        for point in 0..n {
            if assignments[point] != UNVISITED {
                continue;
            }

            let neighbors = self.region_query(points, point);
            if neighbors.len() < self.min_points {
                assignments[point] = NOISE;
                continue;
            }

            let cluster = next_cluster;
            next_cluster += 1;
            assignments[point] = cluster;

            let mut frontier: Vec<usize> = neighbors;
            while let Some(candidate) = frontier.pop() {
                if assignments[candidate] == NOISE {
                    // Border point reachable from a core point.
                    assignments[candidate] = cluster;
                }
                if assignments[candidate] != UNVISITED {
                    continue;
                }
                assignments[candidate] = cluster;

                let candidate_neighbors = self.region_query(points, candidate);
                if candidate_neighbors.len() >= self.min_points {
                    frontier.extend(candidate_neighbors);
                }
            }
        }

        assignments
    }

    /// Indices within `eps` cosine distance of `point`, self included.
    fn region_query(&self, points: &[Vec<f32>], point: usize) -> Vec<usize> {
        let origin = &points[point];
        points
            .iter()
            .enumerate()
            .filter(|(_, other)| {
                let distance = 1.0 - cosine_similarity(origin, other);
                distance <= self.eps
            })
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// One singleton cluster per item: the fallback for small or degraded
/// inputs. Labels are the final path segment of each filename.
fn make_singletons(items: &[ClusterItem]) -> Vec<ClusterGroup> {
    items
        .iter()
        .enumerate()
        .map(|(id, item)| ClusterGroup {
            cluster_id: id,
            label: label::final_path_segment(&item.filename),
            files: vec![item.filename.clone()],
            coherence: 1.0,
        })
        .collect()
}

/// Mean pairwise cosine similarity among members, self-pairs excluded.
/// Defined as 1.0 for a single member (no pairs to average).
fn coherence(vectors: &[&[f32]]) -> f32 {
    let n = vectors.len();
    if n <= 1 {
        return 1.0;
    }

    let mut total = 0.0f32;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            total += cosine_similarity(vectors[i], vectors[j]);
            pairs += 1;
        }
    }

    total / pairs as f32
}

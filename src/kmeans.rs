//! Seeded, bounded k-means over standardized feature vectors.
//!
//! Each restart seeds its centroids with k-means++ and then alternates an
//! assignment step and a centroid update until no point changes cluster or the
//! iteration cap is reached. The restart with the lowest inertia wins; on equal
//! inertia the earlier restart is kept.
//!
//! Tie-breaking and degenerate handling:
//! - A point equidistant to several centroids keeps its current cluster if that
//!   cluster is among the nearest, otherwise it joins the lowest id.
//! - A cluster left empty takes over the point farthest from its own centroid
//!   among clusters holding more than one point (lowest index on ties). Since
//!   `k <= n` is enforced up front, every returned cluster is non-empty.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::error::{PersonaError, Result};
use crate::scaler::FeatureVector;
use crate::util::squared_distance;

pub const DEFAULT_RESTARTS: usize = 10;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeans {
    pub k: usize,
    pub restarts: usize,
    pub seed: u64,
    pub max_iterations: usize,
}

/// Outcome of a k-means fit
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Cluster id in `[0, k)` for every input row, in input order.
    pub labels: Vec<usize>,
    pub centroids: Vec<FeatureVector>,
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl Partition {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Row indices belonging to each cluster, ascending.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.k()];
        for (idx, &label) in self.labels.iter().enumerate() {
            members[label].push(idx);
        }
        members
    }
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            restarts: DEFAULT_RESTARTS,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn fit(&self, points: &[FeatureVector]) -> Result<Partition> {
        if points.is_empty() {
            return Err(PersonaError::EmptyInput);
        }
        if self.k == 0 || points.len() < self.k {
            return Err(PersonaError::InsufficientData {
                records: points.len(),
                k: self.k,
            });
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<Partition> = None;

        for restart in 0..self.restarts.max(1) {
            let centroids = init_plus_plus(points, self.k, &mut rng);
            let candidate = self.converge(points, centroids);
            debug!(
                restart,
                k = self.k,
                inertia = candidate.inertia,
                iterations = candidate.iterations,
                "k-means restart finished"
            );
            let better = best
                .as_ref()
                .map_or(true, |b| candidate.inertia < b.inertia);
            if better {
                best = Some(candidate);
            }
        }

        let best = best.ok_or(PersonaError::EmptyInput)?;
        if !best.converged {
            warn!(
                k = self.k,
                max_iterations = self.max_iterations,
                "k-means hit the iteration cap without stabilizing"
            );
        }
        Ok(best)
    }

    fn converge(&self, points: &[FeatureVector], mut centroids: Vec<FeatureVector>) -> Partition {
        let mut labels = assign(points, &centroids, None);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            iterations += 1;
            relocate_empty(points, &mut labels, &centroids);
            centroids = update_centroids(points, &labels, self.k);

            let next = assign(points, &centroids, Some(labels.as_slice()));
            if next == labels {
                converged = true;
                break;
            }
            labels = next;
        }

        if !converged {
            relocate_empty(points, &mut labels, &centroids);
            centroids = update_centroids(points, &labels, self.k);
        }

        let inertia = inertia(points, &labels, &centroids);
        Partition {
            labels,
            centroids,
            inertia,
            iterations,
            converged,
        }
    }
}

/// k-means++ seeding: first centroid uniform, the rest sampled proportional to
/// squared distance from the nearest chosen centroid.
fn init_plus_plus(points: &[FeatureVector], k: usize, rng: &mut StdRng) -> Vec<FeatureVector> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let pick = if total > 0.0 {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = None;
            for (idx, &weight) in nearest.iter().enumerate() {
                if weight > 0.0 {
                    chosen = Some(idx);
                    if target < weight {
                        break;
                    }
                    target -= weight;
                }
            }
            chosen.unwrap_or(0)
        } else {
            // every point coincides with a centroid already
            rng.gen_range(0..points.len())
        };

        let centroid = points[pick];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

fn assign(
    points: &[FeatureVector],
    centroids: &[FeatureVector],
    current: Option<&[usize]>,
) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let distances: Vec<f64> = centroids.iter().map(|c| squared_distance(p, c)).collect();
            let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
            match current.map(|labels| labels[idx]) {
                Some(label) if distances[label] == min => label,
                _ => distances.iter().position(|&d| d == min).unwrap_or(0),
            }
        })
        .collect()
}

fn relocate_empty(points: &[FeatureVector], labels: &mut [usize], centroids: &[FeatureVector]) {
    let k = centroids.len();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let donor = labels
            .iter()
            .enumerate()
            .filter(|&(_, &label)| counts[label] > 1)
            .map(|(idx, &label)| (idx, squared_distance(&points[idx], &centroids[label])))
            .fold(None, |best: Option<(usize, f64)>, (idx, d)| match best {
                Some((_, best_d)) if best_d >= d => best,
                _ => Some((idx, d)),
            });

        if let Some((idx, _)) = donor {
            counts[labels[idx]] -= 1;
            labels[idx] = empty;
            counts[empty] = 1;
        }
    }
}

fn update_centroids(points: &[FeatureVector], labels: &[usize], k: usize) -> Vec<FeatureVector> {
    let mut sums = vec![[0.0; 3]; k];
    let mut counts = vec![0usize; k];
    for (p, &label) in points.iter().zip(labels) {
        for (s, v) in sums[label].iter_mut().zip(p) {
            *s += v;
        }
        counts[label] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .map(|(mut s, n)| {
            if n > 0 {
                s.iter_mut().for_each(|v| *v /= n as f64);
            }
            s
        })
        .collect()
}

fn inertia(points: &[FeatureVector], labels: &[usize], centroids: &[FeatureVector]) -> f64 {
    points
        .iter()
        .zip(labels)
        .map(|(p, &label)| squared_distance(p, &centroids[label]))
        .sum()
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PersonaError, Result};
use crate::kmeans::KMeans;
use crate::scaler::FeatureVector;
use crate::util::distance;

pub const DEFAULT_K_MIN: usize = 2;
pub const DEFAULT_K_MAX: usize = 6;

/// Result of sweeping candidate cluster counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub best_k: usize,
    pub scores: BTreeMap<usize, f64>,
}

/// Mean silhouette coefficient of a labelling.
///
/// A point alone in its cluster scores 0, as does a point whose intra- and
/// nearest-cluster distances are both 0. Quadratic in the number of points.
pub fn silhouette_score(points: &[FeatureVector], labels: &[usize], k: usize) -> f64 {
    if points.is_empty() || k < 2 {
        return 0.0;
    }

    let mut sizes = vec![0usize; k];
    for &label in labels {
        sizes[label] += 1;
    }

    let total: f64 = points
        .iter()
        .zip(labels)
        .map(|(p, &own)| {
            if sizes[own] <= 1 {
                return 0.0;
            }
            let mut sums = vec![0.0; k];
            for (q, &label) in points.iter().zip(labels) {
                sums[label] += distance(p, q);
            }

            // self-distance is 0, so only the divisor excludes the point
            let a = sums[own] / (sizes[own] - 1) as f64;
            let b = (0..k)
                .filter(|&c| c != own && sizes[c] > 0)
                .map(|c| sums[c] / sizes[c] as f64)
                .fold(f64::INFINITY, f64::min);
            if !b.is_finite() {
                return 0.0;
            }

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .sum();

    total / points.len() as f64
}

/// Fits every `k` in `k_min..=k_max` and keeps the one with the highest
/// silhouette score. Candidates run in ascending order and only a strictly
/// greater score replaces the best, so ties go to the smaller `k`.
pub fn select_k(
    points: &[FeatureVector],
    k_min: usize,
    k_max: usize,
    template: &KMeans,
) -> Result<ModelSelection> {
    if k_min < 2 || k_min > k_max {
        return Err(PersonaError::InvalidClusterRange {
            min: k_min,
            max: k_max,
        });
    }
    if points.is_empty() {
        return Err(PersonaError::EmptyInput);
    }
    if points.len() < k_max {
        return Err(PersonaError::InsufficientData {
            records: points.len(),
            k: k_max,
        });
    }

    info!(k_min, k_max, "testing cluster counts");

    let mut scores = BTreeMap::new();
    let mut best: Option<(usize, f64)> = None;
    for k in k_min..=k_max {
        let partition = KMeans { k, ..*template }.fit(points)?;
        let score = silhouette_score(points, &partition.labels, k);
        debug!(k, score, "silhouette score");
        scores.insert(k, score);

        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((k, score));
        }
    }

    let (best_k, best_score) = best.ok_or(PersonaError::InvalidClusterRange {
        min: k_min,
        max: k_max,
    })?;
    info!(best_k, best_score, "optimal cluster count found");

    Ok(ModelSelection { best_k, scores })
}

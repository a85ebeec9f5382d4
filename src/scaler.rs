use tracing::warn;

use crate::record::{PerformanceRecord, FEATURE_COUNT};
use crate::util::{mean, std_dev};

const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["speed", "accuracy", "consistency"];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Standardized feature matrix, one row per input record
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatures {
    pub rows: Vec<FeatureVector>,
    pub means: FeatureVector,
    pub std_devs: FeatureVector,
    /// Columns with zero variance; their scaled values are all 0.
    pub degenerate: Vec<usize>,
}

impl ScaledFeatures {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Rescales each metric to zero mean and unit variance over the given records.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureScaler;

impl FeatureScaler {
    pub fn fit_transform(records: &[PerformanceRecord]) -> ScaledFeatures {
        let mut means = [0.0; FEATURE_COUNT];
        let mut std_devs = [0.0; FEATURE_COUNT];
        let mut degenerate = Vec::new();

        for col in 0..FEATURE_COUNT {
            let column: Vec<f64> = records.iter().map(|r| r.features()[col]).collect();
            means[col] = mean(&column).unwrap_or(0.0);
            std_devs[col] = std_dev(&column).unwrap_or(0.0);
            if std_devs[col] == 0.0 && !records.is_empty() {
                warn!(
                    feature = FEATURE_NAMES[col],
                    "zero variance across all records, scaling to 0"
                );
                degenerate.push(col);
            }
        }

        let rows = records
            .iter()
            .map(|r| {
                let raw = r.features();
                let mut scaled = [0.0; FEATURE_COUNT];
                for col in 0..FEATURE_COUNT {
                    if std_devs[col] > 0.0 {
                        scaled[col] = (raw[col] - means[col]) / std_devs[col];
                    }
                }
                scaled
            })
            .collect();

        ScaledFeatures {
            rows,
            means,
            std_devs,
            degenerate,
        }
    }
}

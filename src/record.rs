use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};

/// Number of metrics each record contributes to clustering.
pub const FEATURE_COUNT: usize = 3;

/// One finished typing test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// words per minute
    pub speed: f64,
    /// percentage in [0, 100]
    pub accuracy: f64,
    /// percentage in [0, 100]
    pub consistency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PerformanceRecord {
    pub fn new(speed: f64, accuracy: f64, consistency: f64) -> Self {
        Self {
            speed,
            accuracy,
            consistency,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// The clustering features in fixed column order: speed, accuracy, consistency.
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.speed, self.accuracy, self.consistency]
    }
}

impl From<(f64, f64, f64)> for PerformanceRecord {
    fn from(v: (f64, f64, f64)) -> Self {
        PerformanceRecord::new(v.0, v.1, v.2)
    }
}

/// Fails on the first record carrying a NaN or infinite metric.
pub fn validate(records: &[PerformanceRecord]) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        let checks = [
            ("speed", record.speed),
            ("accuracy", record.accuracy),
            ("consistency", record.consistency),
        ];
        if let Some(&(feature, _)) = checks.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PersonaError::MissingOrInvalidFeature { index, feature });
        }
    }
    Ok(())
}

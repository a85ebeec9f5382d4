use serde::{Deserialize, Serialize};

use crate::kmeans::Partition;
use crate::record::PerformanceRecord;
use crate::util::{mean, round2};

/// Aggregate view of one cluster over the raw (unscaled) metrics.
/// Percentages and averages are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: usize,
    pub count: usize,
    pub percentage: f64,
    pub avg_wpm: f64,
    pub avg_accuracy: f64,
    pub avg_consistency: f64,
}

/// One summary per cluster id, ascending.
pub fn summarize(records: &[PerformanceRecord], partition: &Partition) -> Vec<ClusterSummary> {
    let total = records.len();

    partition
        .members()
        .into_iter()
        .enumerate()
        .map(|(id, members)| {
            let column = |f: fn(&PerformanceRecord) -> f64| -> f64 {
                let values: Vec<f64> = members.iter().map(|&i| f(&records[i])).collect();
                mean(&values).map_or(0.0, round2)
            };
            let percentage = if total > 0 {
                round2(members.len() as f64 * 100.0 / total as f64)
            } else {
                0.0
            };

            ClusterSummary {
                id,
                count: members.len(),
                percentage,
                avg_wpm: column(|r| r.speed),
                avg_accuracy: column(|r| r.accuracy),
                avg_consistency: column(|r| r.consistency),
            }
        })
        .collect()
}

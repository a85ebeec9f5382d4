use std::cmp::Ordering;
use std::collections::HashSet;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{PersonaError, Result};
use crate::summary::ClusterSummary;

/// The fixed set of persona templates, in fallback order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
pub enum Persona {
    #[strum(serialize = "Flow State")]
    FlowState,
    #[strum(serialize = "Speed Demon")]
    SpeedDemon,
    #[strum(serialize = "Steady Eddie")]
    SteadyEddie,
    #[strum(serialize = "Warm Up Mode")]
    WarmUpMode,
    #[strum(serialize = "Balanced Performer")]
    BalancedPerformer,
}

impl Persona {
    pub const ALL: [Persona; 5] = [
        Persona::FlowState,
        Persona::SpeedDemon,
        Persona::SteadyEddie,
        Persona::WarmUpMode,
        Persona::BalancedPerformer,
    ];

    pub fn name(&self) -> String {
        self.to_string()
    }

    pub fn description(&self) -> &'static str {
        match self {
            Persona::FlowState => {
                "You're completely in the zone - high speed with exceptional accuracy and consistency"
            }
            Persona::SpeedDemon => {
                "You prioritize speed over accuracy - racing through tests at maximum velocity"
            }
            Persona::SteadyEddie => {
                "You maintain reliable, consistent performance - the tortoise that wins the race"
            }
            Persona::WarmUpMode => {
                "Still finding your rhythm - these are your practice runs before hitting peak performance"
            }
            Persona::BalancedPerformer => {
                "You maintain solid, well-rounded performance across all metrics"
            }
        }
    }
}

/// Per-metric standing of a cluster; 0 is best.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterRanks {
    pub id: usize,
    pub speed: usize,
    pub accuracy: usize,
    pub consistency: usize,
}

impl ClusterRanks {
    pub fn total(&self) -> usize {
        self.speed + self.accuracy + self.consistency
    }
}

/// Descending rank of each summary by `metric`, indexed like `summaries`.
/// Equal values rank in ascending cluster id order.
fn rank_by(summaries: &[ClusterSummary], metric: fn(&ClusterSummary) -> f64) -> Vec<usize> {
    let mut ranks = vec![0; summaries.len()];
    summaries
        .iter()
        .enumerate()
        .sorted_by(|&(_, a), &(_, b)| {
            metric(b)
                .partial_cmp(&metric(a))
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        })
        .enumerate()
        .for_each(|(rank, (idx, _))| ranks[idx] = rank);
    ranks
}

pub fn compute_ranks(summaries: &[ClusterSummary]) -> Vec<ClusterRanks> {
    let speed = rank_by(summaries, |s| s.avg_wpm);
    let accuracy = rank_by(summaries, |s| s.avg_accuracy);
    let consistency = rank_by(summaries, |s| s.avg_consistency);

    summaries
        .iter()
        .enumerate()
        .map(|(idx, s)| ClusterRanks {
            id: s.id,
            speed: speed[idx],
            accuracy: accuracy[idx],
            consistency: consistency[idx],
        })
        .collect()
}

/// Picks the persona for one cluster given the labels already taken.
fn choose(ranks: &ClusterRanks, k: usize, used: &HashSet<Persona>) -> Option<Persona> {
    let free = |p: Persona| !used.contains(&p);
    let total = ranks.total();

    if total <= 2 && free(Persona::FlowState) {
        Some(Persona::FlowState)
    } else if ranks.speed == 0 && ranks.accuracy >= 2 && free(Persona::SpeedDemon) {
        Some(Persona::SpeedDemon)
    } else if ranks.consistency == 0 && ranks.speed >= 1 && free(Persona::SteadyEddie) {
        Some(Persona::SteadyEddie)
    } else if total >= 2 * k && free(Persona::WarmUpMode) {
        Some(Persona::WarmUpMode)
    } else if free(Persona::BalancedPerformer) {
        Some(Persona::BalancedPerformer)
    } else {
        Persona::ALL.into_iter().find(|&p| free(p))
    }
}

/// Gives every cluster a distinct persona.
///
/// Clusters are visited in ascending id order and each takes the first rule
/// that matches with a label still free, so an earlier cluster can claim a
/// label a later one fits better.
pub fn assign_personas(summaries: &[ClusterSummary]) -> Result<Vec<(usize, Persona)>> {
    let k = summaries.len();
    if k > Persona::ALL.len() {
        return Err(PersonaError::LabelExhaustion {
            clusters: k,
            available: Persona::ALL.len(),
        });
    }

    let ranks = compute_ranks(summaries);
    let (assigned, _used) = ranks
        .iter()
        .sorted_by_key(|r| r.id)
        .try_fold(
            (Vec::with_capacity(k), HashSet::new()),
            |(mut assigned, mut used), r| {
                let persona = choose(r, k, &used).ok_or(PersonaError::LabelExhaustion {
                    clusters: k,
                    available: Persona::ALL.len(),
                })?;
                used.insert(persona);
                assigned.push((r.id, persona));
                Ok::<_, PersonaError>((assigned, used))
            },
        )?;

    Ok(assigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn summary(id: usize, wpm: f64, acc: f64, cons: f64) -> ClusterSummary {
        ClusterSummary {
            id,
            count: 1,
            percentage: 0.0,
            avg_wpm: wpm,
            avg_accuracy: acc,
            avg_consistency: cons,
        }
    }

    fn names(assigned: &[(usize, Persona)]) -> Vec<Persona> {
        assigned.iter().map(|(_, p)| *p).collect()
    }

    #[test]
    fn display_names_match_templates() {
        assert_eq!(Persona::FlowState.to_string(), "Flow State");
        assert_eq!(Persona::SpeedDemon.name(), "Speed Demon");
        assert_eq!(Persona::SteadyEddie.to_string(), "Steady Eddie");
        assert_eq!(Persona::WarmUpMode.to_string(), "Warm Up Mode");
        assert_eq!(Persona::BalancedPerformer.to_string(), "Balanced Performer");
        assert!(Persona::ALL.iter().all(|p| !p.description().is_empty()));
    }

    #[test]
    fn fastest_cluster_has_speed_rank_zero() {
        let summaries = vec![
            summary(0, 70.0, 95.0, 80.0),
            summary(1, 120.0, 90.0, 70.0),
            summary(2, 95.0, 97.0, 85.0),
        ];
        let ranks = compute_ranks(&summaries);
        assert_eq!(ranks[1].speed, 0);
        assert_eq!(ranks[2].speed, 1);
        assert_eq!(ranks[0].speed, 2);
    }

    #[test]
    fn ranks_form_a_permutation() {
        let summaries = vec![
            summary(0, 80.0, 95.0, 80.0),
            summary(1, 80.0, 95.0, 70.0),
            summary(2, 60.0, 95.0, 80.0),
            summary(3, 90.0, 99.0, 90.0),
        ];
        let ranks = compute_ranks(&summaries);
        let metrics: [fn(&ClusterRanks) -> usize; 3] =
            [|r| r.speed, |r| r.accuracy, |r| r.consistency];
        for metric in metrics {
            let mut seen: Vec<usize> = ranks.iter().map(metric).collect();
            seen.sort();
            assert_eq!(seen, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn ties_rank_by_ascending_id() {
        let summaries = vec![
            summary(0, 80.0, 95.0, 80.0),
            summary(1, 80.0, 95.0, 80.0),
            summary(2, 80.0, 95.0, 80.0),
        ];
        let ranks = compute_ranks(&summaries);
        assert_eq!(ranks.iter().map(|r| r.speed).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(ranks.iter().map(|r| r.accuracy).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn each_rule_fires_for_its_natural_cluster() {
        let summaries = vec![
            summary(0, 90.0, 97.0, 85.0),  // ranks 1,0,1
            summary(1, 110.0, 88.0, 70.0), // ranks 0,2,2
            summary(2, 70.0, 96.0, 88.0),  // ranks 2,1,0
            summary(3, 50.0, 80.0, 60.0),  // ranks 3,3,3
        ];
        let assigned = assign_personas(&summaries).unwrap();
        assert_eq!(
            assigned,
            vec![
                (0, Persona::FlowState),
                (1, Persona::SpeedDemon),
                (2, Persona::SteadyEddie),
                (3, Persona::WarmUpMode),
            ]
        );
    }

    #[test]
    fn earlier_cluster_claims_label_first() {
        // cluster 1 has the better total rank but cluster 0 is visited first
        let summaries = vec![summary(0, 80.0, 90.0, 90.0), summary(1, 90.0, 95.0, 80.0)];
        let assigned = assign_personas(&summaries).unwrap();
        assert_eq!(
            names(&assigned),
            vec![Persona::FlowState, Persona::BalancedPerformer]
        );
    }

    #[test]
    fn identical_clusters_still_get_distinct_labels() {
        let summaries: Vec<_> = (0..4).map(|id| summary(id, 75.0, 96.0, 80.0)).collect();
        let assigned = assign_personas(&summaries).unwrap();
        assert_eq!(
            names(&assigned),
            vec![
                Persona::FlowState,
                Persona::BalancedPerformer,
                Persona::SpeedDemon,
                Persona::WarmUpMode,
            ]
        );
    }

    #[test]
    fn five_clusters_use_every_template_once() {
        let summaries: Vec<_> = (0..5)
            .map(|id| summary(id, 60.0 + id as f64, 90.0 - id as f64, 70.0))
            .collect();
        let assigned = assign_personas(&summaries).unwrap();
        let unique: HashSet<_> = names(&assigned).into_iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn more_than_five_clusters_is_an_error() {
        let summaries: Vec<_> = (0..6).map(|id| summary(id, 70.0, 95.0, 80.0)).collect();
        assert_matches!(
            assign_personas(&summaries),
            Err(PersonaError::LabelExhaustion {
                clusters: 6,
                available: 5
            })
        );
    }
}

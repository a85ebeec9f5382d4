use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{AnalysisConfig, ClusterCount};
use crate::error::{PersonaError, Result};
use crate::persona::{assign_personas, Persona};
use crate::record::{validate, PerformanceRecord};
use crate::scaler::FeatureScaler;
use crate::selection::{select_k, ModelSelection};
use crate::summary::{summarize, ClusterSummary};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantPersona {
    pub name: String,
    pub description: String,
    pub percentage: f64,
}

/// A cluster summary with its assigned persona
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaCluster {
    #[serde(flatten)]
    pub summary: ClusterSummary,
    pub name: String,
    pub description: String,
}

impl PersonaCluster {
    fn new(summary: ClusterSummary, persona: Persona) -> Self {
        Self {
            summary,
            name: persona.name(),
            description: persona.description().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaReport {
    pub dominant_persona: DominantPersona,
    /// Largest cluster first; equal sizes keep ascending id order.
    pub all_personas: Vec<PersonaCluster>,
}

fn check_input(records: &[PerformanceRecord]) -> Result<()> {
    if records.is_empty() {
        return Err(PersonaError::EmptyInput);
    }
    validate(records)
}

/// Silhouette sweep over `k_min..=k_max` on the standardized records.
pub fn select_clusters(
    records: &[PerformanceRecord],
    k_min: usize,
    k_max: usize,
    config: &AnalysisConfig,
) -> Result<ModelSelection> {
    check_input(records)?;
    let scaled = FeatureScaler::fit_transform(records);
    select_k(&scaled.rows, k_min, k_max, &config.kmeans(k_min))
}

/// Clusters the records and names each cluster with a persona.
pub fn analyze(records: &[PerformanceRecord], config: &AnalysisConfig) -> Result<PersonaReport> {
    check_input(records)?;
    info!(tests = records.len(), "starting persona clustering");

    let scaled = FeatureScaler::fit_transform(records);
    let k = match config.clusters {
        ClusterCount::Fixed(k) => k,
        ClusterCount::Auto { min, max } => {
            select_k(&scaled.rows, min, max, &config.kmeans(min))?.best_k
        }
    };
    if k > Persona::ALL.len() {
        return Err(PersonaError::LabelExhaustion {
            clusters: k,
            available: Persona::ALL.len(),
        });
    }

    let partition = config.kmeans(k).fit(&scaled.rows)?;
    info!(k, inertia = partition.inertia, "k-means clustering complete");

    let summaries = summarize(records, &partition);
    let personas = assign_personas(&summaries)?;

    let mut clusters: Vec<PersonaCluster> = summaries
        .into_iter()
        .zip(personas)
        .map(|(summary, (_, persona))| PersonaCluster::new(summary, persona))
        .collect();
    clusters.sort_by(|a, b| b.summary.count.cmp(&a.summary.count));

    let dominant = clusters.first().ok_or(PersonaError::EmptyInput)?;
    let dominant_persona = DominantPersona {
        name: dominant.name.clone(),
        description: dominant.description.clone(),
        percentage: dominant.summary.percentage,
    };
    info!(
        persona = %dominant_persona.name,
        percentage = dominant_persona.percentage,
        "dominant persona"
    );

    Ok(PersonaReport {
        dominant_persona,
        all_personas: clusters,
    })
}

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::kmeans::{KMeans, DEFAULT_MAX_ITERATIONS, DEFAULT_RESTARTS, DEFAULT_SEED};
use crate::persona::Persona;
use crate::selection::DEFAULT_K_MIN;

pub const DEFAULT_CLUSTERS: usize = 4;

/// How many clusters to partition into
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ClusterCount {
    Fixed(usize),
    /// Sweep `min..=max` and keep the best silhouette score.
    Auto { min: usize, max: usize },
}

impl ClusterCount {
    /// Sweep bounds used when none are configured; capped by the number of
    /// persona templates.
    pub fn default_sweep() -> (usize, usize) {
        (DEFAULT_K_MIN, Persona::ALL.len())
    }
}

impl Default for ClusterCount {
    fn default() -> Self {
        ClusterCount::Fixed(DEFAULT_CLUSTERS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub clusters: ClusterCount,
    pub restarts: usize,
    pub seed: u64,
    pub max_iterations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clusters: ClusterCount::default(),
            restarts: DEFAULT_RESTARTS,
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl AnalysisConfig {
    /// Partitioner settings for a given `k`.
    pub fn kmeans(&self, k: usize) -> KMeans {
        KMeans::new(k)
            .restarts(self.restarts)
            .seed(self.seed)
            .max_iterations(self.max_iterations)
    }
}

pub trait ConfigStore {
    fn load(&self) -> AnalysisConfig;
    fn save(&self, cfg: &AnalysisConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typing-personas") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typing_personas_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> AnalysisConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<AnalysisConfig>(&bytes) {
                return cfg;
            }
        }
        AnalysisConfig::default()
    }

    fn save(&self, cfg: &AnalysisConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

// Library surface for the CLI and integration tests.
// The clustering core (scaler → kmeans → summary → persona → analysis) does no I/O;
// ingest and config are the only modules that touch the filesystem.
pub mod analysis;
pub mod config;
pub mod error;
pub mod ingest;
pub mod kmeans;
pub mod persona;
pub mod record;
pub mod scaler;
pub mod selection;
pub mod summary;
pub mod util;

pub use analysis::{analyze, select_clusters, DominantPersona, PersonaCluster, PersonaReport};
pub use config::{AnalysisConfig, ClusterCount};
pub use error::{PersonaError, Result};
pub use persona::Persona;
pub use record::PerformanceRecord;
pub use selection::ModelSelection;

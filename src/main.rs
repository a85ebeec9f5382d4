use clap::Parser;
use std::{error::Error, path::PathBuf, process::ExitCode};
use tracing_subscriber::EnvFilter;
use typing_personas::{
    analysis::{analyze, select_clusters},
    config::{ClusterCount, ConfigStore, FileConfigStore},
    ingest::read_results_file,
    selection::{DEFAULT_K_MAX, DEFAULT_K_MIN},
    AnalysisConfig,
};

/// cluster your typing test history into behavioral personas
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Reads a MonkeyType results export, groups your tests into k-means clusters over speed, accuracy and consistency, and names each cluster with a persona."
)]
pub struct Cli {
    /// MonkeyType results CSV export
    csv: PathBuf,

    /// number of clusters to form (overrides the config file)
    #[clap(short = 'k', long = "clusters", conflicts_with = "auto")]
    clusters: Option<usize>,

    /// choose the number of clusters by silhouette score
    #[clap(long)]
    auto: bool,

    /// smallest cluster count tried by --auto / --select-only
    #[clap(long)]
    k_min: Option<usize>,

    /// largest cluster count tried by --auto / --select-only
    #[clap(long)]
    k_max: Option<usize>,

    /// only print the silhouette score table ({bestK, scores})
    #[clap(long)]
    select_only: bool,

    /// random seed for centroid initialization
    #[clap(long)]
    seed: Option<u64>,

    /// number of k-means restarts
    #[clap(long)]
    restarts: Option<usize>,

    /// iteration cap per restart
    #[clap(long)]
    max_iterations: Option<usize>,

    /// config file to use instead of the default location
    #[clap(long)]
    config: Option<PathBuf>,

    /// write the effective settings back to the config file
    #[clap(long)]
    save_config: bool,

    /// only log warnings and errors
    #[clap(short = 'q', long)]
    quiet: bool,
}

impl Cli {
    /// Layer command-line overrides on top of the stored config
    fn apply(&self, mut cfg: AnalysisConfig) -> AnalysisConfig {
        if let Some(k) = self.clusters {
            cfg.clusters = ClusterCount::Fixed(k);
        }
        let sweep = match cfg.clusters {
            ClusterCount::Auto { min, max } => Some((min, max)),
            ClusterCount::Fixed(_) if self.auto => Some(ClusterCount::default_sweep()),
            ClusterCount::Fixed(_) => None,
        };
        if let Some((min, max)) = sweep {
            cfg.clusters = ClusterCount::Auto {
                min: self.k_min.unwrap_or(min),
                max: self.k_max.unwrap_or(max),
            };
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(restarts) = self.restarts {
            cfg.restarts = restarts;
        }
        if let Some(max_iterations) = self.max_iterations {
            cfg.max_iterations = max_iterations;
        }
        cfg
    }

    fn store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "typing_personas=info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let store = cli.store();
    let cfg = cli.apply(store.load());
    if cli.save_config {
        store.save(&cfg)?;
    }

    let records = read_results_file(&cli.csv)?;

    let output = if cli.select_only {
        let min = cli.k_min.unwrap_or(DEFAULT_K_MIN);
        let max = cli.k_max.unwrap_or(DEFAULT_K_MAX);
        serde_json::to_string_pretty(&select_clusters(&records, min, max, &cfg)?)?
    } else {
        serde_json::to_string_pretty(&analyze(&records, &cfg)?)?
    };
    println!("{output}");

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("personas").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_come_from_config() {
        let cfg = cli(&["results.csv"]).apply(AnalysisConfig::default());
        assert_eq!(cfg, AnalysisConfig::default());
    }

    #[test]
    fn fixed_clusters_override() {
        let cfg = cli(&["results.csv", "-k", "3", "--seed", "5"]).apply(AnalysisConfig::default());
        assert_eq!(cfg.clusters, ClusterCount::Fixed(3));
        assert_eq!(cfg.seed, 5);
    }

    #[test]
    fn auto_uses_template_capped_range() {
        let cfg = cli(&["results.csv", "--auto"]).apply(AnalysisConfig::default());
        assert_eq!(cfg.clusters, ClusterCount::Auto { min: 2, max: 5 });

        let cfg = cli(&["results.csv", "--auto", "--k-max", "3"]).apply(AnalysisConfig::default());
        assert_eq!(cfg.clusters, ClusterCount::Auto { min: 2, max: 3 });
    }

    #[test]
    fn k_bounds_alone_keep_fixed_mode() {
        let cfg = cli(&["results.csv", "--k-max", "3"]).apply(AnalysisConfig::default());
        assert_eq!(cfg.clusters, ClusterCount::Fixed(4));
    }

    #[test]
    fn clusters_conflicts_with_auto() {
        let parsed = Cli::try_parse_from(["personas", "results.csv", "-k", "3", "--auto"]);
        assert!(parsed.is_err());
    }
}

//! Ductus command-line interface

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ductus_core::{
    ArtifactStore, FileArtifactStore, IntegrationOrchestrator, MemoryArtifactStore,
    ModelRegistry, NearestCentroidBackend, PipelineConfig, RealSample, ShapeLabel,
    StaticConsent, SyntheticStrokeGenerator, TrainingOrchestrator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, Level};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "ductus")]
#[command(about = "Retrain and gate an on-device stroke classifier", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Set log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Config file (defaults to <config dir>/ductus/ductus.toml when present)
    #[arg(short, long, env = "DUCTUS_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate synthetic strokes as JSON lines
    Generate {
        /// Shape label (circle, rectangle, line, oval, curve, polygon)
        #[arg(short = 's', long)]
        shape: ShapeLabel,

        /// Number of strokes
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,

        /// First variation index
        #[arg(long, default_value = "0")]
        first_variation: u32,

        /// Disable human imperfections
        #[arg(long)]
        ideal: bool,
    },

    /// Run one training pass and print its metrics
    Train {
        /// JSON array of captured samples ({"stroke": {...}, "label": "circle"})
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Directory for artifacts (in-memory when omitted)
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Train an idealized baseline and a retrained candidate, then recommend
    Pipeline {
        /// JSON array of captured samples
        #[arg(long)]
        samples: Option<PathBuf>,

        /// Directory for artifacts and recommendations
        #[arg(long)]
        store: Option<PathBuf>,

        /// Promote the candidate when the recommendation approves it
        #[arg(long)]
        deploy: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead of the loaded file
        #[arg(long)]
        defaults: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let level = level.as_str().to_lowercase();
    let filter = EnvFilter::new(format!("ductus={},ductus_core={}", level, level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // Write logs to stderr, not stdout
        .init();

    debug!("Ductus v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Config { defaults } => {
            let config = if defaults {
                PipelineConfig::default()
            } else {
                load_config(cli.config.as_deref())?
            };
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Generate {
            shape,
            count,
            first_variation,
            ideal,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let generator = if ideal {
                SyntheticStrokeGenerator::ideal(config.seed)
            } else {
                SyntheticStrokeGenerator::human(config.seed)
            };
            for (_, stroke) in generator.generate_family(shape, first_variation, count) {
                println!("{}", serde_json::to_string(&RealSample::new(stroke, shape))?);
            }
            Ok(())
        }
        Commands::Train { samples, store } => {
            let config = load_config(cli.config.as_deref())?;
            let samples = load_samples(samples.as_deref())?;
            let mut orchestrator = TrainingOrchestrator::new(
                config,
                Arc::new(StaticConsent::granted()),
                Arc::new(NearestCentroidBackend::default()),
            )
            .with_store(open_store(store));

            let outcome = orchestrator.run(samples).await?;
            println!("{}", serde_json::to_string_pretty(&outcome.metrics)?);
            println!("{}", serde_json::to_string_pretty(&outcome.artifact.record)?);
            Ok(())
        }
        Commands::Pipeline {
            samples,
            store,
            deploy,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let samples = load_samples(samples.as_deref())?;
            let store = open_store(store);
            let consent = Arc::new(StaticConsent::granted());

            info!("Training idealized baseline");
            let mut baseline_run = TrainingOrchestrator::new(
                config.clone(),
                consent.clone(),
                Arc::new(NearestCentroidBackend::new("baseline")),
            )
            .with_generator(SyntheticStrokeGenerator::ideal(config.seed))
            .with_store(store.clone());
            let baseline = baseline_run.run(Vec::new()).await?;

            info!("Training candidate on {} captured samples", samples.len());
            let mut candidate_run = TrainingOrchestrator::new(
                config.clone(),
                consent,
                Arc::new(NearestCentroidBackend::new("candidate")),
            )
            .with_store(store.clone());
            let candidate = candidate_run.run(samples).await?;

            let registry = Arc::new(ModelRegistry::with_active(baseline.artifact));
            let mut integration = IntegrationOrchestrator::new(config, registry).with_store(store);
            let recommendation = integration.evaluate_and_recommend(&candidate.artifact).await;

            println!("{}", serde_json::to_string_pretty(&recommendation)?);
            println!("{}", recommendation.summary);

            if deploy && recommendation.should_deploy {
                integration
                    .deploy(candidate.artifact, &recommendation)
                    .await?;
                println!("Deployed candidate {}", recommendation.candidate.unwrap_or_default());
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => {
            let default_path = PipelineConfig::default_path();
            if default_path.exists() {
                debug!("Loading config from {}", default_path.display());
                PipelineConfig::from_file(&default_path)
                    .with_context(|| format!("Failed to load config from {}", default_path.display()))
            } else {
                Ok(PipelineConfig::default())
            }
        }
    }
}

fn load_samples(path: Option<&Path>) -> Result<Vec<RealSample>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples from {}", path.display()))?;
    let samples: Vec<RealSample> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse samples in {}", path.display()))?;
    info!("Loaded {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

fn open_store(root: Option<PathBuf>) -> Arc<dyn ArtifactStore> {
    match root {
        Some(root) => Arc::new(FileArtifactStore::new(root)),
        None => Arc::new(MemoryArtifactStore::new()),
    }
}

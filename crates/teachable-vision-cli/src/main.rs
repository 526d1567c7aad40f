//! teachable — command-line trainer entry point.

use std::collections::BTreeMap;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use teachable_vision_cli::backend::BackendClient;
use teachable_vision_cli::cancel::CancelToken;
use teachable_vision_cli::config::{resolve_backend_url, resolve_cache_path};
use teachable_vision_cli::error::CliResult;
use teachable_vision_cli::session::TrainerSession;

#[derive(Parser)]
#[command(
    name = "teachable",
    about = "Teachable-machine trainer — label images, sync with the storage backend, run KNN predictions",
    version
)]
struct Cli {
    /// Backend base URL.
    #[arg(long)]
    backend: Option<String>,

    /// Path to the feature cache file.
    #[arg(long)]
    cache: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a labeled training image and upload it to the backend.
    Add {
        /// Image file to learn from.
        image: String,

        /// Class name for the image.
        #[arg(short, long)]
        label: String,
    },

    /// Classify an image against the stored examples.
    Predict {
        /// Image file to classify.
        image: String,

        /// Skip the backend freshness check and use the cache as-is.
        #[arg(long)]
        offline: bool,
    },

    /// List stored images grouped by class.
    List,

    /// Rebuild the feature cache from the backend store.
    Sync,

    /// Show feature cache statistics.
    Info,

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> CliResult<()> {
    let backend_url = resolve_backend_url(cli.backend.as_deref());
    let cache_path = resolve_cache_path(cli.cache.as_deref());

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "teachable", &mut std::io::stdout());
        }

        Commands::Add { image, label } => {
            let mut session = open_session(&backend_url, &cache_path)?;
            let outcome = session.add_labeled(&image, &label).await?;
            println!(
                "Stored as {} ({} examples for class {:?})",
                outcome.stored_as, outcome.examples_for_label, label
            );
        }

        Commands::Predict { image, offline } => {
            let mut session = open_session(&backend_url, &cache_path)?;
            if !offline {
                let warm = session.warm_start(false).await?;
                for name in &warm.skipped {
                    eprintln!("Warning: skipped {name} (unparseable label)");
                }
            }
            let prediction = session.predict_image(&image)?;
            println!(
                "{} (confidence {:.2}, distance {:.4})",
                prediction.label, prediction.confidence, prediction.distance
            );
            for (label, confidence) in &prediction.confidences {
                println!("  {label}: {confidence:.2}");
            }
        }

        Commands::List => {
            let backend = BackendClient::new(&backend_url)?;
            let files = backend.list_images().await?;

            let mut by_label: BTreeMap<String, Vec<String>> = BTreeMap::new();
            let mut unlabeled = Vec::new();
            for file in files {
                match teachable_vision::parse_label(&file) {
                    Ok(label) => {
                        let label = label.to_string();
                        by_label.entry(label).or_default().push(file);
                    }
                    Err(_) => unlabeled.push(file),
                }
            }

            for (label, files) in &by_label {
                println!("{label} ({}):", files.len());
                for file in files {
                    println!("  {file}");
                }
            }
            if !unlabeled.is_empty() {
                println!("unparseable ({}):", unlabeled.len());
                for file in &unlabeled {
                    println!("  {file}");
                }
            }
        }

        Commands::Sync => {
            let mut session = open_session(&backend_url, &cache_path)?;
            let warm = session.warm_start(true).await?;
            println!(
                "Cache rebuilt: {} examples, {} skipped",
                warm.examples,
                warm.skipped.len()
            );
        }

        Commands::Info => {
            let session = open_session(&backend_url, &cache_path)?;
            let set = session.example_set();
            println!("Cache: {}", session.cache_path().display());
            println!("  Examples: {}", set.count());
            println!("  Feature dim: {}", set.feature_dim);
            println!("  Source files: {}", set.source_files.len());
            for (label, count) in set.class_counts() {
                println!("  {label}: {count}");
            }
        }
    }

    Ok(())
}

fn open_session(backend_url: &str, cache_path: &str) -> CliResult<TrainerSession> {
    let backend = BackendClient::new(backend_url)?;
    let cancel = CancelToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling in-flight work");
            ctrl_c.cancel();
        }
    });

    TrainerSession::open(backend, cache_path, cancel)
}

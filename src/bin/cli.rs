//! Catalog crawler CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use catalog_crawler::{
    error::Result,
    models::Config,
    pipeline,
    storage::{CatalogSink, LocalStorage},
};

/// Schedule-of-classes catalog crawler
#[derive(Parser, Debug)]
#[command(
    name = "catalog-crawler",
    version,
    about = "Course catalog and prerequisite crawler"
)]
struct Cli {
    /// Path to storage directory containing config.toml and output files
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every department and write the catalog
    Crawl {
        /// Term code to crawl (overrides site.term)
        #[arg(long)]
        term: Option<String>,

        /// Output file name inside the storage directory (overrides output.file_name)
        #[arg(long)]
        output: Option<String>,

        /// Write even if the circuit breaker would abort
        #[arg(long)]
        force: bool,
    },

    /// Parse a saved prerequisite page and print its tree as JSON
    Parse {
        /// Path to the saved page
        file: PathBuf,
    },

    /// Validate configuration
    Validate,

    /// Show current catalog info
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = cli.storage_dir.join("config.toml");
    let mut config = Config::load_or_default(&config_path);

    match cli.command {
        Command::Crawl {
            term,
            output,
            force,
        } => {
            if let Some(term) = term {
                config.site.term = term;
            }
            if let Some(output) = output {
                config.output.file_name = output;
            }
            config.validate()?;

            let storage = LocalStorage::new(&cli.storage_dir, &config.output);
            let summary = pipeline::run_crawler(&config, &storage, force).await?;

            log::info!(
                "Crawl complete: {} departments, {} courses, {} unparseable",
                summary.stats.department_count,
                summary.stats.course_count,
                summary.stats.unparseable_count
            );
        }

        Command::Parse { file } => {
            let parsed = pipeline::parse_file(&file, &config.parser)?;
            println!("{}", serde_json::to_string_pretty(&parsed.tree)?);
            if !parsed.raw_text.is_empty() {
                log::info!("Requirement text:\n{}", parsed.raw_text);
            }
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
        }

        Command::Info => {
            let storage = LocalStorage::new(&cli.storage_dir, &config.output);
            log::info!("Storage directory: {}", storage.root_dir().display());

            match storage.load_snapshot().await? {
                Some(snapshot) => {
                    log::info!("Catalog version: {}", snapshot.metadata().version);
                    if !snapshot.metadata().term.is_empty() {
                        log::info!("Term: {}", snapshot.metadata().term);
                    }
                    log::info!("Generated at: {}", snapshot.metadata().generated_at);
                    log::info!(
                        "Courses: {} ({} unparseable)",
                        snapshot.len(),
                        snapshot.unparseable_count()
                    );
                }
                None => log::info!("No catalog found yet."),
            }

            if storage.partial_path().exists() {
                log::warn!(
                    "Partial catalog from an aborted run: {}",
                    storage.partial_path().display()
                );
            }
        }
    }

    Ok(())
}

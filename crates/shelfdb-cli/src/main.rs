mod pipeline;
mod report;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::pipeline::{run_pipeline, RunOutcome, RunSettings};
use crate::report::{run_report, ReportFilter};

#[derive(Debug, Parser)]
#[command(name = "shelfdb")]
#[command(about = "Scrape the books catalog and keep a local snapshot of it")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, extract, normalize and load the catalog
    Run {
        /// Number of catalog pages to fetch (defaults to `SHELFDB_PAGES`)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        pages: Option<u32>,
    },
    /// Summarize the stored snapshot
    Report {
        /// Only include books with this star rating (repeatable)
        #[arg(long = "rating", value_parser = clap::value_parser!(u8).range(0..=5))]
        ratings: Vec<u8>,

        /// Only include books with this availability text (repeatable)
        #[arg(long)]
        availability: Vec<String>,

        /// Print the filtered records as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Store management
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the store can be opened and queried
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = shelfdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(command) = cli.command else {
        println!("shelfdb ready; try `shelfdb run` or `shelfdb report`");
        return Ok(());
    };

    let store = shelfdb_db::StoreConfig::from_app_config(&config);
    let pool = shelfdb_db::connect_pool(&store)
        .await
        .with_context(|| format!("failed to open store at {}", store.path.display()))?;

    match command {
        Commands::Run { pages } => {
            let client = shelfdb_scraper::CatalogClient::from_config(&config)
                .context("failed to build catalog client")?;
            let extractor = shelfdb_scraper::Extractor::new(&config.image_base_url)
                .context("failed to build extractor")?;
            let settings = RunSettings::from_config(&config, pages);

            match run_pipeline(&settings, &client, &extractor, &pool).await? {
                RunOutcome::Completed {
                    rows,
                    failed_pages,
                    skipped_items,
                    dropped_records,
                } => {
                    println!(
                        "loaded {rows} records ({} failed pages, {skipped_items} skipped items, \
                         {dropped_records} dropped records)",
                        failed_pages.len()
                    );
                }
                RunOutcome::AbortedNoData { failed_pages } => {
                    eprintln!(
                        "warning: no records extracted ({} of {} pages failed); store left unchanged",
                        failed_pages.len(),
                        settings.pages
                    );
                }
            }
        }
        Commands::Report {
            ratings,
            availability,
            json,
        } => {
            let filter = ReportFilter {
                ratings,
                availability,
            };
            run_report(&pool, &filter, json).await?;
        }
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            shelfdb_db::ping(&pool).await?;
            println!("store ok: {}", store.path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;

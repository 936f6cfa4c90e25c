mod db;
mod error;
mod extract;
mod fetch;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "catalog_scraper", about = "Laptop listing price scraper")]
struct Cli {
    /// SQLite database path
    #[arg(long, default_value = db::DB_PATH)]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the price table if it does not exist yet
    Init,
    /// Fetch the catalog page, extract records, commit one batch
    Run {
        /// Catalog listing URL
        #[arg(long, default_value = fetch::CATALOG_URL)]
        url: String,
        /// Schema the write statement targets
        #[arg(long, default_value = db::DEFAULT_PREFIX)]
        prefix: String,
    },
    /// Extract records from a saved page and print them, without writing
    Parse {
        /// Path to a saved catalog HTML page
        file: PathBuf,
    },
    /// Show captured price row counts
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            println!("Schema ready at {}", cli.db);
            Ok(())
        }
        Commands::Run { url, prefix } => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let query = db::WriteQuery::new(&prefix);

            let summary = run_pipeline(&conn, &query, &url).await?;
            println!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
        Commands::Parse { file } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let records = extract::extract_records(&html).context("Extract stage failed")?;
            for r in &records {
                println!("{:>10}  {}", r.price, r.name);
                println!("{:>10}  {}", "", r.link);
            }
            println!("{} records", records.len());
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&cli.db)?;
            db::init_schema(&conn)?;
            let stats = db::get_stats(&conn)?;
            println!("Rows:           {}", stats.rows);
            let latest = stats
                .latest_capture
                .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| "-".into());
            println!("Latest capture: {}", latest);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

#[derive(Serialize)]
struct RunSummary {
    status: &'static str,
    records: usize,
    rows_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,
}

/// Fetch → extract → upsert, strictly in order. Any stage error aborts the
/// run before the batch commits; the connection is released when it drops
/// at the caller, on every exit path.
async fn run_pipeline(
    conn: &rusqlite::Connection,
    query: &db::WriteQuery,
    url: &str,
) -> anyhow::Result<RunSummary> {
    let html = fetch::fetch_page(url).await.context("Fetch stage failed")?;

    let city = extract::extract_city(&html);
    match &city {
        Some(city) => info!("Detected store city: {}", city),
        None => warn!("No city marker on the page"),
    }

    let records = extract::extract_records(&html).context("Extract stage failed")?;
    info!("Extracted {} product records", records.len());

    let rows_written =
        db::upsert_records(conn, query, &records).context("Persist stage failed")?;
    info!("Committed {} rows in one batch", rows_written);

    Ok(RunSummary {
        status: "OK",
        records: records.len(),
        rows_written,
        city,
    })
}

//! Graduate job scraper
//!
//! Scrapes one job board for a discipline and job level and saves the
//! results to `{out_dir}/{discipline}_{job_level}_jobs.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use common::{JobLevel, JobRecord, ProgressEvent};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use gradscout_scraper::batch::collect_gradconnection;
use gradscout_scraper::config::{BatchConfig, ScrapeConfig};
use gradscout_scraper::export::{last_export_time, read_json, write_json};
use gradscout_scraper::sources::{ProspleScraper, SeekScraper};
use gradscout_scraper::{
    normalize_location, HttpFetcher, PageFetcher, SearchQuery, SourceScraper,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Board {
    Gradconnection,
    Seek,
    Prosple,
}

#[derive(Parser)]
#[command(name = "gradscout-scraper", about = "Scrape graduate jobs and internships to JSON")]
struct Cli {
    /// graduate-jobs or internships
    #[arg(long, default_value = "graduate-jobs", value_parser = parse_job_level)]
    job_level: JobLevel,

    #[arg(long, default_value = "computer-science")]
    discipline: String,

    #[arg(long, default_value = "australia")]
    location: String,

    #[arg(long, value_enum, default_value = "gradconnection")]
    source: Board,

    /// Listing pages to fetch before stopping
    #[arg(long)]
    max_pages: Option<u32>,

    #[arg(long, default_value = "data")]
    out_dir: PathBuf,
}

fn parse_job_level(value: &str) -> Result<JobLevel, String> {
    JobLevel::parse(value).ok_or_else(|| {
        format!("unknown job level '{value}', expected graduate-jobs or internships")
    })
}

/// One line about the export this run will replace, if there is one.
fn previous_export(dir: &Path, discipline: &str, job_level: JobLevel) -> Option<String> {
    let written = last_export_time(dir, discipline, job_level)?;
    let when = written.format("%Y-%m-%d %H:%M");
    match read_json(dir, discipline, job_level) {
        Ok(jobs) => Some(format!("Last export: {when} ({} jobs)", jobs.len())),
        Err(e) => {
            tracing::warn!(error = %e, "Previous export is unreadable");
            Some(format!("Last export: {when} (unreadable)"))
        }
    }
}

/// Drains a streaming scraper and keeps the records of its `Results` event.
async fn drain(scraper: &dyn SourceScraper, query: &SearchQuery) -> Result<Vec<JobRecord>> {
    let mut events = scraper.scrape(query);
    let mut records = Vec::new();
    while let Some(event) = events.next().await {
        match event.context("scrape failed")? {
            ProgressEvent::Progress { progress, status } => {
                tracing::debug!(progress, "{status}");
            }
            ProgressEvent::Warning { warning } => println!("⚠️  {warning}"),
            ProgressEvent::Error { error, .. } => return Err(anyhow!(error)),
            ProgressEvent::Results { results, .. } | ProgressEvent::Complete { results, .. } => {
                records = results;
            }
        }
    }
    Ok(records)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradscout=info")),
        )
        .init();

    let cli = Cli::parse();
    let query = SearchQuery::new(cli.job_level, cli.discipline.clone(), cli.location.clone());

    println!(
        "🔍 Scraping {:?} for {} {} in {}...\n",
        cli.source,
        cli.discipline,
        cli.job_level.slug(),
        cli.location
    );
    if let Some(previous) = previous_export(&cli.out_dir, &cli.discipline, cli.job_level) {
        println!("🕒 {previous}");
    }

    let fetcher: Arc<dyn PageFetcher> =
        Arc::new(HttpFetcher::new().context("failed to build HTTP client")?);
    let config = ScrapeConfig::default();

    let mut jobs = match cli.source {
        Board::Gradconnection => {
            let mut batch = BatchConfig::default();
            if let Some(pages) = cli.max_pages {
                batch.max_pages = pages;
            }
            collect_gradconnection(fetcher.as_ref(), &config.gradconnection, &batch, &query).await
        }
        Board::Seek => {
            let mut seek = config.seek;
            if let Some(pages) = cli.max_pages {
                seek = seek.with_initial_max_pages(pages);
            }
            drain(&SeekScraper::new(fetcher, seek), &query).await?
        }
        Board::Prosple => {
            let mut prosple = config.prosple;
            if let Some(pages) = cli.max_pages {
                prosple = prosple.with_max_pages(pages);
            }
            drain(&ProspleScraper::new(fetcher, prosple), &query).await?
        }
    };

    for job in &mut jobs {
        job.location = job.location.as_deref().and_then(normalize_location);
        println!("📋 Found: {} at {}", job.title, job.company);
    }
    println!("\n📊 Total jobs found: {}", jobs.len());

    let path = write_json(&jobs, &cli.out_dir, &cli.discipline, cli.job_level)?;
    println!("💾 Saved {} jobs to {:?}", jobs.len(), path);
    println!("\n✨ Scraping complete!");
    Ok(())
}

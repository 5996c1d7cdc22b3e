// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr) from -v/-q or RUST_LOG
// 3. Make sure the download directory is usable, before any network I/O
// 4. Crawl the site, showing progress on a spinner
// 5. Download the unique images, showing a progress bar
// 6. Exit with proper code (0 = done, 1 = bad download path, 2 = error)
//
// Ctrl-C stops new requests in both phases; whatever was found or saved so
// far is still reported. A second Ctrl-C exits at once.
// =============================================================================

mod cli;
mod crawl;
mod download;
mod error;
mod storage;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use crawl::{CrawlProgress, CrawlResult, Crawler, PageFetcher};
use download::{DownloadSummary, Downloader};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = finished (some pages or images may have failed)
//   Ok(1) = download directory unusable
//   Err   = unexpected error (reported as exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(&cli);

    if !cli.dry_run {
        if let Err(e) = storage::verify_path(&cli.path) {
            eprintln!("{}", e);
            return Ok(1);
        }
    }

    let client = crawl::build_client(Duration::from_secs(cli.timeout), &cli.user_agent)
        .context("failed to build HTTP client")?;
    let cancel = cancel_on_interrupt();
    let show_progress = !cli.quiet && !cli.json;

    let spinner = if show_progress {
        crawl_spinner()
    } else {
        ProgressBar::hidden()
    };
    let progress_sink = spinner.clone();
    let crawler = Crawler::new(PageFetcher::new(client.clone()))
        .with_workers(cli.workers)
        .with_cancellation(cancel.clone())
        .with_progress_callback(Arc::new(move |progress: CrawlProgress| {
            progress_sink.set_message(format!(
                "Analysing source at depth {}: Found images: {}, Found links: {}",
                progress.depth, progress.image_count, progress.link_count
            ));
        }));

    let result = crawler.crawl(&cli.url, cli.max_depth()).await?;
    spinner.finish();

    let images = result.unique_images();
    if !cli.json {
        println!("Found {} unique images.", images.len());
    }

    let download = if cli.dry_run {
        if !cli.json {
            for image in &images {
                println!("{}", image);
            }
        }
        None
    } else {
        if !cli.json {
            println!("Downloading images...");
        }
        let bar = if show_progress {
            download_bar()
        } else {
            ProgressBar::hidden()
        };
        let summary = Downloader::new(client)
            .with_concurrency(cli.concurrency)
            .with_cancellation(cancel.clone())
            .with_progress_bar(bar)
            .download_images(&images, &cli.path)
            .await;
        Some(summary)
    };

    print_report(&cli, &result, &images, download.as_ref())?;
    Ok(0)
}

fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// The token is cancelled on the first Ctrl-C; the second one exits.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("interrupted, waiting for in-flight requests (Ctrl-C again to quit)");
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    cancel
}

fn crawl_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message("Analysing source...");
    spinner
}

fn download_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{bar:40.cyan/blue} {pos}/{len} files [{elapsed_precise}<{eta_precise}]")
    {
        bar.set_style(style);
    }
    bar
}

#[derive(Serialize)]
struct RunReport<'a> {
    crawl: &'a CrawlResult,
    unique_images: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    download: Option<&'a DownloadSummary>,
}

// Prints the end-of-run report either as JSON or as a short summary
fn print_report(
    cli: &Cli,
    result: &CrawlResult,
    images: &[String],
    download: Option<&DownloadSummary>,
) -> Result<()> {
    if cli.json {
        let report = RunReport {
            crawl: result,
            unique_images: images,
            download,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if cli.quiet {
        return Ok(());
    }

    println!();
    println!("📊 Summary:");
    println!(
        "   📄 Pages: {} crawled, {} failed",
        result.pages_visited, result.pages_failed
    );
    println!("   🖼️  Images: {} unique", images.len());
    if let Some(summary) = download {
        println!(
            "   💾 Saved: {}  ❌ Failed: {}  ⏭️  Skipped: {}",
            summary.saved, summary.failed, summary.skipped
        );
        println!("   📁 Directory: {}", cli.path.display());
    }
    if result.cancelled {
        println!("   ⚠️  Interrupted before the crawl finished");
    }
    Ok(())
}

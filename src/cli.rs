// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
//   image-spider URL [-r] [-l N] [-p DIR] [options]
//
// Without --recursive only the seed page is read, whatever --level says.
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;

pub const DEFAULT_LEVEL: usize = 5;
pub const DEFAULT_PATH: &str = "./data/";

#[derive(Parser, Debug)]
#[command(
    name = "image-spider",
    version,
    about = "A spider program to download images from a website recursively.",
    long_about = "image-spider reads a web page, collects the images it shows, and downloads them. \
                  With --recursive it also follows links on the same host, up to --level hops away."
)]
pub struct Cli {
    /// The URL of the website to scrape images from
    #[arg(value_name = "URL")]
    pub url: String,

    /// Recursively download images from pages linked by the URL
    #[arg(short, long)]
    pub recursive: bool,

    /// The maximum depth level for recursive download
    ///
    /// Only used together with --recursive. The seed page is level 0.
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_LEVEL)]
    pub level: usize,

    /// The path where the downloaded files will be saved
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_PATH)]
    pub path: PathBuf,

    /// Pages fetched at the same time (1 keeps a strict depth-first order)
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub workers: usize,

    /// Images downloaded at the same time
    #[arg(long, value_name = "N", default_value_t = crate::download::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "STRING", default_value = crate::crawl::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Crawl only; list the images instead of downloading them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the crawl report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors and hide progress output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Depth actually crawled: --level with --recursive, otherwise 0.
    pub fn max_depth(&self) -> usize {
        if self.recursive {
            self.level
        } else {
            0
        }
    }

    /// Default tracing filter when RUST_LOG is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

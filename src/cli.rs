//! Command-line interface definitions for the topic crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The record file path is the one required argument; everything else has a
//! default matching the crawler's original deployment.

use clap::Parser;

/// Listing page the crawl starts from when `--start-url` is not given.
pub const DEFAULT_START_URL: &str = "https://news.livedoor.com/topics/category/dom/";

/// Command-line arguments for the topic crawler.
///
/// # Examples
///
/// ```sh
/// # Create ./records.csv (or resume into it) and start crawling
/// topic_crawler ./records.csv
///
/// # Validate a seed-URL list up front
/// topic_crawler ./records.csv -u ./urls.txt
///
/// # Faster pacing against a local fixture site
/// topic_crawler ./records.csv --start-url http://localhost:8080/topics --settle-secs 0
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the record file (created if absent, appended to if present)
    pub record_file: String,

    /// Path to a newline-delimited list of seed URLs, validated non-empty at
    /// startup
    #[arg(short = 'u', long)]
    pub url_list: Option<String>,

    /// Listing page where the crawl starts
    #[arg(long, default_value = DEFAULT_START_URL)]
    pub start_url: String,

    /// Courtesy delay in seconds applied after each navigation step
    #[arg(long, default_value_t = 5)]
    pub settle_secs: u64,
}

//! # Topic Crawler
//!
//! An incremental crawler for a paginated news-topic listing. Each article
//! behind the listing is visited through its two detail pages (title+summary
//! view, then full body view), extracted, normalized, and appended to a
//! durable CSV record file. Runs resume safely: identifiers already present
//! in the record file are never fetched again.
//!
//! ## Usage
//!
//! ```sh
//! topic_crawler ./records.csv
//! ```
//!
//! ## Architecture
//!
//! Strictly sequential, one article at a time, by deliberate choice to mimic
//! human browsing:
//! 1. **Record store**: open or create the record file, seed the visited set
//! 2. **Browser**: launch headless Chrome and open the first listing page
//! 3. **Sizing**: count the listing's entries once from the startup markup
//! 4. **Crawl**: drive the per-article flow page by page until the site
//!    reports no further listing page
//!
//! Successful captures are counted on stdout; step diagnostics go to stderr.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod crawler;
mod extract;
mod models;
mod navigator;
mod store;

use cli::Cli;
use crawler::{CrawlController, count_listing_entries};
use navigator::{ChromeNavigator, Navigator};
use store::RecordStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // Diagnostics go to stderr; stdout carries only the capture counter and
    // the already-visited announcements.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("topic_crawler starting up");

    let args = Cli::parse();
    debug!(?args.record_file, ?args.start_url, args.settle_secs, "Parsed CLI arguments");

    // Seed-URL list: read and validated up front. An external-input
    // extension point; the crawl loop itself does not consume it.
    if let Some(ref url_list) = args.url_list {
        let contents = match tokio::fs::read_to_string(url_list).await {
            Ok(contents) => contents,
            Err(e) => {
                error!(path = %url_list, error = %e, "Failed to open URL list file");
                return Err(e.into());
            }
        };
        let urls: Vec<&str> = contents.lines().filter(|l| !l.trim().is_empty()).collect();
        if urls.is_empty() {
            error!(path = %url_list, "No urls are in url list file");
            return Err("no urls are in url list file".into());
        }
        info!(count = urls.len(), path = %url_list, "Loaded URL list");
    }

    // Store first, so the visited set can be seeded before anything is
    // fetched.
    let (mut store, seed) = match RecordStore::open(&args.record_file) {
        Ok(opened) => opened,
        Err(e) => {
            error!(path = %args.record_file, error = %e, "Failed to open record file");
            return Err(e);
        }
    };
    println!("訪問済id数: {}", seed.len());

    let mut nav = match ChromeNavigator::new(Duration::from_secs(args.settle_secs)) {
        Ok(nav) => nav,
        Err(e) => {
            error!(error = %e, "Failed to start browser");
            return Err(e.into());
        }
    };

    if let Err(e) = nav.navigate(&args.start_url).await {
        error!(url = %args.start_url, error = %e, "Failed to open initial listing page");
        return Err(e.into());
    }
    nav.settle().await;

    // The listing is fixed-size on the target site, so its entry count is
    // taken once, from the first page's markup.
    let markup = match nav.page_source().await {
        Ok(markup) => markup,
        Err(e) => {
            error!(error = %e, "Failed to read initial listing markup");
            return Err(e.into());
        }
    };
    let entries_per_page = count_listing_entries(&markup);
    if entries_per_page == 0 {
        warn!("Listing container matched no entries; only pagination will be exercised");
    }
    info!(entries_per_page, "Sized initial listing");

    let mut controller = CrawlController::new(seed);
    controller
        .run(&mut nav, &mut store, entries_per_page)
        .await?;

    let elapsed = start_time.elapsed();
    info!(
        captured = controller.captured(),
        visited = controller.visited().len(),
        secs = elapsed.as_secs(),
        path = %store.path().display(),
        "Crawl complete"
    );

    Ok(())
}

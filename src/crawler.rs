//! Crawl controller: the dedup/resume state machine.
//!
//! The controller owns the visited set and the running success counter and
//! drives the whole crawl through the [`Navigator`] seam: for every listing
//! page it walks the entries in displayed order, dedups each article by the
//! identifier in its link, descends through the two-step per-article flow
//! (summary view, then body view), hands the raw text to the extractor, and
//! appends the normalized record before unwinding back to the listing.
//! Pages advance strictly forward until no next-page control exists.
//!
//! Failure policy per step:
//! - reading a link, parsing an id: log and skip to the next entry;
//! - any navigation or extraction step inside an article: log, unwind back
//!   to the listing, abandon only that article;
//! - appending to the record store: fatal, propagated to the caller;
//! - clicking the next-page control: normal termination, not an error.
//!
//! An identifier is inserted into the visited set *before* the first
//! navigation step, so an article that fails partway is never attempted
//! again within the run even if its link reappears on a later page.

use crate::extract;
use crate::navigator::Navigator;
use crate::store::RecordStore;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Container holding the listing's entries.
const LISTING_CONTAINER: &str = ".articleList";
/// Title link on the summary view.
const ARTICLE_TITLE: &str = ".topicsTtl > a";
/// Summary block on the summary view, one summary per line.
const ARTICLE_SUMMARY: &str = ".summaryList";
/// Control leading from the summary view to the full body view.
const READ_MORE: &str = ".articleMore > a";
/// Body text on the body view.
const ARTICLE_BODY: &str = ".articleBody > span";
/// Pagination control on the listing.
const NEXT_PAGE: &str = ".next > a";

/// Position-scoped selector for the link of the listing entry at `index`
/// (1-based, matching CSS `nth-child`).
fn entry_link_selector(index: usize) -> String {
    format!("{LISTING_CONTAINER} > li:nth-child({index}) > a")
}

/// Count the entries of the listing in `markup`.
///
/// Called once, at startup, against the first listing page's markup; the
/// listing is fixed-size on the target site, so the count holds for every
/// subsequent page.
pub fn count_listing_entries(markup: &str) -> usize {
    let document = Html::parse_document(markup);
    let selector = Selector::parse(LISTING_CONTAINER).unwrap();
    document
        .select(&selector)
        .next()
        .map(|list| list.children().filter(|c| c.value().is_element()).count())
        .unwrap_or(0)
}

/// Derive the article identifier from the trailing path segment of `href`.
pub fn article_id(href: &str) -> Option<u64> {
    let parsed = Url::parse(href).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    segment.parse().ok()
}

/// The crawl's mutable state: visited identifiers and the success counter.
///
/// Owned by the caller rather than held as process-wide state, so multiple
/// independent crawls can run in one process (and in tests).
pub struct CrawlController {
    visited: HashSet<u64>,
    captured: usize,
}

impl CrawlController {
    /// Create a controller seeded with the identifiers already persisted by
    /// prior runs (from [`RecordStore::open`]).
    pub fn new(seed: HashSet<u64>) -> Self {
        Self {
            visited: seed,
            captured: 0,
        }
    }

    /// Number of articles captured by this run.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Identifiers attempted in this run or persisted by prior ones. Grows
    /// monotonically; nothing is ever removed.
    pub fn visited(&self) -> &HashSet<u64> {
        &self.visited
    }

    /// Crawl listing pages until the site reports no further page.
    ///
    /// The navigator must already be positioned on the first listing page.
    /// Per-article failures are absorbed; the only errors that escape are
    /// record-store failures, which are fatal by design.
    #[instrument(level = "info", skip(self, nav, store))]
    pub async fn run<N: Navigator>(
        &mut self,
        nav: &mut N,
        store: &mut RecordStore,
        entries_per_page: usize,
    ) -> Result<(), Box<dyn Error>> {
        loop {
            for index in 1..=entries_per_page {
                self.visit_entry(nav, store, index).await?;
            }

            if let Err(e) = nav.click(NEXT_PAGE).await {
                info!(error = %e, "No next-page control; crawl complete");
                break;
            }
            nav.settle().await;
        }
        Ok(())
    }

    /// Visit the listing entry at `index`, capturing its article if new.
    ///
    /// Every navigation and extraction failure is logged with a tag naming
    /// the step and abandons only this entry; the navigator is unwound back
    /// to the listing from whatever depth was reached.
    async fn visit_entry<N: Navigator>(
        &mut self,
        nav: &mut N,
        store: &mut RecordStore,
        index: usize,
    ) -> Result<(), Box<dyn Error>> {
        let link_selector = entry_link_selector(index);

        let href = match nav.attribute(&link_selector, "href").await {
            Ok(href) => href,
            Err(e) => {
                error!(error = %e, index, "記事のhref取得");
                return Ok(());
            }
        };

        let id = match article_id(&href) {
            Some(id) => id,
            None => {
                error!(%href, index, "hrefから記事idを取得");
                return Ok(());
            }
        };

        if self.visited.contains(&id) {
            println!("訪問済です, 記事id: {id}");
            return Ok(());
        }

        // Mark as visited before navigating: a failed fetch must not be
        // retried when the same entry is encountered again in this run.
        self.visited.insert(id);

        if let Err(e) = nav.click(&link_selector).await {
            error!(error = %e, id, "記事のタイトルと要約へ");
            return Ok(());
        }
        nav.settle().await;
        // Depth below the listing: summary view = 1, body view = 2. The
        // unwind runs exactly `depth` back-steps from any outcome.
        let mut depth = 1;

        let title = match nav.text(ARTICLE_TITLE).await {
            Ok(title) => title,
            Err(e) => {
                error!(error = %e, id, "記事のタイトル取得");
                Self::unwind(nav, depth).await;
                return Ok(());
            }
        };

        let summary = match nav.text(ARTICLE_SUMMARY).await {
            Ok(summary) => summary,
            Err(e) => {
                error!(error = %e, id, "記事の要約取得");
                Self::unwind(nav, depth).await;
                return Ok(());
            }
        };

        if let Err(e) = nav.click(READ_MORE).await {
            error!(error = %e, id, "記事の本文へ");
            Self::unwind(nav, depth).await;
            return Ok(());
        }
        nav.settle().await;
        depth = 2;

        let body = match nav.text(ARTICLE_BODY).await {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, id, "記事の本文取得");
                Self::unwind(nav, depth).await;
                return Ok(());
            }
        };

        let record = extract::build_record(id, &title, &summary, &body);
        store.append(&record)?;
        self.captured += 1;
        println!("現在 {} 個の記事を取得済みです", self.captured);
        debug!(id, title = %record.title, "Captured article");

        Self::unwind(nav, depth).await;
        Ok(())
    }

    /// Navigate back to the listing from `depth` pages down, settling after
    /// each step. Back failures are logged but not propagated; there is
    /// nothing better to do than keep trying the remaining steps.
    async fn unwind<N: Navigator>(nav: &mut N, depth: usize) {
        for _ in 0..depth {
            if let Err(e) = nav.back().await {
                warn!(error = %e, "Back navigation failed while returning to the listing");
            }
            nav.settle().await;
        }
    }
}

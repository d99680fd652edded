// src/pipeline/scrape.rs

//! Listing aggregation pipeline.
//!
//! Drives the listing adapter across `1..=total_pages` strictly in ascending
//! order; page order must be preserved since downstream grouping and popup
//! content are presentation-stable only under stable input order.

use std::time::Duration;

use crate::error::Result;
use crate::models::ListingSummary;
use crate::services::ListingClient;

/// Merged result of a listing scrape.
#[derive(Debug, Default)]
pub struct ScrapeOutcome {
    /// All listing summaries, in page order.
    pub listings: Vec<ListingSummary>,
    /// Page count reported by page 1.
    pub total_pages: u32,
    /// Pages that returned zero items (an anomaly, not a stop signal).
    pub empty_pages: u32,
    /// Page at which a transport failure stopped pagination, if any.
    pub failed_page: Option<u32>,
}

impl ScrapeOutcome {
    /// An empty final set is a valid outcome, distinct from a fetch failure.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

/// Fetch every listing page and merge the results.
///
/// Page 1 establishes the page count and fails fatally; a failure on any
/// later page logs a warning, stops further pagination, and keeps what was
/// already accumulated.
pub async fn collect_listings(
    client: &ListingClient,
    token: &str,
    cookies: &[(String, String)],
    delay_ms: u64,
) -> Result<ScrapeOutcome> {
    let first = client.fetch_page(1, token, cookies).await?;
    let total_pages = first.pager.total_pages.max(1);
    log::info!(
        "Listing pagination: {} total pages, {} items on page 1",
        total_pages,
        first.listings().len()
    );

    let mut outcome = ScrapeOutcome {
        listings: first.map_list.listings,
        total_pages,
        ..ScrapeOutcome::default()
    };

    for page in 2..=total_pages {
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        match client.fetch_page(page, token, cookies).await {
            Ok(listing_page) => {
                if listing_page.listings().is_empty() {
                    log::warn!("Listing page {} returned no items", page);
                    outcome.empty_pages += 1;
                }
                outcome.listings.extend(listing_page.map_list.listings);
            }
            Err(e) => {
                log::warn!(
                    "Listing page {} failed, stopping pagination with {} items: {}",
                    page,
                    outcome.listings.len(),
                    e
                );
                outcome.failed_page = Some(page);
                break;
            }
        }
    }

    log::info!(
        "Collected {} listings from {} pages ({} empty)",
        outcome.listings.len(),
        outcome.total_pages,
        outcome.empty_pages
    );
    Ok(outcome)
}

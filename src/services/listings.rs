// src/services/listings.rs

//! Listing source adapter.
//!
//! Fetches one page of listing search results at a time from the
//! page-numbered listing API, read-through cached. The adapter is stateless
//! per call; pagination is driven entirely by the caller.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::cache::{CacheEntry, FileCache};
use crate::error::{AppError, Result};
use crate::models::{ListingConfig, ListingPage};
use crate::services::form_pairs;
use crate::utils::http::Transport;

pub struct ListingClient {
    transport: Arc<dyn Transport>,
    cache: FileCache,
    config: ListingConfig,
}

impl ListingClient {
    pub fn new(transport: Arc<dyn Transport>, cache: FileCache, config: ListingConfig) -> Self {
        Self { transport, cache, config }
    }

    /// The fixed search payload with the page number and token embedded.
    ///
    /// This payload doubles as the cache-key descriptor, so any parameter
    /// change (page, token, viewport) lands on a new cache entry.
    fn payload(&self, page: u32, token: &str) -> Value {
        json!({
            "_token": token,
            "location": self.config.location,
            "search_mode": "location",
            "geopicker_type": "viewport",
            "page": page,
            "SelectedView": "map_view",
            "LocationGeoId": self.config.geo_id,
            "viewport": self.config.viewport,
            "zoom": self.config.zoom,
            "ajax": 1,
        })
    }

    fn request_url(&self, token: &str) -> String {
        format!("{}?_token={}", self.config.base_url, token)
    }

    /// Fetch a single listing page, consulting the cache first.
    ///
    /// A non-success status is fatal: this source has no best-effort mode,
    /// and a transport failure on it aborts the run (the aggregator decides
    /// what that means for pages past the first).
    pub async fn fetch_page(
        &self,
        page: u32,
        token: &str,
        cookies: &[(String, String)],
    ) -> Result<ListingPage> {
        let payload = self.payload(page, token);
        let key = FileCache::make_key(&payload);
        let path = self.cache.path_for("page", &key);

        if let Some(entry) = self.cache.read(&path) {
            log::debug!("Listing page {} served from cache", page);
            return ListingPage::from_value(entry.response);
        }

        let url = self.request_url(token);
        let headers = vec![
            (
                "Accept".to_string(),
                "application/json, text/javascript, */*; q=0.01".to_string(),
            ),
            ("Origin".to_string(), self.config.base_url.trim_end_matches('/').to_string()),
            ("Referer".to_string(), format!("{url}&page={page}")),
            ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
        ];

        log::info!("Fetching listing page {}...", page);
        let response = self
            .transport
            .post_form(&url, &headers, cookies, &form_pairs(&payload))
            .await?;

        if !response.is_success() {
            log::error!("Listing page {} failed with status {}", page, response.status);
            return Err(AppError::fetch("assumable", response.status));
        }

        let value: Value = serde_json::from_str(&response.body)?;
        self.cache.write(
            &path,
            &CacheEntry {
                request: json!({ "url": url, "data": payload }),
                response: value.clone(),
            },
        );

        let parsed = ListingPage::from_value(value)?;
        log::info!("Listing page {}: {} items", page, parsed.listings().len());
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::http::testing::FakeTransport;
    use serde_json::json;
    use tempfile::TempDir;

    fn page_body(total_pages: u32, ids: &[u32]) -> Value {
        json!({
            "SearchPagerBar": {"TotalPages": total_pages},
            "MapList": {"ListingsSummaryVM": ids.iter().map(|id| json!({
                "ListingId": id,
                "Location": format!("{id} Main St"),
                "Centroid": {"latitude": 42.0, "longitude": -73.0}
            })).collect::<Vec<_>>()}
        })
    }

    fn client(tmp: &TempDir) -> (Arc<FakeTransport>, ListingClient) {
        let transport = Arc::new(FakeTransport::new());
        let cache = FileCache::new(tmp.path());
        let client = ListingClient::new(transport.clone(), cache, ListingConfig::default());
        (transport, client)
    }

    #[tokio::test]
    async fn test_read_through_idempotence() {
        let tmp = TempDir::new().unwrap();
        let (transport, client) = client(&tmp);
        transport.push_json("https://app.assumable.io/", 200, page_body(1, &[1, 2]));

        let cookies = Vec::new();
        let first = client.fetch_page(1, "tok", &cookies).await.unwrap();
        let second = client.fetch_page(1, "tok", &cookies).await.unwrap();

        // Second call must come from cache: exactly one network call.
        assert_eq!(transport.call_count(), 1);
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
        assert_eq!(second.listings().len(), 2);
    }

    #[tokio::test]
    async fn test_distinct_pages_use_distinct_cache_entries() {
        let tmp = TempDir::new().unwrap();
        let (transport, client) = client(&tmp);
        transport.push_json("https://app.assumable.io/", 200, page_body(2, &[1]));
        transport.push_json("https://app.assumable.io/", 200, page_body(2, &[2]));

        let cookies = Vec::new();
        let p1 = client.fetch_page(1, "tok", &cookies).await.unwrap();
        let p2 = client.fetch_page(2, "tok", &cookies).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(p1.listings()[0].listing_id_text(), "1");
        assert_eq!(p2.listings()[0].listing_id_text(), "2");
    }

    #[tokio::test]
    async fn test_non_success_status_is_fatal_and_uncached() {
        let tmp = TempDir::new().unwrap();
        let (transport, client) = client(&tmp);
        transport.push_json("https://app.assumable.io/", 403, json!({}));

        let err = client.fetch_page(1, "tok", &[]).await.unwrap_err();
        match err {
            AppError::Fetch { source_name, status } => {
                assert_eq!(source_name, "assumable");
                assert_eq!(status, 403);
            }
            other => panic!("unexpected error: {other}"),
        }

        // The failure must not poison the cache; a retry goes to the network.
        transport.push_json("https://app.assumable.io/", 200, page_body(1, &[9]));
        let page = client.fetch_page(1, "tok", &[]).await.unwrap();
        assert_eq!(page.listings().len(), 1);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_form_embeds_page_and_token() {
        let tmp = TempDir::new().unwrap();
        let (transport, client) = client(&tmp);
        transport.push_json("https://app.assumable.io/", 200, page_body(1, &[]));

        client.fetch_page(3, "secret", &[]).await.unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls[0].method, "POST");
        assert!(calls[0].form.contains(&("page".to_string(), "3".to_string())));
        assert!(calls[0].form.contains(&("_token".to_string(), "secret".to_string())));
    }
}

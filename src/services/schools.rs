// src/services/schools.rs

//! School source adapter.
//!
//! Fetches school data from the link-paginated school API, following
//! `links.next` until exhausted. The first page establishes validity of the
//! whole query and fails fatally; follow-up pages are best-effort enrichment
//! and a failure there keeps everything accumulated so far.
//!
//! Three cache namespaces are in play: the aggregated result (`schools`,
//! keyed by the parameter set), the raw first page (`schools_page`, keyed by
//! `{url, params}`), and each follow-up page (`schools_page`, keyed by its
//! resolved URL, since the link already encodes cursor state).

use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};

use crate::cache::{CacheEntry, FileCache};
use crate::error::{AppError, Result};
use crate::models::{School, SchoolPage, SchoolsConfig};
use crate::services::form_pairs;
use crate::utils::http::Transport;

/// Bytes escaped in cookie values; everything except unreserved chars and '/'.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Aggregated result of a school fetch.
#[derive(Debug, Default)]
pub struct SchoolsOutcome {
    /// Parsed school records, in fetch order.
    pub items: Vec<School>,
    /// Pages fetched from the network (0 on an aggregated cache hit).
    pub pages: u32,
    /// True when a follow-up page failed and pagination stopped early.
    pub truncated: bool,
    /// Records dropped because they were not JSON objects.
    pub skipped: usize,
    pub from_cache: bool,
}

pub struct SchoolsClient {
    transport: Arc<dyn Transport>,
    cache: FileCache,
    config: SchoolsConfig,
    csrf_token: Option<String>,
    csrf_cookie: Option<String>,
}

impl SchoolsClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        cache: FileCache,
        config: SchoolsConfig,
        csrf_token: Option<String>,
        csrf_cookie: Option<String>,
    ) -> Self {
        Self { transport, cache, config, csrf_token, csrf_cookie }
    }

    /// Full query parameter set; also the aggregated cache-key descriptor.
    fn params(&self, lat: f64, lon: f64) -> Value {
        json!({
            "state": self.config.state,
            "sort": "rating",
            "limit": self.config.limit,
            "url": "/gsr/api/schools",
            "countsOnly": "false",
            "level_code": self.config.level_code,
            "lat": lat,
            "lon": lon,
            "distance": self.config.distance,
            "extras": "students_per_teacher,review_summary,saved_schools",
            "locationType": "state",
        })
    }

    fn build_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("user-agent".to_string(), self.config.user_agent.clone())];
        if let Some(token) = &self.csrf_token {
            headers.push(("x-csrf-token".to_string(), token.clone()));
        }
        headers
    }

    /// Cookies carrying an optional CSRF value plus a synthesized geolocation
    /// profile with a random public IPv4 address.
    fn build_cookies(&self, lat: f64, lon: f64) -> Vec<(String, String)> {
        let mut cookies = Vec::new();
        if let Some(cookie) = &self.csrf_cookie {
            cookies.push(("csrf_token".to_string(), cookie.clone()));
        }

        let search_prefs = json!({
            "location": {
                "ip": random_public_ipv4(),
                "city": self.config.city,
                "lat": lat,
                "lon": lon,
                "state": self.config.state,
                "locationType": "state",
            }
        });
        let encoded = utf8_percent_encode(&search_prefs.to_string(), COOKIE_VALUE).to_string();
        cookies.push(("search_prefs".to_string(), encoded));
        cookies
    }

    /// Fetch school data, follow `links.next`, and cache every page.
    pub async fn fetch_schools(&self, lat: f64, lon: f64) -> Result<SchoolsOutcome> {
        let params = self.params(lat, lon);
        let agg_key = FileCache::make_key(&params);
        let agg_path = self.cache.path_for("schools", &agg_key);

        if let Some(entry) = self.cache.read(&agg_path) {
            let page = SchoolPage::from_value(&entry.response)?;
            let (items, skipped) = parse_items(&page.items);
            log::debug!("Schools served from aggregated cache: {} items", items.len());
            return Ok(SchoolsOutcome { items, skipped, from_cache: true, ..Default::default() });
        }

        let headers = self.build_headers();
        let cookies = self.build_cookies(lat, lon);

        // First page: failure here invalidates the whole query.
        log::info!(
            "Fetching schools near ({}, {}) within {} miles...",
            lat,
            lon,
            self.config.distance
        );
        let response = self
            .transport
            .get(&self.config.base_url, &headers, &cookies, &form_pairs(&params))
            .await?;
        if !response.is_success() {
            log::error!("School request failed with status {}", response.status);
            return Err(AppError::fetch("greatschools", response.status));
        }

        let first_value: Value = serde_json::from_str(&response.body)?;

        // Cache the raw first page before aggregation so partial progress
        // survives a later-page failure.
        let first_request = json!({ "url": self.config.base_url, "params": params });
        let first_path = self
            .cache
            .path_for("schools_page", &FileCache::make_key(&first_request));
        self.cache.write(
            &first_path,
            &CacheEntry { request: first_request.clone(), response: first_value.clone() },
        );

        let first_page = SchoolPage::from_value(&first_value)?;
        log::info!("Schools page 1: {} items", first_page.items.len());

        let mut all_items = first_page.items.clone();
        let mut next_link = first_page.next_link().map(str::to_string);
        let mut pages = 1u32;
        let mut truncated = false;

        while let Some(link) = next_link.take() {
            pages += 1;
            let response = match self.transport.get(&link, &headers, &cookies, &[]).await {
                Ok(response) => response,
                Err(e) => {
                    log::warn!("Schools page {} failed ({}): {}", pages, link, e);
                    truncated = true;
                    break;
                }
            };
            if !response.is_success() {
                log::warn!(
                    "Schools page {} failed with status {} ({})",
                    pages,
                    response.status,
                    link
                );
                truncated = true;
                break;
            }

            let value: Value = match serde_json::from_str(&response.body) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Schools page {} returned invalid JSON: {}", pages, e);
                    truncated = true;
                    break;
                }
            };
            let page = SchoolPage::from_value(&value)?;
            log::info!("Schools page {}: {} items", pages, page.items.len());
            all_items.extend(page.items.iter().cloned());

            // Follow-up pages are keyed by their resolved URL.
            let page_path = self
                .cache
                .path_for("schools_page", &FileCache::make_key(&response.final_url));
            self.cache.write(
                &page_path,
                &CacheEntry { request: json!({ "url": response.final_url }), response: value },
            );

            next_link = page.next_link().map(str::to_string);
        }

        // Aggregate: the first-page envelope with the merged item list.
        let mut aggregated = first_value;
        if let Some(envelope) = aggregated.as_object_mut() {
            envelope.insert("items".to_string(), Value::Array(all_items.clone()));
        }
        self.cache.write(
            &agg_path,
            &CacheEntry { request: first_request, response: aggregated },
        );

        let (items, skipped) = parse_items(&all_items);
        log::info!(
            "Schools complete: {} items across {} pages{}",
            items.len(),
            pages,
            if truncated { " (truncated)" } else { "" }
        );
        Ok(SchoolsOutcome { items, pages, truncated, skipped, from_cache: false })
    }
}

/// Parse raw items into school records, counting the ones dropped.
fn parse_items(raw: &[Value]) -> (Vec<School>, usize) {
    let mut items = Vec::with_capacity(raw.len());
    let mut skipped = 0;
    for item in raw {
        match serde_json::from_value::<School>(item.clone()) {
            Ok(school) => items.push(school),
            Err(e) => {
                skipped += 1;
                log::warn!("Skipping unparsable school record: {}", e);
            }
        }
    }
    (items, skipped)
}

/// A random IPv4 address outside the reserved ranges.
///
/// Draws octets from v4 UUID bytes until a non-reserved, non-zero-octet
/// address comes up.
fn random_public_ipv4() -> String {
    loop {
        let bytes = *uuid::Uuid::new_v4().as_bytes();
        for chunk in bytes.chunks_exact(4) {
            let (a, b, c, d) = (chunk[0], chunk[1], chunk[2], chunk[3]);
            if a == 0 || b == 0 || c == 0 || d == 0 {
                continue;
            }
            if is_reserved(a, b) {
                continue;
            }
            return format!("{a}.{b}.{c}.{d}");
        }
    }
}

fn is_reserved(a: u8, b: u8) -> bool {
    matches!(a, 0 | 10 | 127 | 255)
        || (a == 100 && (64..=127).contains(&b))
        || (a == 169 && b == 254)
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || (a == 198 && (b == 18 || b == 19))
        || a >= 224
}

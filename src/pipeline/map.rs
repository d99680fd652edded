// src/pipeline/map.rs

//! Map building pipeline.
//!
//! Normalizes merged listings into map points, enriches them with nearby
//! schools when a school client is configured, and writes the rendered HTML
//! artifact. School fetch failure degrades to "no schools"; zero map points
//! short-circuits rendering entirely.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{listing_to_point, school_to_point, ListingSummary, MapPoint, SchoolPoint};
use crate::render;
use crate::services::SchoolsClient;

/// Result of a map build.
#[derive(Debug)]
pub enum MapBuildOutcome {
    Saved {
        file: PathBuf,
        points: usize,
        schools: usize,
        /// Listings skipped for missing or zero coordinates.
        skipped: usize,
    },
    /// No listing produced a plottable point; nothing was written.
    Empty,
}

/// Normalize listings, preserving input order and counting skips.
fn normalize_listings(listings: &[ListingSummary]) -> (Vec<MapPoint>, usize) {
    let mut skipped = 0;
    let points: Vec<MapPoint> = listings
        .iter()
        .filter_map(|listing| {
            let point = listing_to_point(listing);
            if point.is_none() {
                skipped += 1;
            }
            point
        })
        .collect();
    (points, skipped)
}

/// Fetch and normalize the schools overlay; any failure means no overlay.
async fn load_school_points(client: &SchoolsClient, lat: f64, lon: f64) -> Vec<SchoolPoint> {
    let outcome = match client.fetch_schools(lat, lon).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("School fetch failed, building map without schools: {}", e);
            return Vec::new();
        }
    };

    let mut skipped = 0;
    let points: Vec<SchoolPoint> = outcome
        .items
        .iter()
        .filter_map(|school| {
            let point = school_to_point(school);
            if point.is_none() {
                skipped += 1;
            }
            point
        })
        .collect();

    log::info!(
        "Schools overlay: {} points ({} skipped for missing coordinates, {} unparsable)",
        points.len(),
        skipped,
        outcome.skipped
    );
    points
}

/// Build the map artifact from merged listings.
pub async fn build_map(
    listings: &[ListingSummary],
    schools_client: Option<&SchoolsClient>,
    output: &Path,
) -> Result<MapBuildOutcome> {
    let (points, skipped) = normalize_listings(listings);
    log::info!(
        "Normalized {} map points ({} listings skipped)",
        points.len(),
        skipped
    );

    if points.is_empty() {
        log::warn!("No coordinates found to map.");
        return Ok(MapBuildOutcome::Empty);
    }

    // The first point's coordinates center the map and seed the school query.
    let (center_lat, center_lon) = (points[0].lat, points[0].lon);

    let school_points = match schools_client {
        Some(client) => load_school_points(client, center_lat, center_lon).await,
        None => {
            log::debug!("Schools overlay disabled");
            Vec::new()
        }
    };

    let html = render::render_map(center_lat, center_lon, &points, &school_points);
    fs::write(output, html)?;

    log::info!(
        "Saved map with {} pins to {:?}",
        points.len() + school_points.len(),
        output
    );
    Ok(MapBuildOutcome::Saved {
        file: output.to_path_buf(),
        points: points.len(),
        schools: school_points.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileCache;
    use crate::models::SchoolsConfig;
    use crate::utils::http::testing::FakeTransport;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn listing(value: serde_json::Value) -> ListingSummary {
        serde_json::from_value(value).unwrap()
    }

    fn located(id: u32) -> ListingSummary {
        listing(json!({
            "ListingId": id,
            "CashFormat": "$150,000",
            "Location": format!("{id} Main St"),
            "Centroid": {"latitude": 42.0, "longitude": -73.0}
        }))
    }

    #[tokio::test]
    async fn test_empty_listings_short_circuit() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("map.html");

        let outcome = build_map(&[], None, &output).await.unwrap();
        assert!(matches!(outcome, MapBuildOutcome::Empty));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_unlocated_listings_only_short_circuit() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("map.html");
        let listings = vec![listing(json!({"ListingId": 1}))];

        let outcome = build_map(&listings, None, &output).await.unwrap();
        assert!(matches!(outcome, MapBuildOutcome::Empty));
    }

    #[tokio::test]
    async fn test_builds_map_without_schools_client() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("map.html");

        let outcome = build_map(&[located(1), located(2)], None, &output)
            .await
            .unwrap();

        match outcome {
            MapBuildOutcome::Saved { points, schools, skipped, .. } => {
                assert_eq!(points, 2);
                assert_eq!(schools, 0);
                assert_eq!(skipped, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("$100k - $199k"));
    }

    #[tokio::test]
    async fn test_school_failure_degrades_to_no_schools() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("map.html");

        let transport = Arc::new(FakeTransport::new());
        transport.push_json("https://www.greatschools.org/gsr/api/schools", 500, json!({}));
        let client = SchoolsClient::new(
            transport,
            FileCache::new(tmp.path().join("cache")),
            SchoolsConfig::default(),
            None,
            None,
        );

        let outcome = build_map(&[located(1)], Some(&client), &output).await.unwrap();
        match outcome {
            MapBuildOutcome::Saved { schools, .. } => assert_eq!(schools, 0),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_schools_overlay_included() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("map.html");

        let transport = Arc::new(FakeTransport::new());
        transport.push_json(
            "https://www.greatschools.org/gsr/api/schools",
            200,
            json!({"items": [
                {"name": "PS 1", "lat": 40.8, "lon": -73.9, "rating": 8},
                {"name": "No Coords"}
            ]}),
        );
        let client = SchoolsClient::new(
            transport,
            FileCache::new(tmp.path().join("cache")),
            SchoolsConfig::default(),
            None,
            None,
        );

        let outcome = build_map(&[located(1)], Some(&client), &output).await.unwrap();
        match outcome {
            MapBuildOutcome::Saved { schools, .. } => assert_eq!(schools, 1),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let html = fs::read_to_string(&output).unwrap();
        assert!(html.contains("PS 1"));
    }
}

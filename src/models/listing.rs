//! Listing API response structures.
//!
//! The upstream payload is deeply nested and loosely typed; every field
//! defaults so a partial record deserializes instead of failing the page.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of listing search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingPage {
    #[serde(rename = "SearchPagerBar", default)]
    pub pager: SearchPagerBar,

    #[serde(rename = "MapList", default)]
    pub map_list: MapList,
}

impl ListingPage {
    /// Parse a page from a raw response body.
    pub fn from_value(value: Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn listings(&self) -> &[ListingSummary] {
        &self.map_list.listings
    }
}

/// Pagination metadata, only meaningful on page 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPagerBar {
    #[serde(rename = "TotalPages", default = "default_total_pages")]
    pub total_pages: u32,
}

impl Default for SearchPagerBar {
    fn default() -> Self {
        Self { total_pages: default_total_pages() }
    }
}

fn default_total_pages() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapList {
    #[serde(rename = "ListingsSummaryVM", default)]
    pub listings: Vec<ListingSummary>,
}

/// One listing summary record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSummary {
    /// Upstream id; number or string depending on the endpoint version.
    #[serde(rename = "ListingId", default)]
    pub listing_id: Value,

    #[serde(rename = "PriceHtml", default)]
    pub price_html: String,

    /// Currency-formatted cash amount, e.g. "$123,456".
    #[serde(rename = "CashFormat", default)]
    pub cash_format: String,

    #[serde(rename = "Location", default)]
    pub location: String,

    #[serde(rename = "Content", default)]
    pub content: String,

    #[serde(rename = "MainFeatures", default)]
    pub main_features: MainFeatures,

    #[serde(rename = "DetailsLink", default)]
    pub details_link: String,

    #[serde(rename = "PhotoLink", default)]
    pub photo_link: String,

    #[serde(rename = "Centroid", default)]
    pub centroid: Centroid,
}

impl ListingSummary {
    /// Listing id rendered for CSV output; empty when absent.
    pub fn listing_id_text(&self) -> String {
        match &self.listing_id {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MainFeatures {
    #[serde(rename = "Rate", default)]
    pub rate: String,

    #[serde(rename = "PaymentFormat", default)]
    pub payment_format: String,

    #[serde(rename = "EstimatedPayFormat", default)]
    pub estimated_pay_format: String,
}

/// Representative coordinates for a listing.
///
/// The upstream sends numbers or numeric strings; accessors absorb both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Centroid {
    #[serde(default)]
    pub latitude: Value,

    #[serde(default)]
    pub longitude: Value,
}

impl Centroid {
    pub fn latitude(&self) -> Option<f64> {
        coerce_f64(&self.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        coerce_f64(&self.longitude)
    }
}

/// Coerce a JSON number or numeric string into an `f64`.
pub(crate) fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_parses_with_defaults() {
        let page = ListingPage::from_value(json!({})).unwrap();
        assert_eq!(page.pager.total_pages, 1);
        assert!(page.listings().is_empty());
    }

    #[test]
    fn test_page_parses_nested_fields() {
        let page = ListingPage::from_value(json!({
            "SearchPagerBar": {"TotalPages": 7},
            "MapList": {"ListingsSummaryVM": [
                {
                    "ListingId": 42,
                    "CashFormat": "$150,000",
                    "Location": "123 Main St Troy NY",
                    "Centroid": {"latitude": 42.73, "longitude": "-73.69"}
                }
            ]}
        }))
        .unwrap();

        assert_eq!(page.pager.total_pages, 7);
        let listing = &page.listings()[0];
        assert_eq!(listing.listing_id_text(), "42");
        assert_eq!(listing.centroid.latitude(), Some(42.73));
        assert_eq!(listing.centroid.longitude(), Some(-73.69));
    }

    #[test]
    fn test_missing_centroid_yields_no_coordinates() {
        let listing = ListingSummary::default();
        assert_eq!(listing.centroid.latitude(), None);
        assert_eq!(listing.centroid.longitude(), None);
    }
}

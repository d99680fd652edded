//! Normalized map point model.
//!
//! Converts raw listing and school records into flat, immutable pins with
//! deterministic category and color assignment. Points are recomputed from
//! scratch every run and never persisted.

use crate::models::listing::ListingSummary;
use crate::models::school::{School, SchoolType};
use crate::utils::{photo_link_id, slugify_location};

/// Price bucket labels in render order.
pub const PRICE_GROUPS: [&str; 5] = [
    "$300k+",
    "$200k - $299k",
    "$100k - $199k",
    "Cash < $100k",
    "Unknown",
];

/// A normalized property pin.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub popup_html: String,
    pub color: &'static str,
    /// Price bucket label used for layer grouping.
    pub group: &'static str,
}

/// A normalized school pin.
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolPoint {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub rating: Option<i64>,
    pub school_type: SchoolType,
    pub popup_html: String,
    pub color: &'static str,
}

impl SchoolPoint {
    /// Rating rendered as a filter tag ("9", "N/A", ...).
    pub fn rating_tag(&self) -> String {
        match self.rating {
            Some(r) => r.to_string(),
            None => "N/A".to_string(),
        }
    }
}

/// Bucket a cash price into a label and marker color.
pub fn price_to_category(price: i64) -> (&'static str, &'static str) {
    if price >= 300_000 {
        ("$300k+", "red")
    } else if price >= 200_000 {
        ("$200k - $299k", "lightred")
    } else if price >= 100_000 {
        ("$100k - $199k", "orange")
    } else if price > 0 {
        ("Cash < $100k", "green")
    } else {
        ("Unknown", "gray")
    }
}

/// Parse a currency-formatted string ("$123,456") into a whole amount.
///
/// Empty or unparsable input is 0, never an error.
pub fn parse_cash(raw: &str) -> i64 {
    let cleaned: String = raw.replace(['$', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return 0;
    }
    cleaned.parse::<f64>().map(|f| f as i64).unwrap_or(0)
}

/// Marker color for a school rating, on a blue/purple scale kept distinct
/// from the property colors.
pub fn rating_to_color(rating: Option<i64>) -> &'static str {
    match rating {
        None => "lightgray",
        Some(r) if r >= 9 => "darkblue",
        Some(r) if r >= 7 => "blue",
        Some(r) if r >= 5 => "cadetblue",
        Some(r) if r >= 3 => "purple",
        Some(_) => "darkpurple",
    }
}

/// External deep link for a listing, built from the slugified location and
/// a best-effort identifier extracted from the photo URL.
fn zillow_link(listing: &ListingSummary) -> String {
    let slug = slugify_location(&listing.location);
    match photo_link_id(&listing.photo_link) {
        Some(zpid) => format!("https://www.zillow.com/homedetails/{slug}/{zpid}_zpid/"),
        None => format!("https://www.zillow.com/homedetails/{slug}/"),
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

/// Convert a raw listing into a map point.
///
/// A missing or zero coordinate means the listing cannot be pinned and is
/// skipped; zero is deliberately treated as absent since the upstream emits
/// it for unlocated records.
pub fn listing_to_point(listing: &ListingSummary) -> Option<MapPoint> {
    let lat = listing.centroid.latitude().filter(|v| *v != 0.0)?;
    let lon = listing.centroid.longitude().filter(|v| *v != 0.0)?;

    let price = parse_cash(&listing.cash_format);
    let (group, color) = price_to_category(price);

    let popup_html = format!(
        r#"<div style="width:300px">
    <img src="{photo}" alt="Property Image" style="width:100%; border-radius:6px; margin-bottom:8px;"><br>
    <strong>{price_html}</strong><br>
    <strong>Cash:</strong> {cash}<br>
    <em>{location}</em><br><br>
    {content}<br><br>
    <strong>Rate:</strong> {rate}<br>
    <strong>Monthly:</strong> {payment}<br>
    <strong>Estimated:</strong> {estimated}<br>
    <a href="{link}" target="_blank">View on Zillow</a>
</div>"#,
        photo = listing.photo_link,
        price_html = or_na(&listing.price_html),
        cash = or_na(&listing.cash_format),
        location = listing.location,
        content = listing.content,
        rate = or_na(&listing.main_features.rate),
        payment = or_na(&listing.main_features.payment_format),
        estimated = or_na(&listing.main_features.estimated_pay_format),
        link = zillow_link(listing),
    );

    Some(MapPoint { lat, lon, popup_html, color, group })
}

/// Convert a raw school record into a school point.
pub fn school_to_point(school: &School) -> Option<SchoolPoint> {
    let lat = school.latitude()?;
    let lon = school.longitude()?;

    let rating = school.rating();
    let school_type = school.school_type();

    let popup_html = format!(
        r#"<div style="width:250px">
    <strong>{name}</strong><br>
    Rating: {rating}<br>
    Type: {school_type}<br>
    {street}, {city}
</div>"#,
        name = school.name,
        rating = rating.map_or("N/A".to_string(), |r| r.to_string()),
        school_type = school_type,
        street = school.address.street1,
        city = school.address.city,
    );

    Some(SchoolPoint {
        lat,
        lon,
        name: school.name.clone(),
        rating,
        school_type,
        popup_html,
        color: rating_to_color(rating),
    })
}

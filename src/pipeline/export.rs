// src/pipeline/export.rs

//! CSV export of merged listings.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::ListingSummary;

const HEADERS: [&str; 10] = [
    "ListingId",
    "Cash",
    "Price",
    "Location",
    "Content",
    "Rate",
    "Payment",
    "EstimatedPayment",
    "DetailsLink",
    "PhotoLink",
];

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row, quoting only where necessary.
fn write_row<W: Write>(mut w: W, row: &[&str]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Render listings as a CSV document.
pub fn listings_to_csv(listings: &[ListingSummary]) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let _ = write_row(&mut buf, &HEADERS);

    for listing in listings {
        let id = listing.listing_id_text();
        let row = [
            id.as_str(),
            listing.cash_format.as_str(),
            listing.price_html.as_str(),
            listing.location.as_str(),
            listing.content.as_str(),
            listing.main_features.rate.as_str(),
            listing.main_features.payment_format.as_str(),
            listing.main_features.estimated_pay_format.as_str(),
            listing.details_link.as_str(),
            listing.photo_link.as_str(),
        ];
        let _ = write_row(&mut buf, &row);
    }

    String::from_utf8(buf).unwrap_or_default()
}

/// Write listings to a CSV file.
pub fn write_listings_csv(listings: &[ListingSummary], path: &Path) -> Result<()> {
    fs::write(path, listings_to_csv(listings))?;
    log::info!("Saved {} listings to {:?}", listings.len(), path);
    Ok(())
}

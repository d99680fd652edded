//! Pipeline entry points for scraper operations.
//!
//! - `collect_listings`: Drive listing pagination and merge all pages
//! - `build_map`: Normalize records and emit the map artifact
//! - `write_listings_csv`: Export merged listings

pub mod export;
pub mod map;
pub mod scrape;

pub use export::write_listings_csv;
pub use map::{build_map, MapBuildOutcome};
pub use scrape::{collect_listings, ScrapeOutcome};

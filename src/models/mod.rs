// src/models/mod.rs

//! Domain models for the scraper application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod listing;
mod point;
mod school;

// Re-export all public types
pub use config::{Config, CrawlerConfig, Credentials, ListingConfig, SchoolsConfig};
pub use listing::{Centroid, ListingPage, ListingSummary, MainFeatures, MapList, SearchPagerBar};
pub use point::{
    listing_to_point, parse_cash, price_to_category, rating_to_color, school_to_point, MapPoint,
    SchoolPoint, PRICE_GROUPS,
};
pub use school::{School, SchoolAddress, SchoolLinks, SchoolPage, SchoolType};

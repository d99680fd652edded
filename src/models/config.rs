//! Application configuration structures.
//!
//! Non-secret settings live in a TOML file loaded with serde defaults;
//! credentials and session cookies are resolved from the environment and
//! never written to disk.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Listing search parameters
    #[serde(default)]
    pub listing: ListingConfig,

    /// School search parameters
    #[serde(default)]
    pub schools: SchoolsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.listing.base_url)?;
        if self.listing.viewport.trim().is_empty() {
            return Err(AppError::validation("listing.viewport is empty"));
        }
        url::Url::parse(&self.schools.base_url)?;
        if self.schools.state.trim().is_empty() {
            return Err(AppError::validation("schools.state is empty"));
        }
        if self.schools.distance == 0 {
            return Err(AppError::validation("schools.distance must be > 0"));
        }
        Ok(())
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between listing page requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

/// Fixed search parameters for the listing source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Listing API endpoint
    #[serde(default = "defaults::listing_base_url")]
    pub base_url: String,

    /// Location search string
    #[serde(default = "defaults::listing_location")]
    pub location: String,

    /// Geographic location identifier used by the search backend
    #[serde(default = "defaults::listing_geo_id")]
    pub geo_id: u32,

    /// Viewport bounding box as "west,south,east,north"
    #[serde(default = "defaults::listing_viewport")]
    pub viewport: String,

    /// Map zoom level embedded in the search payload
    #[serde(default = "defaults::listing_zoom")]
    pub zoom: u32,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::listing_base_url(),
            location: defaults::listing_location(),
            geo_id: defaults::listing_geo_id(),
            viewport: defaults::listing_viewport(),
            zoom: defaults::listing_zoom(),
        }
    }
}

/// Search parameters for the school source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolsConfig {
    /// School API endpoint
    #[serde(default = "defaults::schools_base_url")]
    pub base_url: String,

    /// User-Agent sent to the school API (overridable via GS_USER_AGENT)
    #[serde(default = "defaults::schools_user_agent")]
    pub user_agent: String,

    /// City reported in the synthesized geolocation cookie
    #[serde(default = "defaults::schools_city")]
    pub city: String,

    /// Two-letter state code
    #[serde(default = "defaults::schools_state")]
    pub state: String,

    /// Search radius in miles
    #[serde(default = "defaults::schools_distance")]
    pub distance: u32,

    /// Page size requested from the API
    #[serde(default = "defaults::schools_limit")]
    pub limit: u32,

    /// School level filter
    #[serde(default = "defaults::schools_level_code")]
    pub level_code: String,
}

impl Default for SchoolsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::schools_base_url(),
            user_agent: defaults::schools_user_agent(),
            city: defaults::schools_city(),
            state: defaults::schools_state(),
            distance: defaults::schools_distance(),
            limit: defaults::schools_limit(),
            level_code: defaults::schools_level_code(),
        }
    }
}

/// Credentials and session cookies, resolved from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Listing API auth token (ASSUMABLE_TOKEN)
    pub token: String,
    pub xsrf_token: Option<String>,
    pub cf_clearance: Option<String>,
    pub botble_session: Option<String>,
    pub remember_account_name: Option<String>,
    pub remember_account: Option<String>,

    /// School API CSRF header value (GS_CSRF_TOKEN)
    pub gs_csrf_token: Option<String>,
    /// School API CSRF cookie value (GS_COOKIE)
    pub gs_csrf_cookie: Option<String>,
    /// School API User-Agent override (GS_USER_AGENT)
    pub gs_user_agent: Option<String>,
}

impl Credentials {
    /// Resolve all credentials from the environment.
    pub fn from_env() -> Self {
        let get = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            token: get("ASSUMABLE_TOKEN").unwrap_or_default(),
            xsrf_token: get("XSRF_TOKEN"),
            cf_clearance: get("CF_CLEARANCE"),
            botble_session: get("BOTBLE_SESSION"),
            remember_account_name: get("REMEMBER_ACCOUNT_NAME"),
            remember_account: get("REMEMBER_ACCOUNT"),
            gs_csrf_token: get("GS_CSRF_TOKEN"),
            gs_csrf_cookie: get("GS_COOKIE"),
            gs_user_agent: get("GS_USER_AGENT"),
        }
    }

    /// Session cookies sent with every listing request.
    pub fn listing_cookies(&self) -> Vec<(String, String)> {
        let mut cookies = Vec::new();
        if let Some(v) = &self.xsrf_token {
            cookies.push(("XSRF-TOKEN".to_string(), v.clone()));
        }
        if let Some(v) = &self.cf_clearance {
            cookies.push(("cf_clearance".to_string(), v.clone()));
        }
        if let Some(v) = &self.botble_session {
            cookies.push(("botble_session".to_string(), v.clone()));
        }
        if let (Some(name), Some(value)) = (&self.remember_account_name, &self.remember_account) {
            cookies.push((format!("remember_account_{name}"), value.clone()));
        }
        cookies
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
            .to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn listing_base_url() -> String {
        "https://app.assumable.io/".to_string()
    }

    pub fn listing_location() -> String {
        "New York".to_string()
    }

    pub fn listing_geo_id() -> u32 {
        3269
    }

    pub fn listing_viewport() -> String {
        "-76.8612404491507,37.73641064455742,-72.41452414055695,43.07531462025779".to_string()
    }

    pub fn listing_zoom() -> u32 {
        1
    }

    pub fn schools_base_url() -> String {
        "https://www.greatschools.org/gsr/api/schools".to_string()
    }

    pub fn schools_user_agent() -> String {
        user_agent()
    }

    pub fn schools_city() -> String {
        "The Bronx".to_string()
    }

    pub fn schools_state() -> String {
        "NY".to_string()
    }

    pub fn schools_distance() -> u32 {
        18
    }

    pub fn schools_limit() -> u32 {
        2000
    }

    pub fn schools_level_code() -> String {
        "e,e".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.crawler.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_malformed_base_url() {
        let mut config = Config::default();
        config.listing.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [schools]
            state = "MA"
            distance = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.schools.state, "MA");
        assert_eq!(config.schools.distance, 5);
        assert_eq!(config.schools.limit, 2000);
        assert_eq!(config.crawler.timeout_secs, 30);
        assert_eq!(config.listing.location, "New York");
    }

    #[test]
    fn test_listing_cookies_skip_missing() {
        let creds = Credentials {
            xsrf_token: Some("x".to_string()),
            remember_account_name: Some("alice".to_string()),
            remember_account: Some("tok".to_string()),
            ..Credentials::default()
        };
        let cookies = creds.listing_cookies();
        assert_eq!(
            cookies,
            vec![
                ("XSRF-TOKEN".to_string(), "x".to_string()),
                ("remember_account_alice".to_string(), "tok".to_string()),
            ]
        );
    }
}

// src/utils/http.rs

//! HTTP transport seam.
//!
//! Adapters talk to the network through the [`Transport`] trait so tests can
//! substitute a scripted fake. The real implementation wraps a configured
//! `reqwest::Client`; cookies are rendered into a single `Cookie` header
//! rather than a jar, since both upstream APIs take fixed session cookies.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::CrawlerConfig;

/// Outcome of a single HTTP exchange.
///
/// `final_url` is the resolved request URL; link-paginated sources cache
/// follow-up pages keyed by it, since the URL already encodes cursor state.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub final_url: String,
}

impl FetchResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking-style HTTP operations used by the source adapters.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a form-encoded body.
    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        cookies: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<FetchResponse>;

    /// GET with optional query parameters.
    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        cookies: &[(String, String)],
        query: &[(String, String)],
    ) -> Result<FetchResponse>;
}

/// Render cookie pairs into a `Cookie` header value.
fn cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Real transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a configured asynchronous HTTP client.
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    fn apply_headers(
        mut req: reqwest::RequestBuilder,
        headers: &[(String, String)],
        cookies: &[(String, String)],
    ) -> reqwest::RequestBuilder {
        for (name, value) in headers {
            req = req.header(name, value);
        }
        if !cookies.is_empty() {
            req = req.header("Cookie", cookie_header(cookies));
        }
        req
    }

    async fn finish(req: reqwest::RequestBuilder) -> Result<FetchResponse> {
        let response = req.send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok(FetchResponse { status, body, final_url })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        headers: &[(String, String)],
        cookies: &[(String, String)],
        form: &[(String, String)],
    ) -> Result<FetchResponse> {
        let req = Self::apply_headers(self.client.post(url), headers, cookies).form(form);
        Self::finish(req).await
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
        cookies: &[(String, String)],
        query: &[(String, String)],
    ) -> Result<FetchResponse> {
        let mut req = Self::apply_headers(self.client.get(url), headers, cookies);
        if !query.is_empty() {
            req = req.query(query);
        }
        Self::finish(req).await
    }
}

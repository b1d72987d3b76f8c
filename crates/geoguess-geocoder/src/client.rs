//! HTTP client for the Nominatim `/search` endpoint.
//!
//! Every request asks for `jsonv2` output with polygon GeoJSON attached.
//! Transport failures and non-2xx statuses surface as
//! [`GeocoderError::Http`]; nothing is retried at this layer.

use std::time::Duration;

use geo::Rect;
use reqwest::{header, Client, Url};

use crate::error::GeocoderError;
use crate::types::Place;

/// Parameters for one `/search` call.
#[derive(Debug, Clone)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub limit: u32,
    /// Restricts results to this box (`bounded=1`).
    pub viewbox: Option<Rect<f64>>,
    /// Overrides the client's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl<'a> SearchRequest<'a> {
    #[must_use]
    pub fn new(query: &'a str, limit: u32) -> Self {
        Self {
            query,
            limit,
            viewbox: None,
            timeout: None,
        }
    }
}

/// Client for a Nominatim-compatible geocoder.
///
/// The base URL selects the public instance, a self-hosted one, or a mock
/// server in tests.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// Creates a client with a custom base URL.
    ///
    /// `user_agent` should identify the application; the public instance's
    /// usage policy rejects anonymous clients.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`GeocoderError::InvalidBaseUrl`] if `base_url` does
    /// not parse.
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, GeocoderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `join("search")` appends rather than
        // replacing the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| GeocoderError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Runs one search and returns the places in rank order.
    ///
    /// # Errors
    ///
    /// - [`GeocoderError::Http`] on network failure, timeout or non-2xx status.
    /// - [`GeocoderError::Deserialize`] if the body is not a JSON array of places.
    pub async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<Place>, GeocoderError> {
        let url = self.build_search_url(request)?;
        tracing::debug!(query = request.query, limit = request.limit, "geocoder search");

        let mut builder = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocoderError::Deserialize {
            context: format!("search(q={})", request.query),
            source: e,
        })
    }

    fn build_search_url(&self, request: &SearchRequest<'_>) -> Result<Url, GeocoderError> {
        let mut url = self
            .base_url
            .join("search")
            .map_err(|e| GeocoderError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", request.query);
            pairs.append_pair("format", "jsonv2");
            pairs.append_pair("polygon_geojson", "1");
            pairs.append_pair("addressdetails", "1");
            pairs.append_pair("limit", &request.limit.to_string());
            if let Some(viewbox) = request.viewbox {
                pairs.append_pair("viewbox", &format_viewbox(&viewbox));
                pairs.append_pair("bounded", "1");
            }
        }
        Ok(url)
    }
}

/// `left,top,right,bottom` in degrees.
fn format_viewbox(rect: &Rect<f64>) -> String {
    format!(
        "{},{},{},{}",
        rect.min().x,
        rect.max().y,
        rect.max().x,
        rect.min().y
    )
}

//! HTTP client for the Street View Static API metadata endpoint.
//!
//! Metadata requests are free of charge and report whether imagery exists
//! near a location without fetching it.

use std::future::Future;
use std::time::Duration;

use geoguess_geo::SampledPoint;
use reqwest::{header, Client, Url};

use crate::error::StreetViewError;
use crate::metadata::StreetViewMetadata;

/// Anything that can answer a metadata query for a point and radius.
///
/// Implemented by [`StreetViewClient`]; tests substitute scripted stubs.
pub trait MetadataLookup {
    fn metadata(
        &self,
        point: SampledPoint,
        radius: u32,
        all_panorama: bool,
    ) -> impl Future<Output = Result<StreetViewMetadata, StreetViewError>> + Send;
}

#[derive(Clone)]
pub struct StreetViewClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for StreetViewClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreetViewClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish_non_exhaustive()
    }
}

impl StreetViewClient {
    /// Creates a client for the metadata endpoint at `endpoint`, the full
    /// metadata URL rather than a base (a mock server in tests).
    ///
    /// A missing key is not an error here; each lookup fails with
    /// [`StreetViewError::MissingApiKey`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`StreetViewError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`StreetViewError::InvalidBaseUrl`] if `endpoint`
    /// does not parse.
    pub fn with_endpoint(
        endpoint: &str,
        api_key: Option<String>,
        user_agent: &str,
        timeout_secs: u64,
    ) -> Result<Self, StreetViewError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let endpoint = Url::parse(endpoint).map_err(|e| StreetViewError::InvalidBaseUrl {
            url: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        let api_key = api_key.filter(|k| !k.trim().is_empty());

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Looks up imagery metadata near `point`.
    ///
    /// `all_panorama = false` restricts the search to official outdoor
    /// imagery (`source=default`).
    ///
    /// # Errors
    ///
    /// - [`StreetViewError::MissingApiKey`] if no key is configured.
    /// - [`StreetViewError::Http`] on network failure, timeout or non-2xx status.
    /// - [`StreetViewError::Deserialize`] if the body is not metadata JSON.
    pub async fn fetch_metadata(
        &self,
        point: SampledPoint,
        radius: u32,
        all_panorama: bool,
    ) -> Result<StreetViewMetadata, StreetViewError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(StreetViewError::MissingApiKey)?;
        let url = self.build_metadata_url(point, radius, all_panorama, key);
        tracing::debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            radius,
            all_panorama,
            "street view metadata lookup"
        );

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StreetViewError::Deserialize {
            context: format!("metadata(location={},{})", point.latitude, point.longitude),
            source: e,
        })
    }

    fn build_metadata_url(
        &self,
        point: SampledPoint,
        radius: u32,
        all_panorama: bool,
        key: &str,
    ) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair(
                "location",
                &format!("{},{}", point.latitude, point.longitude),
            );
            pairs.append_pair("radius", &radius.to_string());
            pairs.append_pair("key", key);
            if !all_panorama {
                pairs.append_pair("source", "default");
            }
        }
        url
    }
}

impl MetadataLookup for StreetViewClient {
    fn metadata(
        &self,
        point: SampledPoint,
        radius: u32,
        all_panorama: bool,
    ) -> impl Future<Output = Result<StreetViewMetadata, StreetViewError>> + Send {
        self.fetch_metadata(point, radius, all_panorama)
    }
}

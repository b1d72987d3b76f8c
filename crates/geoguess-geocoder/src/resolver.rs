//! Cache-aware entry point tying boundary lookup, discovery and persistence
//! together.

use std::path::PathBuf;
use std::sync::Arc;

use geoguess_core::{AppConfig, PlaceKey};
use geoguess_geo::BoundaryGeometry;

use crate::cache::{AreaCache, AreaCacheEntry};
use crate::client::NominatimClient;
use crate::discovery::{discover_sub_areas, DiscoveryOptions};
use crate::error::GeocoderError;
use crate::types::ResolvedBoundary;

#[derive(Debug, Clone)]
pub struct AreaResolver {
    client: NominatimClient,
    cache: Arc<AreaCache>,
    cache_dir: Option<PathBuf>,
    options: DiscoveryOptions,
}

impl AreaResolver {
    #[must_use]
    pub fn new(
        client: NominatimClient,
        cache: Arc<AreaCache>,
        cache_dir: Option<PathBuf>,
        options: DiscoveryOptions,
    ) -> Self {
        Self {
            client,
            cache,
            cache_dir,
            options,
        }
    }

    /// Builds a resolver from application config with a fresh cache.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError`] if the geocoder client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, GeocoderError> {
        let client = NominatimClient::with_base_url(
            &config.nominatim_base_url,
            &config.user_agent,
            config.geocoder_timeout_secs,
        )?;
        Ok(Self::new(
            client,
            Arc::new(AreaCache::new()),
            config.cache_dir.clone(),
            DiscoveryOptions::from_app_config(config),
        ))
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<AreaCache> {
        &self.cache
    }

    /// Loads every persisted entry from the configured cache directory.
    pub fn warm_cache(&self) -> usize {
        match &self.cache_dir {
            Some(dir) => self.cache.load_all_from_dir(dir),
            None => 0,
        }
    }

    /// Full boundary for `city`, never cached.
    ///
    /// # Errors
    ///
    /// See [`NominatimClient::resolve_boundary`].
    pub async fn resolve_boundary(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<ResolvedBoundary, GeocoderError> {
        self.client.resolve_boundary(city, country).await
    }

    /// Ranked sub-areas for `city`, discovered once and then served from
    /// cache.
    ///
    /// On a miss the in-memory cache is consulted, then the cache directory,
    /// and only then the geocoder. A failed write to disk is logged and the
    /// result is still kept in memory. File access and building the entry's
    /// sampling domain run on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError`] from boundary resolution or discovery.
    pub async fn sub_areas(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<Arc<AreaCacheEntry>, GeocoderError> {
        let key = place_key(city, country)?;
        if let Some(entry) = self.cached(&key).await? {
            tracing::debug!(place = %key, "sub-area cache hit");
            return Ok(entry);
        }

        let boundary = self.client.resolve_boundary(city, country).await?;
        let areas =
            discover_sub_areas(&self.client, &boundary.geometry, city, country, &self.options)
                .await?;

        let cache = Arc::clone(&self.cache);
        let dir = self.cache_dir.clone();
        let entry = tokio::task::spawn_blocking(move || {
            if let Some(dir) = &dir {
                match cache.save_to_disk(dir, &key, areas.clone()) {
                    Ok(_) => {
                        if let Some(entry) = cache.get(&key) {
                            return entry;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(place = %key, error = %e, "failed to persist sub-area cache");
                    }
                }
            }
            cache.put(key, areas, None)
        })
        .await?;
        Ok(entry)
    }

    /// Area a point should be drawn from.
    ///
    /// The union of cached sub-areas when any exist, otherwise the full
    /// boundary. This never triggers discovery. The union is built once per
    /// cache entry and shared.
    ///
    /// # Errors
    ///
    /// Returns [`GeocoderError`] from boundary resolution.
    pub async fn sampling_domain(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<Arc<BoundaryGeometry>, GeocoderError> {
        let key = place_key(city, country)?;
        if let Some(entry) = self.cached(&key).await? {
            if let Some(domain) = &entry.domain {
                tracing::debug!(place = %key, areas = entry.areas.len(), "sampling from cached sub-areas");
                return Ok(Arc::clone(domain));
            }
        }
        let boundary = self.client.resolve_boundary(city, country).await?;
        Ok(Arc::new(boundary.geometry))
    }

    async fn cached(&self, key: &PlaceKey) -> Result<Option<Arc<AreaCacheEntry>>, GeocoderError> {
        if let Some(entry) = self.cache.get(key) {
            return Ok(Some(entry));
        }
        let Some(dir) = self.cache_dir.clone() else {
            return Ok(None);
        };
        let cache = Arc::clone(&self.cache);
        let key = key.clone();
        let entry = tokio::task::spawn_blocking(move || {
            if cache.load_from_disk(&dir, &key) {
                cache.get(&key)
            } else {
                None
            }
        })
        .await?;
        Ok(entry)
    }
}

fn place_key(city: &str, country: Option<&str>) -> Result<PlaceKey, GeocoderError> {
    if city.trim().is_empty() {
        return Err(GeocoderError::InvalidInput(
            "city must not be empty".to_string(),
        ));
    }
    Ok(PlaceKey::new(city, country))
}

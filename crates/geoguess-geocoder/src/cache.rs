//! In-memory sub-area cache with optional GeoJSON persistence.
//!
//! Each place is stored as one `FeatureCollection` file under the cache
//! directory, named after the place key. The collection carries the exact
//! key in a top-level `place_key` member; feature properties carry the
//! provenance fields plus `area`, and the area is recomputed from the
//! geometry when a file is loaded.
//!
//! Loading is all-or-nothing per file: one bad feature rejects the whole
//! file and the in-memory cache is left untouched for that key.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use geoguess_core::PlaceKey;
use geoguess_geo::BoundaryGeometry;
use geojson::{FeatureCollection, GeoJson, JsonObject};
use tempfile::NamedTempFile;

use crate::error::CacheError;
use crate::types::{CandidateArea, Provenance};

const CACHE_EXTENSION: &str = "geojson";
const PLACE_KEY_MEMBER: &str = "place_key";

/// Sub-areas cached for one place.
#[derive(Debug, Clone)]
pub struct AreaCacheEntry {
    pub place_key: PlaceKey,
    pub areas: Vec<CandidateArea>,
    /// Union of `areas`, built once when the entry is created. `None` when
    /// there are no areas or the union could not be formed.
    pub domain: Option<Arc<BoundaryGeometry>>,
    /// File the entry was loaded from or last written to.
    pub source_file: Option<PathBuf>,
}

impl AreaCacheEntry {
    #[must_use]
    pub fn new(place_key: PlaceKey, areas: Vec<CandidateArea>, source_file: Option<PathBuf>) -> Self {
        let domain = if areas.is_empty() {
            None
        } else {
            match BoundaryGeometry::union_of(areas.iter().map(|a| &a.geometry)) {
                Ok(domain) => Some(Arc::new(domain)),
                Err(e) => {
                    tracing::warn!(place = %place_key, error = %e, "could not union cached sub-areas");
                    None
                }
            }
        };
        Self {
            place_key,
            areas,
            domain,
            source_file,
        }
    }
}

/// Contents of one cache file.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheFile {
    /// Key recorded in the file; absent in files written by hand.
    pub place_key: Option<PlaceKey>,
    pub areas: Vec<CandidateArea>,
}

/// Process-wide cache keyed by [`PlaceKey`].
///
/// Entries are immutable once inserted and handed out as `Arc`s; a second
/// `put` for the same key replaces the entry wholesale. Inserting builds the
/// entry's sampling domain, so callers on an async runtime should insert
/// from a blocking task.
#[derive(Debug, Default)]
pub struct AreaCache {
    entries: RwLock<HashMap<PlaceKey, Arc<AreaCacheEntry>>>,
}

impl AreaCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &PlaceKey) -> Option<Arc<AreaCacheEntry>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn put(
        &self,
        key: PlaceKey,
        areas: Vec<CandidateArea>,
        source_file: Option<PathBuf>,
    ) -> Arc<AreaCacheEntry> {
        let entry = Arc::new(AreaCacheEntry::new(key.clone(), areas, source_file));
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&entry));
        entry
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `areas` to `dir` and records them in memory.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the directory or file cannot be written. The
    /// in-memory cache is not updated on failure.
    pub fn save_to_disk(
        &self,
        dir: &Path,
        key: &PlaceKey,
        areas: Vec<CandidateArea>,
    ) -> Result<PathBuf, CacheError> {
        let path = cache_file_path(dir, key);
        write_cache_file(&path, key, &areas)?;
        self.put(key.clone(), areas, Some(path.clone()));
        tracing::info!(place = %key, path = %path.display(), "saved sub-area cache");
        Ok(path)
    }

    /// Loads the file for `key` from `dir` into memory.
    ///
    /// Returns `false` if the file is absent, malformed, or records a
    /// different key.
    pub fn load_from_disk(&self, dir: &Path, key: &PlaceKey) -> bool {
        let path = cache_file_path(dir, key);
        if !path.is_file() {
            return false;
        }
        match read_cache_file(&path) {
            Ok(CacheFile {
                place_key: Some(stored),
                ..
            }) if stored != *key => {
                tracing::warn!(place = %key, stored = %stored, path = %path.display(), "cache file belongs to another place");
                false
            }
            Ok(file) => {
                self.insert_loaded(key.clone(), file.areas, path);
                true
            }
            Err(e) => {
                tracing::warn!(place = %key, error = %e, "ignoring malformed cache file");
                false
            }
        }
    }

    /// Loads every cache file found in `dir`; returns how many were loaded.
    ///
    /// Each entry is keyed by the `place_key` recorded in its file. A missing
    /// directory yields zero; malformed files and files without a recorded
    /// key are skipped.
    pub fn load_all_from_dir(&self, dir: &Path) -> usize {
        let read_dir = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "cache directory not readable");
                return 0;
            }
        };

        let mut loaded = 0usize;
        for entry in read_dir.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_EXTENSION) {
                continue;
            }
            match read_cache_file(&path) {
                Ok(CacheFile {
                    place_key: Some(key),
                    areas,
                }) => {
                    self.insert_loaded(key, areas, path);
                    loaded += 1;
                }
                Ok(CacheFile {
                    place_key: None, ..
                }) => {
                    tracing::warn!(path = %path.display(), "skipping cache file without place_key");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed cache file");
                }
            }
        }

        tracing::info!(dir = %dir.display(), loaded, "loaded sub-area cache directory");
        loaded
    }

    fn insert_loaded(&self, key: PlaceKey, areas: Vec<CandidateArea>, path: PathBuf) {
        tracing::debug!(place = %key, areas = areas.len(), "loaded sub-area cache file");
        self.put(key, areas, Some(path));
    }
}

/// Path of the cache file for `key` inside `dir`.
#[must_use]
pub fn cache_file_path(dir: &Path, key: &PlaceKey) -> PathBuf {
    dir.join(format!("{}.{CACHE_EXTENSION}", key.file_stem()))
}

/// Writes `areas` for `key` as a GeoJSON feature collection, replacing
/// `path` atomically via a uniquely named temp file in the same directory.
///
/// # Errors
///
/// Returns [`CacheError::Io`] on any file-system failure or
/// [`CacheError::Json`] if serialization fails.
pub fn write_cache_file(
    path: &Path,
    key: &PlaceKey,
    areas: &[CandidateArea],
) -> Result<(), CacheError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut members = JsonObject::new();
    members.insert(
        PLACE_KEY_MEMBER.to_string(),
        serde_json::Value::String(key.as_str().to_owned()),
    );
    let collection = FeatureCollection {
        bbox: None,
        features: areas.iter().map(CandidateArea::to_feature).collect(),
        foreign_members: Some(members),
    };
    let body = serde_json::to_vec(&collection).map_err(|source| CacheError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|source| CacheError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    tmp.write_all(&body).map_err(|source| CacheError::Io {
        path: tmp.path().to_path_buf(),
        source,
    })?;
    tmp.persist(path).map_err(|e| CacheError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Reads a cache file written by [`write_cache_file`].
///
/// # Errors
///
/// - [`CacheError::Io`] if the file cannot be read.
/// - [`CacheError::Json`] if it is not JSON.
/// - [`CacheError::Malformed`] if it is not a non-empty feature collection,
///   the recorded key is not a string, or any feature lacks a usable polygon
///   or provenance.
pub fn read_cache_file(path: &Path) -> Result<CacheFile, CacheError> {
    let malformed = |reason: String| CacheError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&text).map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let GeoJson::FeatureCollection(collection) =
        GeoJson::from_json_value(value).map_err(|e| malformed(e.to_string()))?
    else {
        return Err(malformed("expected a FeatureCollection".to_string()));
    };
    if collection.features.is_empty() {
        return Err(malformed("feature collection is empty".to_string()));
    }

    let place_key = match collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get(PLACE_KEY_MEMBER))
    {
        None => None,
        Some(raw) => Some(
            serde_json::from_value::<PlaceKey>(raw.clone())
                .map_err(|e| malformed(format!("{PLACE_KEY_MEMBER}: {e}")))?,
        ),
    };

    let mut areas = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let geometry = feature
            .geometry
            .ok_or_else(|| malformed(format!("feature {index} has no geometry")))?;
        let geometry = BoundaryGeometry::from_geojson(GeoJson::Geometry(geometry))
            .map_err(|e| malformed(format!("feature {index}: {e}")))?;
        let properties = feature.properties.unwrap_or_default();
        let provenance: Provenance =
            serde_json::from_value(serde_json::Value::Object(properties))
                .map_err(|e| malformed(format!("feature {index} properties: {e}")))?;
        areas.push(CandidateArea::new(geometry, provenance));
    }
    Ok(CacheFile { place_key, areas })
}

//! Geocoder response and resolution result types.

use geoguess_geo::BoundaryGeometry;
use serde::{Deserialize, Serialize};

/// One entry of a Nominatim `/search` response.
///
/// `jsonv2` output names the class field `category`; plain `json` names it
/// `class`. Both are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct Place {
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub osm_type: Option<String>,
    pub osm_id: Option<u64>,
    #[serde(alias = "class")]
    pub category: Option<String>,
    /// Present when the request asked for `polygon_geojson=1`.
    pub geojson: Option<serde_json::Value>,
}

impl Place {
    /// True when the attached geometry is a `Polygon` or `MultiPolygon`.
    #[must_use]
    pub fn has_polygon(&self) -> bool {
        self.geojson
            .as_ref()
            .and_then(|g| g.get("type"))
            .and_then(serde_json::Value::as_str)
            .is_some_and(|t| t == "Polygon" || t == "MultiPolygon")
    }

    #[must_use]
    pub fn metadata(&self) -> PlaceMetadata {
        PlaceMetadata {
            display_name: self.display_name.clone(),
            place_type: self.place_type.clone(),
            osm_type: self.osm_type.clone(),
            osm_id: self.osm_id,
            category: self.category.clone(),
        }
    }
}

/// Descriptive fields of a resolved place, serialized with the geocoder's
/// own property names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceMetadata {
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub osm_type: Option<String>,
    pub osm_id: Option<u64>,
    #[serde(rename = "class")]
    pub category: Option<String>,
}

/// Full-area boundary for a named place.
#[derive(Debug, Clone)]
pub struct ResolvedBoundary {
    pub query: String,
    pub geometry: BoundaryGeometry,
    pub metadata: PlaceMetadata,
}

impl ResolvedBoundary {
    /// Renders as a GeoJSON feature carrying the place metadata as properties.
    #[must_use]
    pub fn to_feature(&self) -> geojson::Feature {
        let properties = match serde_json::to_value(&self.metadata) {
            Ok(serde_json::Value::Object(map)) => Some(map),
            _ => None,
        };
        geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.to_geojson()),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}

/// Where a discovered sub-area came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub display_name: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: Option<String>,
    pub osm_type: Option<String>,
    pub osm_id: Option<u64>,
    #[serde(rename = "class")]
    pub class_tag: Option<String>,
    #[serde(rename = "keyword")]
    pub matched_keyword: String,
}

/// A sub-area fully covered by its parent boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateArea {
    pub geometry: BoundaryGeometry,
    pub area: f64,
    pub provenance: Provenance,
}

impl CandidateArea {
    #[must_use]
    pub fn new(geometry: BoundaryGeometry, provenance: Provenance) -> Self {
        let area = geometry.area();
        Self {
            geometry,
            area,
            provenance,
        }
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.geometry.fingerprint()
    }

    /// Renders as a GeoJSON feature whose properties are the provenance
    /// fields plus `area`.
    #[must_use]
    pub fn to_feature(&self) -> geojson::Feature {
        let mut properties = match serde_json::to_value(&self.provenance) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        properties.insert("area".to_string(), serde_json::json!(self.area));
        geojson::Feature {
            bbox: None,
            geometry: Some(self.geometry.to_geojson()),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

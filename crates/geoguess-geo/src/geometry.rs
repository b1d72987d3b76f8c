//! Canonical boundary geometry.
//!
//! Every polygonal input (a bare GeoJSON geometry, a single feature, or a
//! feature collection) is normalised into one [`BoundaryGeometry`] backed by a
//! `MultiPolygon`. The bounding box, planar area and centroid are computed
//! once at construction; the value is never mutated afterwards.

use geo::{
    unary_union, Area, BoundingRect, Centroid, Contains, Coord, MultiPolygon, Point, Polygon,
    Rect, Relate,
};
use geojson::GeoJson;
use sha2::{Digest, Sha256};

use crate::error::GeoError;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryGeometry {
    shape: MultiPolygon<f64>,
    bbox: Rect<f64>,
    area: f64,
    centroid: Point<f64>,
}

impl BoundaryGeometry {
    /// Builds a geometry from an already-parsed multipolygon.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidGeometry`] when the multipolygon is empty or
    /// has no computable bounding box or centroid.
    pub fn from_multi_polygon(shape: MultiPolygon<f64>) -> Result<Self, GeoError> {
        if shape.0.is_empty() {
            return Err(GeoError::InvalidGeometry(
                "multipolygon has no members".to_string(),
            ));
        }
        let bbox = shape
            .bounding_rect()
            .ok_or_else(|| GeoError::InvalidGeometry("geometry has no extent".to_string()))?;
        let centroid = shape
            .centroid()
            .ok_or_else(|| GeoError::InvalidGeometry("geometry has no centroid".to_string()))?;
        let area = shape.unsigned_area();

        Ok(Self {
            shape,
            bbox,
            area,
            centroid,
        })
    }

    /// Normalises any GeoJSON object into a single geometry.
    ///
    /// A feature collection is reduced to the union of its members.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidGeometry`] if any member is missing a
    /// geometry or is not a `Polygon`/`MultiPolygon`, or if a collection is
    /// empty.
    pub fn from_geojson(input: GeoJson) -> Result<Self, GeoError> {
        match input {
            GeoJson::Geometry(geometry) => Self::from_multi_polygon(multi_polygon_of(geometry)?),
            GeoJson::Feature(feature) => {
                let geometry = feature.geometry.ok_or_else(|| {
                    GeoError::InvalidGeometry("feature has no geometry".to_string())
                })?;
                Self::from_multi_polygon(multi_polygon_of(geometry)?)
            }
            GeoJson::FeatureCollection(collection) => {
                if collection.features.is_empty() {
                    return Err(GeoError::InvalidGeometry(
                        "feature collection is empty".to_string(),
                    ));
                }
                let mut polygons: Vec<Polygon<f64>> = Vec::new();
                for feature in collection.features {
                    let geometry = feature.geometry.ok_or_else(|| {
                        GeoError::InvalidGeometry(
                            "feature collection member has no geometry".to_string(),
                        )
                    })?;
                    polygons.extend(multi_polygon_of(geometry)?.0);
                }
                Self::from_multi_polygon(unary_union(&polygons))
            }
        }
    }

    /// Parses a GeoJSON value (geometry, feature or feature collection).
    ///
    /// # Errors
    ///
    /// See [`BoundaryGeometry::from_geojson`]; also fails with
    /// [`GeoError::GeoJson`] when the value is not GeoJSON at all.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, GeoError> {
        Self::from_geojson(GeoJson::from_json_value(value)?)
    }

    /// Unions several geometries into one sampling domain.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidGeometry`] when `parts` is empty.
    pub fn union_of<'a, I>(parts: I) -> Result<Self, GeoError>
    where
        I: IntoIterator<Item = &'a BoundaryGeometry>,
    {
        let polygons: Vec<Polygon<f64>> = parts
            .into_iter()
            .flat_map(|part| part.shape.0.iter().cloned())
            .collect();
        if polygons.is_empty() {
            return Err(GeoError::InvalidGeometry(
                "cannot union an empty set of geometries".to_string(),
            ));
        }
        Self::from_multi_polygon(unary_union(&polygons))
    }

    #[must_use]
    pub fn bounding_box(&self) -> Rect<f64> {
        self.bbox
    }

    /// Planar area in the geometry's native (degree) units.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    #[must_use]
    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    #[must_use]
    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    /// Strict interior containment; points on the boundary are outside.
    #[must_use]
    pub fn contains(&self, point: &Point<f64>) -> bool {
        self.shape.contains(point)
    }

    /// True when `other` lies entirely within or on the boundary of `self`.
    #[must_use]
    pub fn covers(&self, other: &BoundaryGeometry) -> bool {
        let outer = self.bbox;
        let inner = other.bbox;
        if inner.min().x < outer.min().x
            || inner.min().y < outer.min().y
            || inner.max().x > outer.max().x
            || inner.max().y > outer.max().y
        {
            return false;
        }
        self.shape.relate(&other.shape).is_covers()
    }

    /// Stable identity of the exact coordinate sequence.
    ///
    /// SHA-256 over a little-endian binary encoding (polygon count, ring
    /// counts, coordinate counts, raw `f64` coordinates). Hex-encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(len_bytes(self.shape.0.len()));
        for polygon in &self.shape.0 {
            hasher.update(len_bytes(1 + polygon.interiors().len()));
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                hasher.update(len_bytes(ring.0.len()));
                for Coord { x, y } in &ring.0 {
                    hasher.update(x.to_le_bytes());
                    hasher.update(y.to_le_bytes());
                }
            }
        }
        format!("{:x}", hasher.finalize())
    }

    /// Renders as a GeoJSON geometry; a single-member shape is emitted as a
    /// `Polygon`.
    #[must_use]
    pub fn to_geojson(&self) -> geojson::Geometry {
        let value = match self.shape.0.as_slice() {
            [single] => geojson::Value::from(single),
            _ => geojson::Value::from(&self.shape),
        };
        geojson::Geometry::new(value)
    }
}

fn len_bytes(len: usize) -> [u8; 8] {
    (len as u64).to_le_bytes()
}

fn multi_polygon_of(geometry: geojson::Geometry) -> Result<MultiPolygon<f64>, GeoError> {
    let type_name = match &geometry.value {
        geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => None,
        geojson::Value::Point(_) => Some("Point"),
        geojson::Value::MultiPoint(_) => Some("MultiPoint"),
        geojson::Value::LineString(_) => Some("LineString"),
        geojson::Value::MultiLineString(_) => Some("MultiLineString"),
        geojson::Value::GeometryCollection(_) => Some("GeometryCollection"),
    };
    if let Some(type_name) = type_name {
        return Err(GeoError::InvalidGeometry(format!(
            "expected Polygon or MultiPolygon, got {type_name}"
        )));
    }

    match geo::Geometry::<f64>::try_from(geometry)? {
        geo::Geometry::Polygon(polygon) => Ok(MultiPolygon(vec![polygon])),
        geo::Geometry::MultiPolygon(multi) => Ok(multi),
        _ => Err(GeoError::InvalidGeometry(
            "expected Polygon or MultiPolygon".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(min_x: f64, min_y: f64, size: f64) -> serde_json::Value {
        let max_x = min_x + size;
        let max_y = min_y + size;
        json!({
            "type": "Polygon",
            "coordinates": [[
                [min_x, min_y], [max_x, min_y], [max_x, max_y], [min_x, max_y], [min_x, min_y]
            ]]
        })
    }

    fn square_geometry(min_x: f64, min_y: f64, size: f64) -> BoundaryGeometry {
        BoundaryGeometry::from_json_value(square(min_x, min_y, size)).expect("valid square")
    }

    #[test]
    fn unit_square_measurements() {
        let geom = square_geometry(0.0, 0.0, 1.0);
        let bbox = geom.bounding_box();
        assert_eq!(bbox.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bbox.max(), Coord { x: 1.0, y: 1.0 });
        assert!((geom.area() - 1.0).abs() < 1e-12);
        assert!((geom.centroid().x() - 0.5).abs() < 1e-12);
        assert!((geom.centroid().y() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn parses_feature_wrapper() {
        let feature = json!({
            "type": "Feature",
            "properties": {"display_name": "Somewhere"},
            "geometry": square(10.0, 20.0, 2.0)
        });
        let geom = BoundaryGeometry::from_json_value(feature).unwrap();
        assert!((geom.area() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn feature_collection_is_unioned() {
        let collection = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": square(0.0, 0.0, 1.0)},
                {"type": "Feature", "properties": {}, "geometry": square(0.5, 0.0, 1.0)}
            ]
        });
        let geom = BoundaryGeometry::from_json_value(collection).unwrap();
        // Overlapping halves count once.
        assert!((geom.area() - 1.5).abs() < 1e-9, "area was {}", geom.area());
        assert!(geom.contains(&Point::new(1.25, 0.5)));
    }

    #[test]
    fn rejects_non_polygon_geometry() {
        let point = json!({"type": "Point", "coordinates": [1.0, 2.0]});
        let err = BoundaryGeometry::from_json_value(point).unwrap_err();
        assert!(matches!(err, GeoError::InvalidGeometry(ref msg) if msg.contains("Point")));
    }

    #[test]
    fn rejects_empty_collection() {
        let collection = json!({"type": "FeatureCollection", "features": []});
        let err = BoundaryGeometry::from_json_value(collection).unwrap_err();
        assert!(matches!(err, GeoError::InvalidGeometry(_)));
    }

    #[test]
    fn rejects_non_geojson_value() {
        let err = BoundaryGeometry::from_json_value(json!({"hello": "world"})).unwrap_err();
        assert!(matches!(err, GeoError::GeoJson(_)));
    }

    #[test]
    fn contains_excludes_outside_points() {
        let geom = square_geometry(0.0, 0.0, 1.0);
        assert!(geom.contains(&Point::new(0.25, 0.75)));
        assert!(!geom.contains(&Point::new(1.5, 0.5)));
    }

    #[test]
    fn covers_interior_and_boundary_touching_shapes() {
        let outer = square_geometry(0.0, 0.0, 1.0);
        assert!(outer.covers(&square_geometry(0.25, 0.25, 0.5)));
        // Shares two edges with the outer square.
        assert!(outer.covers(&square_geometry(0.0, 0.0, 0.5)));
        assert!(outer.covers(&outer.clone()));
    }

    #[test]
    fn covers_rejects_partial_overlap() {
        let outer = square_geometry(0.0, 0.0, 1.0);
        assert!(!outer.covers(&square_geometry(0.75, 0.75, 0.5)));
        assert!(!outer.covers(&square_geometry(5.0, 5.0, 0.5)));
    }

    #[test]
    fn fingerprint_is_identity_of_coordinates() {
        let a = square_geometry(0.0, 0.0, 1.0);
        let b = square_geometry(0.0, 0.0, 1.0);
        let shifted = square_geometry(0.0, 0.0, 1.000_001);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), shifted.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn geojson_rendering_round_trips() {
        let geom = square_geometry(3.0, 4.0, 0.5);
        let rendered = geom.to_geojson();
        assert!(matches!(rendered.value, geojson::Value::Polygon(_)));
        let back = BoundaryGeometry::from_geojson(GeoJson::Geometry(rendered)).unwrap();
        assert_eq!(back, geom);
        assert_eq!(back.fingerprint(), geom.fingerprint());
    }

    #[test]
    fn union_of_disjoint_parts_keeps_both() {
        let parts = [square_geometry(0.0, 0.0, 1.0), square_geometry(5.0, 5.0, 1.0)];
        let union = BoundaryGeometry::union_of(&parts).unwrap();
        assert!((union.area() - 2.0).abs() < 1e-9);
        assert!(union.contains(&Point::new(5.5, 5.5)));
        assert!(union.contains(&Point::new(0.5, 0.5)));
    }

    #[test]
    fn union_of_nothing_fails() {
        let parts: Vec<BoundaryGeometry> = Vec::new();
        assert!(BoundaryGeometry::union_of(&parts).is_err());
    }
}

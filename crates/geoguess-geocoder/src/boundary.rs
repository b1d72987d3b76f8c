//! Full-area boundary lookup for a named place.

use geoguess_geo::BoundaryGeometry;

use crate::client::{NominatimClient, SearchRequest};
use crate::error::GeocoderError;
use crate::types::ResolvedBoundary;

/// Builds the free-text geocoder query: `"{city}, {country}"` when a
/// non-blank country is given, otherwise just the city.
///
/// # Errors
///
/// Returns [`GeocoderError::InvalidInput`] when `city` is blank.
pub fn build_place_query(city: &str, country: Option<&str>) -> Result<String, GeocoderError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(GeocoderError::InvalidInput(
            "city must be provided".to_string(),
        ));
    }
    match country.map(str::trim) {
        Some(country) if !country.is_empty() => Ok(format!("{city}, {country}")),
        _ => Ok(city.to_string()),
    }
}

impl NominatimClient {
    /// Resolves the best-ranked boundary polygon for a city.
    ///
    /// Issues exactly one search requesting a single polygon result.
    ///
    /// # Errors
    ///
    /// - [`GeocoderError::InvalidInput`] if `city` is blank.
    /// - [`GeocoderError::NotFound`] if the geocoder returns no results.
    /// - [`GeocoderError::NoGeometry`] if the top result has no polygon.
    /// - [`GeocoderError::Geometry`] if the polygon cannot be parsed.
    /// - [`GeocoderError::Http`] / [`GeocoderError::Deserialize`] on transport failure.
    pub async fn resolve_boundary(
        &self,
        city: &str,
        country: Option<&str>,
    ) -> Result<ResolvedBoundary, GeocoderError> {
        let query = build_place_query(city, country)?;
        let places = self.search(&SearchRequest::new(&query, 1)).await?;

        let Some(top) = places.into_iter().next() else {
            return Err(GeocoderError::NotFound { query });
        };
        if !top.has_polygon() {
            return Err(GeocoderError::NoGeometry { query });
        }

        let metadata = top.metadata();
        let Some(raw) = top.geojson else {
            return Err(GeocoderError::NoGeometry { query });
        };
        let geometry = BoundaryGeometry::from_json_value(raw)?;

        tracing::debug!(
            query = %query,
            display_name = ?metadata.display_name,
            area = geometry.area(),
            "resolved boundary"
        );

        Ok(ResolvedBoundary {
            query,
            geometry,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_without_country_is_city_only() {
        assert_eq!(build_place_query("Shanghai", None).unwrap(), "Shanghai");
        assert_eq!(build_place_query(" Shanghai ", Some(" ")).unwrap(), "Shanghai");
    }

    #[test]
    fn query_with_country_is_comma_joined() {
        assert_eq!(
            build_place_query("Paris", Some("France")).unwrap(),
            "Paris, France"
        );
    }

    #[test]
    fn blank_city_is_rejected() {
        let err = build_place_query("   ", Some("FR")).unwrap_err();
        assert!(matches!(err, GeocoderError::InvalidInput(_)));
    }
}

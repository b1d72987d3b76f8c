use geoguess_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("no point accepted after {attempts} sampling attempts")]
    SamplingExhausted { attempts: usize },

    #[error("center bias must be a positive finite number, got {0}")]
    InvalidCenterBias(f64),
}

impl GeoError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            GeoError::InvalidGeometry(_) | GeoError::GeoJson(_) => ErrorKind::InvalidGeometry,
            GeoError::SamplingExhausted { .. } => ErrorKind::SamplingExhausted,
            GeoError::InvalidCenterBias(_) => ErrorKind::InvalidInput,
        }
    }
}

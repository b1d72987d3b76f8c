//! Geometry adapter and point sampling over place boundaries.

pub mod error;
pub mod geometry;
pub mod sampler;

pub use error::GeoError;
pub use geometry::BoundaryGeometry;
pub use sampler::{
    global_random_point, sample_point, sample_points, PointSource, RandomPointSource,
    SampleOptions, SampledPoint, DEFAULT_MAX_SAMPLE_ATTEMPTS,
};

//! Rejection sampling of points inside a boundary geometry.
//!
//! Candidates are drawn uniformly from the geometry's bounding box and
//! rejected until one lands inside the shape. An optional center bias adds a
//! Gaussian-kernel soft rejection around the centroid.

use geo::{Coord, Point, Rect};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GeoError;
use crate::geometry::BoundaryGeometry;

pub const DEFAULT_MAX_SAMPLE_ATTEMPTS: usize = 10_000;

/// A sampled geographic point. Always (latitude, longitude), i.e. (y, x).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampledPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl SampledPoint {
    #[must_use]
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleOptions {
    pub max_attempts: usize,
    /// Kernel width as a fraction of the larger bounding-box side. Smaller
    /// values concentrate samples near the centroid.
    pub center_bias: Option<f64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_SAMPLE_ATTEMPTS,
            center_bias: None,
        }
    }
}

/// Source of candidate coordinates and acceptance draws.
pub trait PointSource {
    /// A candidate coordinate inside (or on the edge of) `bounds`.
    fn point_in(&mut self, bounds: &Rect<f64>) -> Coord<f64>;

    /// A uniform draw in `[0, 1)`.
    fn unit(&mut self) -> f64;
}

/// [`PointSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomPointSource<R> {
    rng: R,
}

impl<R: Rng> RandomPointSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPointSource<StdRng> {
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PointSource for RandomPointSource<R> {
    fn point_in(&mut self, bounds: &Rect<f64>) -> Coord<f64> {
        let min = bounds.min();
        let max = bounds.max();
        Coord {
            x: self.rng.random_range(min.x..=max.x),
            y: self.rng.random_range(min.y..=max.y),
        }
    }

    fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Draws one point inside `geometry`.
///
/// # Errors
///
/// - [`GeoError::InvalidCenterBias`] if `center_bias` is not a positive finite number.
/// - [`GeoError::SamplingExhausted`] if no candidate is accepted within
///   `max_attempts` draws.
pub fn sample_point<S: PointSource>(
    geometry: &BoundaryGeometry,
    options: &SampleOptions,
    source: &mut S,
) -> Result<SampledPoint, GeoError> {
    let bounds = geometry.bounding_box();

    let kernel = match options.center_bias {
        Some(bias) if !(bias.is_finite() && bias > 0.0) => {
            return Err(GeoError::InvalidCenterBias(bias));
        }
        Some(bias) => {
            let scale = bounds.width().max(bounds.height());
            Some((geometry.centroid(), bias * scale))
        }
        None => None,
    };

    for _ in 0..options.max_attempts {
        let candidate = source.point_in(&bounds);
        let point = Point::from(candidate);
        if !geometry.contains(&point) {
            continue;
        }

        if let Some((centroid, sigma)) = kernel {
            if sigma > 0.0 {
                let dx = point.x() - centroid.x();
                let dy = point.y() - centroid.y();
                let d = dx.hypot(dy);
                let weight = (-(d / sigma).powi(2) / 2.0).exp();
                if source.unit() >= weight {
                    continue;
                }
            }
        }

        return Ok(SampledPoint {
            latitude: candidate.y,
            longitude: candidate.x,
        });
    }

    tracing::debug!(
        attempts = options.max_attempts,
        center_bias = ?options.center_bias,
        "rejection sampling exhausted"
    );
    Err(GeoError::SamplingExhausted {
        attempts: options.max_attempts,
    })
}

/// Draws `count` independent points inside `geometry`.
///
/// # Errors
///
/// Fails on the first draw that fails; see [`sample_point`].
pub fn sample_points<S: PointSource>(
    geometry: &BoundaryGeometry,
    count: usize,
    options: &SampleOptions,
    source: &mut S,
) -> Result<Vec<SampledPoint>, GeoError> {
    (0..count)
        .map(|_| sample_point(geometry, options, source))
        .collect()
}

/// Uniform point on the sphere, used when no area constrains the search.
pub fn global_random_point<S: PointSource>(source: &mut S) -> SampledPoint {
    let z = 2.0 * source.unit() - 1.0;
    SampledPoint {
        latitude: z.asin().to_degrees(),
        longitude: 360.0 * source.unit() - 180.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Always proposes the same coordinate and accepts every kernel draw.
    struct FixedPointSource {
        coord: Coord<f64>,
    }

    impl PointSource for FixedPointSource {
        fn point_in(&mut self, _bounds: &Rect<f64>) -> Coord<f64> {
            self.coord
        }

        fn unit(&mut self) -> f64 {
            0.0
        }
    }

    fn unit_square() -> BoundaryGeometry {
        BoundaryGeometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        }))
        .unwrap()
    }

    fn l_shape() -> BoundaryGeometry {
        BoundaryGeometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[
                [0.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 2.0], [0.0, 2.0], [0.0, 0.0]
            ]]
        }))
        .unwrap()
    }

    fn mean_distance_to_centroid(bias: f64, seed: u64) -> f64 {
        let geom = unit_square();
        let centroid = geom.centroid();
        let mut source = RandomPointSource::seeded(seed);
        let options = SampleOptions {
            center_bias: Some(bias),
            ..SampleOptions::default()
        };
        let n = 2_000;
        let total: f64 = (0..n)
            .map(|_| {
                let p = sample_point(&geom, &options, &mut source).unwrap();
                (p.longitude - centroid.x()).hypot(p.latitude - centroid.y())
            })
            .sum();
        total / f64::from(n)
    }

    #[test]
    fn samples_always_land_inside_concave_shape() {
        let geom = l_shape();
        let mut source = RandomPointSource::seeded(7);
        let points = sample_points(&geom, 500, &SampleOptions::default(), &mut source).unwrap();
        assert_eq!(points.len(), 500);
        for p in points {
            assert!(geom.contains(&p.to_point()), "{p:?} escaped the L shape");
        }
    }

    #[test]
    fn returns_latitude_then_longitude() {
        let geom = BoundaryGeometry::from_json_value(json!({
            "type": "Polygon",
            "coordinates": [[[100.0, 10.0], [101.0, 10.0], [101.0, 11.0], [100.0, 11.0], [100.0, 10.0]]]
        }))
        .unwrap();
        let mut source = RandomPointSource::seeded(1);
        let p = sample_point(&geom, &SampleOptions::default(), &mut source).unwrap();
        assert!((10.0..=11.0).contains(&p.latitude));
        assert!((100.0..=101.0).contains(&p.longitude));
    }

    #[test]
    fn always_outside_source_exhausts_budget() {
        let geom = unit_square();
        let mut source = FixedPointSource {
            coord: Coord { x: 5.0, y: 5.0 },
        };
        let options = SampleOptions {
            max_attempts: 1,
            center_bias: None,
        };
        let err = sample_point(&geom, &options, &mut source).unwrap_err();
        assert!(matches!(err, GeoError::SamplingExhausted { attempts: 1 }));
    }

    #[test]
    fn fixed_inside_point_is_returned_verbatim() {
        let geom = unit_square();
        let mut source = FixedPointSource {
            coord: Coord { x: 0.2, y: 0.7 },
        };
        let p = sample_point(&geom, &SampleOptions::default(), &mut source).unwrap();
        assert_eq!(
            p,
            SampledPoint {
                latitude: 0.7,
                longitude: 0.2
            }
        );
    }

    #[test]
    fn stronger_center_bias_pulls_samples_inward() {
        let tight = mean_distance_to_centroid(0.1, 42);
        let loose = mean_distance_to_centroid(1.0, 42);
        assert!(
            tight < loose,
            "expected tighter bias to reduce mean distance: tight={tight}, loose={loose}"
        );
    }

    #[test]
    fn rejects_non_positive_center_bias() {
        let geom = unit_square();
        let mut source = RandomPointSource::seeded(3);
        let options = SampleOptions {
            center_bias: Some(0.0),
            ..SampleOptions::default()
        };
        let err = sample_point(&geom, &options, &mut source).unwrap_err();
        assert!(matches!(err, GeoError::InvalidCenterBias(_)));
    }

    #[test]
    fn global_points_stay_in_range() {
        let mut source = RandomPointSource::seeded(99);
        for _ in 0..1_000 {
            let p = global_random_point(&mut source);
            assert!((-90.0..=90.0).contains(&p.latitude));
            assert!((-180.0..=180.0).contains(&p.longitude));
        }
    }
}

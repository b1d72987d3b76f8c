//! One-shot lookup commands. Results go to stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use geoguess_core::AppConfig;
use geoguess_geo::{
    global_random_point, sample_points, BoundaryGeometry, RandomPointSource, SampleOptions,
};
use geoguess_geocoder::{AreaResolver, CandidateArea};
use geoguess_streetview::{find_coverage, CoverageOptions, StreetViewClient};

use crate::AreaArgs;

pub(crate) async fn run_boundary(
    config: &AppConfig,
    city: &str,
    country: Option<&str>,
) -> anyhow::Result<()> {
    let resolver = AreaResolver::from_app_config(config)?;
    let boundary = resolver.resolve_boundary(city, country).await?;
    println!("{}", serde_json::to_string_pretty(&boundary.to_feature())?);
    Ok(())
}

pub(crate) async fn run_areas(
    config: &AppConfig,
    city: &str,
    country: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let resolver = AreaResolver::from_app_config(config)?;
    let entry = resolver.sub_areas(city, country).await?;

    if json {
        let collection = geojson::FeatureCollection {
            bbox: None,
            features: entry.areas.iter().map(CandidateArea::to_feature).collect(),
            foreign_members: None,
        };
        println!("{}", serde_json::to_string_pretty(&collection)?);
        return Ok(());
    }

    println!("{} ({} sub-areas)", entry.place_key, entry.areas.len());
    for (rank, area) in entry.areas.iter().enumerate() {
        println!("{}", area_row(rank + 1, area));
    }
    if let Some(path) = &entry.source_file {
        println!("cache: {}", path.display());
    }
    Ok(())
}

/// One ranked line of the `areas` listing; unnamed areas show `-`.
pub(crate) fn area_row(rank: usize, area: &CandidateArea) -> String {
    format!(
        "{:>3}. {:<12.6} [{}] {}",
        rank,
        area.area,
        area.provenance.matched_keyword,
        area.provenance.display_name.as_deref().unwrap_or("-"),
    )
}

pub(crate) async fn run_sample(
    config: &AppConfig,
    area: &AreaArgs,
    count: usize,
    center_bias: Option<f64>,
) -> anyhow::Result<()> {
    let domain = load_domain(config, area).await?;
    let mut source = RandomPointSource::from_os_rng();
    let points = match domain {
        Some(domain) => {
            let options = SampleOptions {
                center_bias,
                ..SampleOptions::default()
            };
            sample_points(&domain, count, &options, &mut source)?
        }
        None => (0..count)
            .map(|_| global_random_point(&mut source))
            .collect(),
    };
    for p in points {
        println!("{},{}", p.latitude, p.longitude);
    }
    Ok(())
}

pub(crate) async fn run_streetview(
    config: &AppConfig,
    area: &AreaArgs,
    options: &CoverageOptions,
) -> anyhow::Result<()> {
    let client = StreetViewClient::with_endpoint(
        &config.streetview_metadata_url,
        config.google_maps_api_key.clone(),
        &config.user_agent,
        config.streetview_timeout_secs,
    )?;
    let domain = load_domain(config, area).await?;
    let source = RandomPointSource::from_os_rng();
    let result = find_coverage(&client, domain, options, source).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Inline file first, then city, else `None` for the whole globe.
async fn load_domain(
    config: &AppConfig,
    area: &AreaArgs,
) -> anyhow::Result<Option<Arc<BoundaryGeometry>>> {
    if let Some(path) = &area.geojson {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        return Ok(Some(Arc::new(BoundaryGeometry::from_json_value(value)?)));
    }
    match &area.city {
        Some(city) => {
            let resolver = AreaResolver::from_app_config(config)?;
            Ok(Some(
                resolver
                    .sampling_domain(city, area.country.as_deref())
                    .await?,
            ))
        }
        None => Ok(None),
    }
}

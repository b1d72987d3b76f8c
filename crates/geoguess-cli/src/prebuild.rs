//! Batch sub-area discovery for a list of cities.
//!
//! Cities run with bounded concurrency, each after a short random delay.
//! A failing city is reported and counted but does not stop the batch; the
//! command fails at the end if any city failed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use geoguess_core::AppConfig;
use geoguess_geocoder::{AreaResolver, GeocoderError};
use rand::Rng;

const CITY_JITTER_MS: std::ops::RangeInclusive<u64> = 50..=200;

#[derive(Debug)]
pub(crate) struct PrebuildRequest {
    pub cities: Vec<String>,
    pub file: Option<PathBuf>,
    pub country: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub concurrency: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CityTarget {
    pub city: String,
    pub country: Option<String>,
}

impl std::fmt::Display for CityTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{}, {country}", self.city),
            None => f.write_str(&self.city),
        }
    }
}

/// Parses `"City"` or `"City, Country"`. The last comma separates the
/// country; `default_country` applies when none is named.
pub(crate) fn parse_city_line(line: &str, default_country: Option<&str>) -> Option<CityTarget> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let fallback = default_country
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToOwned::to_owned);
    match line.rsplit_once(',') {
        Some((city, country)) if !city.trim().is_empty() && !country.trim().is_empty() => {
            Some(CityTarget {
                city: city.trim().to_owned(),
                country: Some(country.trim().to_owned()),
            })
        }
        _ => Some(CityTarget {
            city: line.trim_matches(',').trim().to_owned(),
            country: fallback,
        }),
    }
}

/// Command-line cities first, then file entries, without duplicates.
pub(crate) fn collect_targets(
    cities: &[String],
    file: Option<&Path>,
    default_country: Option<&str>,
) -> anyhow::Result<Vec<CityTarget>> {
    let mut lines: Vec<String> = cities.to_vec();
    if let Some(path) = file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading city list {}", path.display()))?;
        lines.extend(text.lines().map(ToOwned::to_owned));
    }

    let mut targets: Vec<CityTarget> = Vec::new();
    for line in &lines {
        if let Some(target) = parse_city_line(line, default_country) {
            if !targets.contains(&target) {
                targets.push(target);
            }
        }
    }
    Ok(targets)
}

fn city_jitter() -> Duration {
    Duration::from_millis(rand::rng().random_range(CITY_JITTER_MS))
}

async fn process_city(
    resolver: &AreaResolver,
    target: &CityTarget,
) -> Result<usize, GeocoderError> {
    tokio::time::sleep(city_jitter()).await;
    let entry = resolver
        .sub_areas(&target.city, target.country.as_deref())
        .await?;
    Ok(entry.areas.len())
}

pub(crate) async fn run_prebuild(
    mut config: AppConfig,
    request: PrebuildRequest,
) -> anyhow::Result<()> {
    let cache_dir = request
        .cache_dir
        .or_else(|| config.cache_dir.clone())
        .context("no cache directory: pass --cache-dir or set GEOGUESS_CACHE_DIR")?;
    config.cache_dir = Some(cache_dir.clone());

    let mut targets = collect_targets(
        &request.cities,
        request.file.as_deref(),
        request.country.as_deref(),
    )?;
    if let Some(limit) = request.limit {
        targets.truncate(limit);
    }
    if targets.is_empty() {
        anyhow::bail!("no cities to process; pass city names or --file");
    }

    let resolver = AreaResolver::from_app_config(&config)?;
    tracing::info!(
        cities = targets.len(),
        cache_dir = %cache_dir.display(),
        concurrency = request.concurrency,
        "starting sub-area prebuild"
    );

    let results: Vec<(&CityTarget, Result<usize, GeocoderError>)> = stream::iter(&targets)
        .map(|target| {
            let fut = process_city(&resolver, target);
            async move { (target, fut.await) }
        })
        .buffer_unordered(request.concurrency.max(1))
        .collect()
        .await;

    let mut succeeded = 0usize;
    let mut failed = 0usize;
    for (target, outcome) in &results {
        match outcome {
            Ok(count) => {
                succeeded += 1;
                tracing::info!(city = %target, areas = count, "cached sub-areas");
            }
            Err(e) => {
                failed += 1;
                tracing::error!(city = %target, error = %e, code = e.kind().code(), "prebuild failed");
            }
        }
    }

    println!("prebuild done: succeeded={succeeded} failed={failed}");
    if failed > 0 {
        anyhow::bail!("{failed} of {} cities failed", results.len());
    }
    Ok(())
}

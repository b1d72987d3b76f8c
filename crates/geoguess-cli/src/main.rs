mod lookup;
mod prebuild;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geoguess-cli")]
#[command(about = "City boundaries, sub-area discovery and Street View sampling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the boundary of a city as a GeoJSON feature
    Boundary {
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: Option<String>,
    },
    /// Discover (or load from cache) the ranked sub-areas of a city
    Areas {
        #[arg(long)]
        city: String,
        #[arg(long)]
        country: Option<String>,
        /// Print the full feature collection instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Sample random points inside a city or a GeoJSON file
    Sample {
        #[command(flatten)]
        area: AreaArgs,
        #[arg(long, default_value = "1")]
        count: usize,
        /// Gaussian kernel width relative to the area's larger side
        #[arg(long)]
        center_bias: Option<f64>,
    },
    /// Find a random location with Street View coverage
    Streetview {
        #[command(flatten)]
        area: AreaArgs,
        #[arg(long, default_value = "10")]
        max_attempts: usize,
        /// Search radius in meters; derived from the area when omitted
        #[arg(long)]
        radius: Option<u32>,
        /// Include user-contributed panoramas
        #[arg(long)]
        all_panorama: bool,
        /// Accept imagery without a capture date
        #[arg(long)]
        no_optimise: bool,
        #[arg(long)]
        center_bias: Option<f64>,
    },
    /// Discover and persist sub-areas for a list of cities
    Prebuild {
        /// Cities to process, e.g. "Lyon" or "Lyon, France"
        cities: Vec<String>,
        /// Newline-delimited city list; `#` starts a comment
        #[arg(long)]
        file: Option<PathBuf>,
        /// Country applied to cities that do not name one
        #[arg(long)]
        country: Option<String>,
        /// Overrides `GEOGUESS_CACHE_DIR`
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Cities processed in parallel
        #[arg(long, default_value = "2")]
        concurrency: usize,
        /// Process at most this many cities
        #[arg(long)]
        limit: Option<usize>,
    },
}

/// Where to sample from: a city, a GeoJSON file, or the whole globe.
#[derive(Debug, clap::Args)]
struct AreaArgs {
    #[arg(long, conflicts_with = "geojson")]
    city: Option<String>,
    #[arg(long, requires = "city")]
    country: Option<String>,
    /// GeoJSON geometry, feature or feature collection
    #[arg(long)]
    geojson: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = geoguess_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Boundary { city, country } => {
            lookup::run_boundary(&config, &city, country.as_deref()).await
        }
        Commands::Areas {
            city,
            country,
            json,
        } => lookup::run_areas(&config, &city, country.as_deref(), json).await,
        Commands::Sample {
            area,
            count,
            center_bias,
        } => lookup::run_sample(&config, &area, count, center_bias).await,
        Commands::Streetview {
            area,
            max_attempts,
            radius,
            all_panorama,
            no_optimise,
            center_bias,
        } => {
            let options = geoguess_streetview::CoverageOptions {
                max_attempts,
                radius,
                all_panorama,
                optimise: !no_optimise,
                sample: geoguess_geo::SampleOptions {
                    center_bias,
                    ..geoguess_geo::SampleOptions::default()
                },
            };
            lookup::run_streetview(&config, &area, &options).await
        }
        Commands::Prebuild {
            cities,
            file,
            country,
            cache_dir,
            concurrency,
            limit,
        } => {
            let request = prebuild::PrebuildRequest {
                cities,
                file,
                country,
                cache_dir,
                concurrency,
                limit,
            };
            prebuild::run_prebuild(config, request).await
        }
    }
}

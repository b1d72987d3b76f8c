use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";
const DEFAULT_STREETVIEW_METADATA_URL: &str =
    "https://maps.googleapis.com/maps/api/streetview/metadata";
const DEFAULT_USER_AGENT: &str = "geoguess/0.1 (street-view-sampler)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("GEOGUESS_ENV", "development"))?;

    let bind_addr = or_default("GEOGUESS_BIND_ADDR", "0.0.0.0:8001")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("GEOGUESS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("GEOGUESS_LOG_LEVEL", "info");

    let google_maps_api_key = optional("GOOGLE_MAPS_API_KEY");
    let nominatim_base_url = or_default("NOMINATIM_BASE_URL", DEFAULT_NOMINATIM_BASE_URL);
    let streetview_metadata_url =
        or_default("STREETVIEW_METADATA_URL", DEFAULT_STREETVIEW_METADATA_URL);
    let user_agent = or_default("GEOGUESS_USER_AGENT", DEFAULT_USER_AGENT);
    let cache_dir = optional("GEOGUESS_CACHE_DIR").map(PathBuf::from);

    let geocoder_timeout_secs = parse_u64("GEOGUESS_GEOCODER_TIMEOUT_SECS", "20")?;
    let discovery_timeout_secs = parse_u64("GEOGUESS_DISCOVERY_TIMEOUT_SECS", "30")?;
    let streetview_timeout_secs = parse_u64("GEOGUESS_STREETVIEW_TIMEOUT_SECS", "60")?;

    let discovery_concurrency = parse_usize("GEOGUESS_DISCOVERY_CONCURRENCY", "10")?;
    if discovery_concurrency == 0 {
        return Err(invalid(
            "GEOGUESS_DISCOVERY_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }

    let discovery_jitter_min_ms = parse_u64("GEOGUESS_DISCOVERY_JITTER_MIN_MS", "50")?;
    let discovery_jitter_max_ms = parse_u64("GEOGUESS_DISCOVERY_JITTER_MAX_MS", "200")?;
    if discovery_jitter_min_ms > discovery_jitter_max_ms {
        return Err(invalid(
            "GEOGUESS_DISCOVERY_JITTER_MAX_MS",
            format!("must be >= GEOGUESS_DISCOVERY_JITTER_MIN_MS ({discovery_jitter_min_ms})"),
        ));
    }

    let discovery_result_limit = parse_u32("GEOGUESS_DISCOVERY_RESULT_LIMIT", "50")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        google_maps_api_key,
        nominatim_base_url,
        streetview_metadata_url,
        user_agent,
        cache_dir,
        geocoder_timeout_secs,
        discovery_timeout_secs,
        streetview_timeout_secs,
        discovery_concurrency,
        discovery_jitter_min_ms,
        discovery_jitter_max_ms,
        discovery_result_limit,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GEOGUESS_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_SEARCH_BASE_URL: &str = "https://map.naver.com";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is present but cannot be parsed.
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
/// Returns `ConfigError` if a variable is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let log_level = or_default("GEOSWEEP_LOG_LEVEL", "info");
    let regions_path = PathBuf::from(or_default(
        "GEOSWEEP_REGIONS_PATH",
        "./config/regions.yaml",
    ));

    let search_base_url = or_default("GEOSWEEP_SEARCH_BASE_URL", DEFAULT_SEARCH_BASE_URL);
    if !(search_base_url.starts_with("http://") || search_base_url.starts_with("https://")) {
        return Err(invalid(
            "GEOSWEEP_SEARCH_BASE_URL",
            format!("expected an http(s) URL, got \"{search_base_url}\""),
        ));
    }
    let search_user_agent = or_default("GEOSWEEP_USER_AGENT", DEFAULT_USER_AGENT);
    let search_request_timeout_secs = parse_u64("GEOSWEEP_REQUEST_TIMEOUT_SECS", "30")?;
    let search_inter_request_delay_ms = parse_u64("GEOSWEEP_INTER_REQUEST_DELAY_MS", "500")?;
    let search_max_retries = parse_u32("GEOSWEEP_MAX_RETRIES", "2")?;
    let search_retry_backoff_base_ms = parse_u64("GEOSWEEP_RETRY_BACKOFF_BASE_MS", "1000")?;

    let survey_page_limit = parse_u32("GEOSWEEP_PAGE_LIMIT", "20")?;
    if survey_page_limit == 0 {
        return Err(invalid("GEOSWEEP_PAGE_LIMIT", "must be at least 1".into()));
    }
    let survey_max_concurrent_tiles = parse_usize("GEOSWEEP_MAX_CONCURRENT_TILES", "1")?;
    if survey_max_concurrent_tiles == 0 {
        return Err(invalid(
            "GEOSWEEP_MAX_CONCURRENT_TILES",
            "must be at least 1".into(),
        ));
    }

    Ok(AppConfig {
        log_level,
        regions_path,
        search_base_url,
        search_user_agent,
        search_request_timeout_secs,
        search_inter_request_delay_ms,
        search_max_retries,
        search_retry_backoff_base_ms,
        survey_page_limit,
        survey_max_concurrent_tiles,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

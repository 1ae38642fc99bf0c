use thiserror::Error;

use crate::app_config::{AppConfig, Environment};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so tests can drive it with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_margin = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() || value < 1.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("margin multiplier must be a finite value >= 1.0, got {raw}"),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("TIENDA_ENV", "development"));
    let log_level = or_default("TIENDA_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("TIENDA_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TIENDA_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("TIENDA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let margin_multiplier = parse_margin("TIENDA_MARGIN_MULTIPLIER", "1.5")?;
    let other_costs_cents = parse_i64("TIENDA_OTHER_COSTS_CENTS", "0")?;
    let default_supplier = or_default("TIENDA_DEFAULT_SUPPLIER", "cj").to_lowercase();
    let target_country = or_default("TIENDA_TARGET_COUNTRY", "US").to_uppercase();
    let storefront_lang = or_default("TIENDA_STOREFRONT_LANG", "es");
    let search_lang = or_default("TIENDA_SEARCH_LANG", "en");

    let cj_api_key = lookup("CJD_API_KEY").ok().filter(|v| !v.is_empty());
    let rapidapi_key = lookup("RAPIDAPI_KEY").ok().filter(|v| !v.is_empty());
    let rapidapi_host = or_default("RAPIDAPI_HOST", "aliexpress-product1.p.rapidapi.com");
    let translate_endpoint = lookup("TIENDA_TRANSLATE_ENDPOINT")
        .ok()
        .filter(|v| !v.is_empty());

    let http_timeout_secs = parse_u64("TIENDA_HTTP_TIMEOUT_SECS", "30")?;
    let detail_timeout_secs = parse_u64("TIENDA_DETAIL_TIMEOUT_SECS", "60")?;
    let detail_max_retries = parse_u32("TIENDA_DETAIL_MAX_RETRIES", "2")?;
    let detail_retry_delay_ms = parse_u64("TIENDA_DETAIL_RETRY_DELAY_MS", "2000")?;
    let scraper_user_agent = or_default(
        "TIENDA_SCRAPER_USER_AGENT",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );
    let scraper_page_timeout_secs = parse_u64("TIENDA_SCRAPER_PAGE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        database_url,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        margin_multiplier,
        other_costs_cents,
        default_supplier,
        target_country,
        storefront_lang,
        search_lang,
        cj_api_key,
        rapidapi_key,
        rapidapi_host,
        translate_endpoint,
        http_timeout_secs,
        detail_timeout_secs,
        detail_max_retries,
        detail_retry_delay_ms,
        scraper_user_agent,
        scraper_page_timeout_secs,
    })
}

fn parse_environment(raw: &str) -> Environment {
    match raw.to_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

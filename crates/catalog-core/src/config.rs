use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation live here, decoupled from the process environment,
/// so tests can drive it with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("CATALOG_ENV", "development"))?;

    let jwt_secret = lookup("CATALOG_JWT_SECRET")
        .ok()
        .filter(|s| !s.trim().is_empty());
    if jwt_secret.is_none() && env != Environment::Development {
        return Err(ConfigError::MissingEnvVar("CATALOG_JWT_SECRET".to_string()));
    }
    let jwt_expires_in_secs = parse_duration_secs(&or_default("CATALOG_JWT_EXPIRES_IN", "7d"))
        .map_err(|reason| ConfigError::InvalidEnvVar {
            var: "CATALOG_JWT_EXPIRES_IN".to_string(),
            reason,
        })?;

    let bind_addr: SocketAddr = parse_as(
        "CATALOG_BIND_ADDR",
        &or_default("CATALOG_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("CATALOG_LOG_LEVEL", "info");

    let db_max_connections: u32 = parse_as(
        "CATALOG_DB_MAX_CONNECTIONS",
        &or_default("CATALOG_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "CATALOG_DB_MIN_CONNECTIONS",
        &or_default("CATALOG_DB_MIN_CONNECTIONS", "1"),
    )?;
    if db_min_connections > db_max_connections {
        return Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_DB_MIN_CONNECTIONS".to_string(),
            reason: format!(
                "must not exceed CATALOG_DB_MAX_CONNECTIONS ({db_max_connections})"
            ),
        });
    }
    let db_acquire_timeout_secs: u64 = parse_as(
        "CATALOG_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("CATALOG_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    let rate_limit_max_requests: usize = parse_as(
        "CATALOG_RATE_LIMIT_MAX_REQUESTS",
        &or_default("CATALOG_RATE_LIMIT_MAX_REQUESTS", "120"),
    )?;
    let rate_limit_window_secs: u64 = parse_as(
        "CATALOG_RATE_LIMIT_WINDOW_SECS",
        &or_default("CATALOG_RATE_LIMIT_WINDOW_SECS", "60"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        jwt_secret,
        jwt_expires_in_secs,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CATALOG_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

/// Parses token lifetimes such as `"7d"`, `"12h"`, `"30m"`, `"45s"`, or a bare
/// number of seconds.
fn parse_duration_secs(raw: &str) -> Result<u64, String> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd')) => (&raw[..idx], 24 * 60 * 60),
        Some(_) => (raw, 1),
        None => return Err("duration must not be empty".to_string()),
    };

    let value = digits
        .parse::<u64>()
        .map_err(|e| format!("invalid duration '{raw}': {e}"))?;
    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }
    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("duration '{raw}' is too large"))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

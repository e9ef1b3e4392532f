use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files, which is useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a working
/// config pointed at books.toscrape.com and `./data/books_data.db`.
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

    let env = parse_environment(&or_default("SHELFDB_ENV", "development"))?;
    let log_level = or_default("SHELFDB_LOG_LEVEL", "info");

    let db_path = PathBuf::from(or_default("SHELFDB_DB_PATH", "./data/books_data.db"));
    let db_max_connections = parse_u32("SHELFDB_DB_MAX_CONNECTIONS", "4")?;
    let db_acquire_timeout_secs = parse_u64("SHELFDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let page_url_template = or_default(
        "SHELFDB_PAGE_URL_TEMPLATE",
        "https://books.toscrape.com/catalogue/page-{}.html",
    );
    let image_base_url = or_default(
        "SHELFDB_IMAGE_BASE_URL",
        "https://books.toscrape.com/catalogue/",
    );
    let pages = parse_u32("SHELFDB_PAGES", "5")?;

    let scraper_request_timeout_secs = parse_u64("SHELFDB_SCRAPER_REQUEST_TIMEOUT_SECS", "10")?;
    let scraper_user_agent = or_default("SHELFDB_SCRAPER_USER_AGENT", "shelfdb/0.1 (catalog-etl)");
    let scraper_max_concurrent_pages = parse_usize("SHELFDB_SCRAPER_MAX_CONCURRENT_PAGES", "1")?;
    let scraper_inter_run_delay_ms = parse_u64("SHELFDB_SCRAPER_INTER_RUN_DELAY_MS", "1000")?;
    let scraper_max_retries = parse_u32("SHELFDB_SCRAPER_MAX_RETRIES", "0")?;
    let scraper_retry_backoff_base_secs = parse_u64("SHELFDB_SCRAPER_RETRY_BACKOFF_BASE_SECS", "1")?;

    if db_max_connections == 0 {
        return Err(invalid("SHELFDB_DB_MAX_CONNECTIONS", "must be at least 1".into()));
    }
    if pages == 0 {
        return Err(invalid("SHELFDB_PAGES", "must be at least 1".into()));
    }
    if scraper_request_timeout_secs == 0 {
        return Err(invalid(
            "SHELFDB_SCRAPER_REQUEST_TIMEOUT_SECS",
            "must be at least 1".into(),
        ));
    }
    if scraper_max_concurrent_pages == 0 {
        return Err(invalid(
            "SHELFDB_SCRAPER_MAX_CONCURRENT_PAGES",
            "must be at least 1".into(),
        ));
    }
    if !page_url_template.contains("{}") {
        return Err(invalid(
            "SHELFDB_PAGE_URL_TEMPLATE",
            "must contain a {} placeholder for the page number".into(),
        ));
    }

    Ok(AppConfig {
        env,
        log_level,
        db_path,
        db_max_connections,
        db_acquire_timeout_secs,
        page_url_template,
        image_base_url,
        pages,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_concurrent_pages,
        scraper_inter_run_delay_ms,
        scraper_max_retries,
        scraper_retry_backoff_base_secs,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SHELFDB_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

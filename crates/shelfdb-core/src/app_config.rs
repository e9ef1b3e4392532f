use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// SQLite database file holding the `books_data` table.
    pub db_path: PathBuf,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Catalog page URL with a `{}` placeholder for the page number.
    pub page_url_template: String,
    /// Base URL that page-relative image paths are resolved against.
    pub image_base_url: String,
    /// Number of catalog pages a run fetches when the CLI does not override it.
    pub pages: u32,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_concurrent_pages: usize,
    /// Pause after the page loop, before the run continues.
    pub scraper_inter_run_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
}

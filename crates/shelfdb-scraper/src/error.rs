use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },

    #[error("invalid page URL for page {page}: {reason}")]
    InvalidPageUrl { page: u32, reason: String },

    #[error("invalid image base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// A catalog page that could not be retrieved. Carries the page number so
/// the orchestrator can report it and move on to the next page.
#[derive(Debug, Error)]
#[error("failed to fetch page {page}: {source}")]
pub struct FetchFailure {
    pub page: u32,
    #[source]
    pub source: ScraperError,
}

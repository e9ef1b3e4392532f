use std::time::Duration;

use reqwest::Client;
use shelfdb_core::AppConfig;

use crate::error::{FetchFailure, ScraperError};
use crate::rate_limit::retry_with_backoff;

/// Placeholder in the page template that is replaced with the page number.
const PAGE_PLACEHOLDER: &str = "{}";

/// Markup of one catalog page as returned by the source.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// 1-based page number.
    pub page: u32,
    /// URL the page was fetched from.
    pub url: String,
    /// Response body, never empty.
    pub body: String,
}

impl RawPage {
    /// Size of the response body in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.body.len()
    }
}

/// HTTP client for the paginated catalog.
///
/// Every page URL is produced from a fixed template with a single `{}`
/// placeholder. Transport errors, non-2xx responses and empty bodies come
/// back as a [`FetchFailure`] naming the page; nothing here is fatal to a run.
///
/// A single fetch has no side effects beyond the GET itself, so transient
/// failures can be retried: with `max_retries > 0` network errors, 429 and 5xx
/// responses are retried with exponential backoff.
pub struct CatalogClient {
    client: Client,
    page_url_template: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
}

impl CatalogClient {
    /// Creates a `CatalogClient` with a request timeout, `User-Agent`, and retry policy.
    ///
    /// `timeout_secs` bounds the whole request, so a stalled server can never
    /// hang the run. Set `max_retries` to `0` to disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        page_url_template: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            page_url_template: page_url_template.to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// Creates a `CatalogClient` from the scraper settings in [`AppConfig`].
    ///
    /// # Errors
    ///
    /// Same as [`CatalogClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.page_url_template,
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.scraper_max_retries,
            config.scraper_retry_backoff_base_secs,
        )
    }

    /// Builds the URL of catalog page `page`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPageUrl`] if `page` is 0, the template has
    /// no placeholder, or the substituted string is not an absolute URL.
    pub fn page_url(&self, page: u32) -> Result<String, ScraperError> {
        build_page_url(&self.page_url_template, page)
    }

    /// Fetches the markup of one catalog page.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchFailure`] for page `page` wrapping:
    /// - [`ScraperError::InvalidPageUrl`]: the URL could not be built.
    /// - [`ScraperError::Http`]: network failure or timeout.
    /// - [`ScraperError::UnexpectedStatus`]: any non-2xx status.
    /// - [`ScraperError::EmptyBody`]: a 2xx response with no content.
    pub async fn fetch_page(&self, page: u32) -> Result<RawPage, FetchFailure> {
        let url = self
            .page_url(page)
            .map_err(|source| FetchFailure { page, source })?;

        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self.client.get(&url).send().await?;
                let status = response.status();

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                if body.trim().is_empty() {
                    return Err(ScraperError::EmptyBody { url });
                }
                Ok(body)
            }
        })
        .await
        .map_err(|source| FetchFailure { page, source })?;

        let raw = RawPage { page, url, body };
        tracing::debug!(page, url = %raw.url, bytes = raw.byte_len(), "fetched catalog page");
        Ok(raw)
    }
}

/// Substitutes `page` into the first `{}` of `template` and checks the result
/// is an absolute URL.
pub(crate) fn build_page_url(template: &str, page: u32) -> Result<String, ScraperError> {
    if page == 0 {
        return Err(ScraperError::InvalidPageUrl {
            page,
            reason: "page numbers start at 1".into(),
        });
    }
    if !template.contains(PAGE_PLACEHOLDER) {
        return Err(ScraperError::InvalidPageUrl {
            page,
            reason: format!("template \"{template}\" has no {PAGE_PLACEHOLDER} placeholder"),
        });
    }

    let url = template.replacen(PAGE_PLACEHOLDER, &page.to_string(), 1);
    reqwest::Url::parse(&url).map_err(|e| ScraperError::InvalidPageUrl {
        page,
        reason: format!("\"{url}\" is not a valid URL: {e}"),
    })?;
    Ok(url)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

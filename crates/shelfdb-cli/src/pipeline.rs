//! One ETL run: fetch every catalog page, extract its items, normalize the
//! combined batch and replace the stored snapshot.
//!
//! Page failures are logged and skipped so a single bad page does not abort
//! the run. A run that produces no records never touches the store; only a
//! failed load is an error.

use std::time::Duration;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use shelfdb_core::AppConfig;
use shelfdb_scraper::{normalize, CatalogClient, ExtractReport, Extractor, FetchFailure};
use sqlx::SqlitePool;
use tracing::Instrument;

/// Terminal state of a run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// The snapshot was replaced; `rows` is the count read back after commit.
    Completed {
        rows: i64,
        failed_pages: Vec<u32>,
        skipped_items: usize,
        dropped_records: usize,
    },
    /// Nothing survived extraction and normalization. The store is untouched.
    AbortedNoData { failed_pages: Vec<u32> },
}

/// Knobs for a single run, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub pages: u32,
    pub max_concurrent_pages: usize,
    pub inter_run_delay: Duration,
}

impl RunSettings {
    /// `pages` overrides the configured page count when given.
    pub(crate) fn from_config(config: &AppConfig, pages: Option<u32>) -> Self {
        Self {
            pages: pages.unwrap_or(config.pages),
            max_concurrent_pages: config.scraper_max_concurrent_pages,
            inter_run_delay: Duration::from_millis(config.scraper_inter_run_delay_ms),
        }
    }
}

/// Runs the pipeline for pages `1..=settings.pages`.
///
/// # Errors
///
/// Returns an error only if loading into the store fails. Fetch failures and
/// malformed items are counted in the returned [`RunOutcome`].
pub(crate) async fn run_pipeline(
    settings: &RunSettings,
    client: &CatalogClient,
    extractor: &Extractor,
    pool: &SqlitePool,
) -> anyhow::Result<RunOutcome> {
    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, pages = settings.pages);

    execute(settings, client, extractor, pool)
        .instrument(span)
        .await
}

async fn execute(
    settings: &RunSettings,
    client: &CatalogClient,
    extractor: &Extractor,
    pool: &SqlitePool,
) -> anyhow::Result<RunOutcome> {
    tracing::info!("starting catalog run");

    // `buffered` yields in page order regardless of which fetch finishes first.
    let results: Vec<Result<ExtractReport, FetchFailure>> = stream::iter(1..=settings.pages)
        .map(|page| async move {
            let raw = client.fetch_page(page).await?;
            let report = extractor.extract(raw.page, &raw.body);
            tracing::info!(
                page,
                items = report.items.len(),
                skipped = report.skipped.len(),
                "extracted page"
            );
            Ok::<_, FetchFailure>(report)
        })
        .buffered(settings.max_concurrent_pages.max(1))
        .collect()
        .await;

    let mut items = Vec::new();
    let mut failed_pages = Vec::new();
    let mut skipped_items: usize = 0;

    for result in results {
        match result {
            Ok(report) => {
                skipped_items += report.skipped.len();
                items.extend(report.items);
            }
            Err(failure) => {
                tracing::error!(
                    page = failure.page,
                    error = %failure.source,
                    "failed to fetch page, skipping"
                );
                failed_pages.push(failure.page);
            }
        }
    }

    if !failed_pages.is_empty() {
        tracing::warn!(
            failed = failed_pages.len(),
            total = settings.pages,
            "some pages failed during the run"
        );
    }

    if !settings.inter_run_delay.is_zero() {
        tokio::time::sleep(settings.inter_run_delay).await;
    }

    let normalized = normalize(items);
    let dropped_records = normalized.dropped.len();

    if normalized.dataset.is_empty() {
        tracing::warn!(
            failed_pages = failed_pages.len(),
            skipped_items,
            dropped_records,
            "no records to load, leaving store untouched"
        );
        return Ok(RunOutcome::AbortedNoData { failed_pages });
    }

    let rows = shelfdb_db::replace_dataset(pool, &normalized.dataset)
        .await
        .context("failed to load dataset into store")?;

    if usize::try_from(rows).ok() != Some(normalized.dataset.len()) {
        tracing::warn!(
            expected = normalized.dataset.len(),
            rows,
            "stored row count differs from dataset size"
        );
    }

    tracing::info!(rows, skipped_items, dropped_records, "catalog run completed");

    Ok(RunOutcome::Completed {
        rows,
        failed_pages,
        skipped_items,
        dropped_records,
    })
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;

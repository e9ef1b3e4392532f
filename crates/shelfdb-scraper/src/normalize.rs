//! Normalization from captured [`RawItem`]s to typed [`CanonicalRecord`]s.
//!
//! Pure functions, no I/O. Records whose price or timestamp cannot be
//! interpreted are dropped and reported; they are never persisted with a
//! missing value.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use rust_decimal::Decimal;
use shelfdb_core::{CanonicalRecord, Dataset, RawItem};
use thiserror::Error;

/// First `digits.digits` run in the price text; currency symbols and
/// mis-decoded bytes around it are ignored.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("valid regex"));

/// Why a raw item did not make it into the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("no decimal price in \"{price_raw}\" ({title})")]
    UnparseablePrice { title: String, price_raw: String },
    #[error("unparseable scraped_at \"{scraped_at}\" ({title})")]
    UnparseableTimestamp { title: String, scraped_at: String },
}

/// Output of [`normalize`]: the dataset plus every dropped item's reason.
#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub dataset: Dataset,
    pub dropped: Vec<DropReason>,
}

/// Normalizes all raw items of a run into a [`Dataset`].
///
/// Items are ordered by `(page, position)` first, so the dataset order does
/// not depend on the order pages finished fetching. An empty input gives an
/// empty dataset.
#[must_use]
pub fn normalize(mut items: Vec<RawItem>) -> NormalizeReport {
    items.sort_by_key(|item| (item.page, item.position));

    let mut records = Vec::with_capacity(items.len());
    let mut dropped = Vec::new();

    for item in items {
        match normalize_item(item) {
            Ok(record) => records.push(record),
            Err(reason) => {
                tracing::debug!(%reason, "dropping record during normalization");
                dropped.push(reason);
            }
        }
    }

    if !dropped.is_empty() {
        tracing::info!(
            kept = records.len(),
            dropped = dropped.len(),
            "normalization dropped records"
        );
    }

    NormalizeReport {
        dataset: Dataset::new(records),
        dropped,
    }
}

/// Normalizes a single raw item.
///
/// # Errors
///
/// Returns [`DropReason::UnparseablePrice`] when `price_raw` has no decimal
/// number, and [`DropReason::UnparseableTimestamp`] when `scraped_at` is not
/// an ISO-8601 timestamp.
pub fn normalize_item(item: RawItem) -> Result<CanonicalRecord, DropReason> {
    let Some(price) = parse_price(&item.price_raw) else {
        return Err(DropReason::UnparseablePrice {
            title: item.title,
            price_raw: item.price_raw,
        });
    };

    let Some(scraped_timestamp) = parse_scraped_at(&item.scraped_at) else {
        return Err(DropReason::UnparseableTimestamp {
            title: item.title,
            scraped_at: item.scraped_at,
        });
    };

    Ok(CanonicalRecord {
        image_ref: item.image_ref,
        title: item.title,
        price,
        rating: rating_from_word(&item.rating_raw),
        availability: item.availability_raw,
        scraped_timestamp,
    })
}

/// Extracts the first decimal number from a price string.
///
/// `"Â£51.77"` → `51.77`. Returns `None` when there is no `digits.digits`
/// substring (whole numbers such as `"£10"` included) or the number does not
/// fit a [`Decimal`].
#[must_use]
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let m = PRICE_RE.find(raw)?;
    Decimal::from_str(m.as_str()).ok()
}

/// Maps a rating word to stars. Anything outside `Zero`..`Five` (including
/// `"N/A"`) is 0. Matching is case-sensitive.
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn rating_from_word(word: &str) -> u8 {
    match word {
        "Zero" => 0,
        "One" => 1,
        "Two" => 2,
        "Three" => 3,
        "Four" => 4,
        "Five" => 5,
        _ => 0,
    }
}

/// Parses an extraction timestamp into a naive date-time.
///
/// Accepts `2025-12-02T22:06:25.282749`, the space-separated form, and RFC
/// 3339 strings with an offset (converted to UTC).
#[must_use]
pub fn parse_scraped_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

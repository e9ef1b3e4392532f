//! Read-side summary of the stored snapshot for the `report` command.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use shelfdb_core::CanonicalRecord;

/// Rating and availability filters. An empty list matches everything.
/// Availability must match the stored text exactly, case included.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportFilter {
    pub ratings: Vec<u8>,
    pub availability: Vec<String>,
}

impl ReportFilter {
    fn matches(&self, record: &CanonicalRecord) -> bool {
        (self.ratings.is_empty() || self.ratings.contains(&record.rating))
            && (self.availability.is_empty()
                || self.availability.contains(&record.availability))
    }
}

/// Price spread of the books sharing one star rating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RatingStats {
    pub count: usize,
    pub min_price: Decimal,
    pub mean_price: Decimal,
    pub max_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Summary {
    pub total: usize,
    /// Mean price of the filtered records, rounded to 2 decimal places.
    pub average_price: Option<Decimal>,
    /// Newest scrape time across the whole snapshot, ignoring filters.
    pub last_updated: Option<NaiveDateTime>,
    pub by_rating: BTreeMap<u8, RatingStats>,
}

/// Records that pass `filter`, in stored order.
pub(crate) fn filter_records<'a>(
    records: &'a [CanonicalRecord],
    filter: &ReportFilter,
) -> Vec<&'a CanonicalRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

pub(crate) fn summarize(records: &[CanonicalRecord], filter: &ReportFilter) -> Summary {
    let selected = filter_records(records, filter);

    let average_price = mean_price(selected.iter().map(|r| r.price));

    let mut prices_by_rating: BTreeMap<u8, Vec<Decimal>> = BTreeMap::new();
    for record in &selected {
        prices_by_rating
            .entry(record.rating)
            .or_default()
            .push(record.price);
    }
    let by_rating = prices_by_rating
        .into_iter()
        .filter_map(|(rating, prices)| rating_stats(&prices).map(|stats| (rating, stats)))
        .collect();

    Summary {
        total: selected.len(),
        average_price,
        last_updated: records.iter().map(|r| r.scraped_timestamp).max(),
        by_rating,
    }
}

/// Mean of `prices` rounded to 2 decimal places, or `None` when empty.
fn mean_price(prices: impl Iterator<Item = Decimal>) -> Option<Decimal> {
    let (sum, count) = prices.fold((Decimal::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
    (count > 0).then(|| {
        (sum / Decimal::from(count))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    })
}

fn rating_stats(prices: &[Decimal]) -> Option<RatingStats> {
    Some(RatingStats {
        count: prices.len(),
        min_price: prices.iter().min().copied()?,
        mean_price: mean_price(prices.iter().copied())?,
        max_price: prices.iter().max().copied()?,
    })
}

/// Plain-text rendering printed by `shelfdb report`.
pub(crate) fn render_summary(summary: &Summary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "total records:  {}", summary.total);
    match summary.average_price {
        Some(avg) => {
            let _ = writeln!(out, "average price:  £{avg:.2}");
        }
        None => out.push_str("average price:  n/a\n"),
    }
    match summary.last_updated {
        Some(ts) => {
            let _ = writeln!(out, "last updated:   {}", ts.format("%Y-%m-%d %H:%M:%S"));
        }
        None => out.push_str("last updated:   never\n"),
    }
    out.push_str("by rating:\n");
    for (rating, stats) in &summary.by_rating {
        let _ = writeln!(
            out,
            "  {rating} stars: {} (min £{:.2}, mean £{:.2}, max £{:.2})",
            stats.count, stats.min_price, stats.mean_price, stats.max_price
        );
    }
    out
}

/// Reads the snapshot and prints either the summary or, with `json`, the
/// filtered records.
pub(crate) async fn run_report(
    pool: &sqlx::SqlitePool,
    filter: &ReportFilter,
    json: bool,
) -> anyhow::Result<()> {
    let records = shelfdb_db::list_records(pool).await?;
    tracing::debug!(records = records.len(), "loaded snapshot for report");

    if json {
        let selected = filter_records(&records, filter);
        println!("{}", serde_json::to_string_pretty(&selected)?);
    } else {
        print!("{}", render_summary(&summarize(&records, filter)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;

    fn record(
        title: &str,
        price: &str,
        rating: u8,
        availability: &str,
        day: u32,
    ) -> CanonicalRecord {
        CanonicalRecord {
            image_ref: format!("https://books.toscrape.com/media/cache/{title}.jpg"),
            title: title.to_owned(),
            price: Decimal::from_str(price).unwrap(),
            rating,
            availability: availability.to_owned(),
            scraped_timestamp: NaiveDate::from_ymd_opt(2025, 12, day)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn stats(count: usize, min: &str, mean: &str, max: &str) -> RatingStats {
        RatingStats {
            count,
            min_price: dec(min),
            mean_price: dec(mean),
            max_price: dec(max),
        }
    }

    fn catalog() -> Vec<CanonicalRecord> {
        vec![
            record("a", "10.00", 3, "In stock", 1),
            record("b", "20.00", 5, "In stock", 2),
            record("c", "15.55", 3, "Out of stock", 3),
        ]
    }

    #[test]
    fn summarize_without_filters_covers_everything() {
        let summary = summarize(&catalog(), &ReportFilter::default());

        assert_eq!(summary.total, 3);
        assert_eq!(summary.average_price, Some(dec("15.18")));
        assert_eq!(
            summary.by_rating,
            BTreeMap::from([
                (3, stats(2, "10.00", "12.78", "15.55")),
                (5, stats(1, "20.00", "20.00", "20.00")),
            ])
        );
        assert_eq!(
            summary.last_updated.unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()
        );
    }

    #[test]
    fn summarize_applies_rating_and_availability_filters() {
        let filter = ReportFilter {
            ratings: vec![3],
            availability: vec!["In stock".to_owned()],
        };
        let summary = summarize(&catalog(), &filter);

        assert_eq!(summary.total, 1);
        assert_eq!(summary.average_price, Some(dec("10.00")));
        assert_eq!(
            summary.by_rating,
            BTreeMap::from([(3, stats(1, "10.00", "10.00", "10.00"))])
        );
    }

    #[test]
    fn availability_filter_matches_exact_text_only() {
        let filter = ReportFilter {
            ratings: Vec::new(),
            availability: vec!["in stock".to_owned()],
        };
        let summary = summarize(&catalog(), &filter);

        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_price, None);
        assert!(summary.by_rating.is_empty());
    }

    #[test]
    fn rating_stats_track_price_spread() {
        let records = vec![
            record("a", "5.10", 2, "In stock", 1),
            record("b", "50.00", 2, "In stock", 1),
            record("c", "21.35", 2, "In stock", 1),
        ];
        let summary = summarize(&records, &ReportFilter::default());

        assert_eq!(
            summary.by_rating.get(&2),
            Some(&stats(3, "5.10", "25.48", "50.00"))
        );
    }

    #[test]
    fn last_updated_ignores_filters() {
        let filter = ReportFilter {
            ratings: vec![5],
            availability: Vec::new(),
        };
        let summary = summarize(&catalog(), &filter);

        assert_eq!(summary.total, 1);
        assert_eq!(
            summary.last_updated.unwrap().date(),
            NaiveDate::from_ymd_opt(2025, 12, 3).unwrap()
        );
    }

    #[test]
    fn summarize_empty_snapshot() {
        let summary = summarize(&[], &ReportFilter::default());

        assert_eq!(summary.total, 0);
        assert_eq!(summary.average_price, None);
        assert_eq!(summary.last_updated, None);
        assert!(summary.by_rating.is_empty());
    }

    #[test]
    fn render_summary_lists_ratings() {
        let text = render_summary(&summarize(&catalog(), &ReportFilter::default()));

        assert!(text.contains("total records:  3"));
        assert!(text.contains("average price:  £15.18"));
        assert!(text.contains("last updated:   2025-12-03 12:00:00"));
        assert!(text.contains("  3 stars: 2 (min £10.00, mean £12.78, max £15.55)"));
        assert!(text.contains("  5 stars: 1 (min £20.00, mean £20.00, max £20.00)"));
    }

    #[test]
    fn render_summary_handles_empty_snapshot() {
        let text = render_summary(&summarize(&[], &ReportFilter::default()));

        assert!(text.contains("average price:  n/a"));
        assert!(text.contains("last updated:   never"));
    }
}

//! Record types flowing through the catalog ETL pipeline.
//!
//! [`RawItem`] is what the extractor captures from one product container,
//! untouched. [`CanonicalRecord`] is the typed row the store holds, and a
//! [`Dataset`] is the ordered set of rows produced by one run.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// `chrono` format used for [`RawItem::scraped_at`], e.g.
/// `"2025-12-02T22:06:25.282749"`.
pub const SCRAPED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One product as captured from the catalog markup. Every field is the
/// verbatim string the page carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    /// 1-based catalog page the item was found on.
    pub page: u32,
    /// 0-based index of the item container within its page.
    pub position: usize,
    /// Absolute image URL, already resolved against the image base URL.
    pub image_ref: String,
    /// Full title from the link's `title` attribute.
    pub title: String,
    /// Price text as rendered, e.g. `"Â£51.77"`.
    pub price_raw: String,
    /// Rating word token, e.g. `"Three"`.
    pub rating_raw: String,
    /// Availability text, or `"N/A"` when the page had none.
    pub availability_raw: String,
    /// Extraction time, formatted with [`SCRAPED_AT_FORMAT`].
    pub scraped_at: String,
}

/// A normalized product row, the unit persisted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub image_ref: String,
    pub title: String,
    /// Currency-stripped, non-negative price.
    pub price: Decimal,
    /// Star rating in `0..=5`.
    pub rating: u8,
    pub availability: String,
    pub scraped_timestamp: NaiveDateTime,
}

impl CanonicalRecord {
    /// Re-expresses this record in raw form, tagged with the given origin.
    ///
    /// Normalizing the result yields a record equal to `self`.
    #[must_use]
    pub fn to_raw_item(&self, page: u32, position: usize) -> RawItem {
        RawItem {
            page,
            position,
            image_ref: self.image_ref.clone(),
            title: self.title.clone(),
            price_raw: self.price.to_string(),
            rating_raw: rating_word(self.rating).to_string(),
            availability_raw: self.availability.clone(),
            scraped_at: self
                .scraped_timestamp
                .format(SCRAPED_AT_FORMAT)
                .to_string(),
        }
    }
}

fn rating_word(rating: u8) -> &'static str {
    match rating {
        1 => "One",
        2 => "Two",
        3 => "Three",
        4 => "Four",
        5 => "Five",
        _ => "Zero",
    }
}

/// The full ordered collection of records for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<CanonicalRecord>,
}

impl Dataset {
    /// Column order of the persisted table.
    pub const COLUMNS: [&'static str; 6] = [
        "image_ref",
        "title",
        "price",
        "rating",
        "availability",
        "scraped_timestamp",
    ];

    #[must_use]
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<CanonicalRecord> {
        self.records
    }
}

impl From<Vec<CanonicalRecord>> for Dataset {
    fn from(records: Vec<CanonicalRecord>) -> Self {
        Self::new(records)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;

    use super::*;

    fn sample_record() -> CanonicalRecord {
        CanonicalRecord {
            image_ref: "https://books.toscrape.com/media/cache/2c/da/2cda.jpg".to_owned(),
            title: "A Light in the Attic".to_owned(),
            price: Decimal::from_str("51.77").unwrap(),
            rating: 3,
            availability: "In stock".to_owned(),
            scraped_timestamp: NaiveDate::from_ymd_opt(2025, 12, 2)
                .unwrap()
                .and_hms_micro_opt(22, 6, 25, 282_749)
                .unwrap(),
        }
    }

    #[test]
    fn to_raw_item_formats_timestamp_with_microseconds() {
        let raw = sample_record().to_raw_item(1, 0);
        assert_eq!(raw.scraped_at, "2025-12-02T22:06:25.282749");
    }

    #[test]
    fn to_raw_item_writes_rating_as_word() {
        let raw = sample_record().to_raw_item(2, 7);
        assert_eq!(raw.rating_raw, "Three");
        assert_eq!(raw.price_raw, "51.77");
        assert_eq!((raw.page, raw.position), (2, 7));
    }

    #[test]
    fn dataset_reports_length_and_emptiness() {
        assert!(Dataset::default().is_empty());
        let dataset = Dataset::from(vec![sample_record()]);
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.is_empty());
    }

    #[test]
    fn canonical_record_serializes_price_as_string() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["price"], "51.77");
        assert_eq!(json["rating"], 3);
    }
}

//! The `books_data` table: snapshot replacement and read queries.
//!
//! The table only ever holds the latest successful run. A load drops and
//! recreates it inside one transaction, so readers see either the previous
//! snapshot or the new one, never a mix.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use shelfdb_core::{CanonicalRecord, Dataset};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::DbError;

/// Name of the snapshot table.
pub const BOOKS_TABLE: &str = "books_data";

/// `price` is the exact decimal text of the [`Decimal`]. A REAL column reads
/// back with 15 significant digits and in exponent form for small values.
const CREATE_BOOKS_TABLE: &str = "CREATE TABLE books_data ( \
         image_ref         TEXT    NOT NULL, \
         title             TEXT    NOT NULL, \
         price             TEXT    NOT NULL CHECK (CAST(price AS REAL) >= 0), \
         rating            INTEGER NOT NULL CHECK (rating BETWEEN 0 AND 5), \
         availability      TEXT    NOT NULL, \
         scraped_timestamp TEXT    NOT NULL \
     )";

/// Serializes snapshot replacement within this process. Other processes are
/// serialized by SQLite's write lock.
static WRITE_LOCK: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `books_data` table.
///
/// `price` holds the exact decimal text written by [`replace_dataset`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookRow {
    pub image_ref: String,
    pub title: String,
    pub price: String,
    pub rating: i64,
    pub availability: String,
    pub scraped_timestamp: NaiveDateTime,
}

impl TryFrom<BookRow> for CanonicalRecord {
    type Error = DbError;

    fn try_from(row: BookRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price)
            .map_err(|e| DbError::InvalidRow(format!("price \"{}\": {e}", row.price)))?;
        let rating = u8::try_from(row.rating)
            .ok()
            .filter(|r| *r <= 5)
            .ok_or_else(|| DbError::InvalidRow(format!("rating {} out of range", row.rating)))?;

        Ok(CanonicalRecord {
            image_ref: row.image_ref,
            title: row.title,
            price,
            rating,
            availability: row.availability,
            scraped_timestamp: row.scraped_timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Replaces the persisted snapshot with `dataset`.
///
/// Drops the previous table, recreates it and inserts every record in one
/// transaction. An empty dataset leaves an empty, schema-valid table. After
/// commit the row count is read back from the store and returned.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement or the commit fails. On error
/// the transaction is rolled back and the previous snapshot stays in place.
pub async fn replace_dataset(pool: &SqlitePool, dataset: &Dataset) -> Result<i64, DbError> {
    let _guard = WRITE_LOCK.lock().await;

    let mut tx = pool.begin().await?;

    sqlx::query("DROP TABLE IF EXISTS books_data")
        .execute(&mut *tx)
        .await?;
    sqlx::query(CREATE_BOOKS_TABLE).execute(&mut *tx).await?;

    for record in dataset.records() {
        sqlx::query(
            "INSERT INTO books_data \
                 (image_ref, title, price, rating, availability, scraped_timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&record.image_ref)
        .bind(&record.title)
        .bind(record.price.to_string())
        .bind(i64::from(record.rating))
        .bind(&record.availability)
        .bind(record.scraped_timestamp)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let rows = count_records(pool).await?;
    tracing::info!(expected = dataset.len(), rows, "replaced {BOOKS_TABLE} snapshot");
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns every persisted record in insertion order.
///
/// A store that has never been loaded reads as empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::InvalidRow`]
/// if a stored row does not convert back into a [`CanonicalRecord`].
pub async fn list_records(pool: &SqlitePool) -> Result<Vec<CanonicalRecord>, DbError> {
    if !table_exists(pool).await? {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, BookRow>(
        "SELECT image_ref, title, price, rating, availability, \
                scraped_timestamp \
         FROM books_data \
         ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(CanonicalRecord::try_from).collect()
}

/// Returns the number of persisted records, or 0 before the first load.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_records(pool: &SqlitePool) -> Result<i64, DbError> {
    if !table_exists(pool).await? {
        return Ok(0);
    }

    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM books_data")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Returns the newest `scraped_timestamp` in the store ("last updated"), or
/// `None` when the store is empty or has never been loaded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_scraped_at(pool: &SqlitePool) -> Result<Option<NaiveDateTime>, DbError> {
    if !table_exists(pool).await? {
        return Ok(None);
    }

    let latest = sqlx::query_scalar::<_, Option<NaiveDateTime>>(
        "SELECT MAX(scraped_timestamp) FROM books_data",
    )
    .fetch_one(pool)
    .await?;
    Ok(latest)
}

async fn table_exists(pool: &SqlitePool) -> Result<bool, DbError> {
    let found = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
    )
    .bind(BOOKS_TABLE)
    .fetch_one(pool)
    .await?;
    Ok(found > 0)
}

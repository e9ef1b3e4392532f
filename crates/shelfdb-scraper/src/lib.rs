pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
mod rate_limit;

pub use client::{CatalogClient, RawPage};
pub use error::{FetchFailure, ScraperError};
pub use extract::{ExtractReport, Extractor, ItemOutcome, SkipReason};
pub use normalize::{normalize, DropReason, NormalizeReport};

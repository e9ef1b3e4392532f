//! HTML extraction of product containers from one catalog page.
//!
//! ## Markup contract
//!
//! Each product sits in an `<article class="product_pod">`:
//!
//! ```html
//! <article class="product_pod">
//!   <div class="image_container">
//!     <a href="a-light-in-the-attic_1000/index.html">
//!       <img src="../media/cache/2c/da/2cda.jpg" alt="A Light in the Attic" class="thumbnail">
//!     </a>
//!   </div>
//!   <p class="star-rating Three"></p>
//!   <h3><a href="..." title="A Light in the Attic">A Light in the ...</a></h3>
//!   <div class="product_price">
//!     <p class="price_color">£51.77</p>
//!     <p class="instock availability"><i class="icon-ok"></i> In stock</p>
//!   </div>
//! </article>
//! ```
//!
//! The title is taken from the link's `title` attribute because the link text
//! is truncated. The rating word is the `star-rating` element's other class.
//! Image, title, price and rating are required; availability falls back to
//! `"N/A"`.

use chrono::Local;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use shelfdb_core::{RawItem, SCRAPED_AT_FORMAT};
use thiserror::Error;

use crate::error::ScraperError;

/// Class token that marks the rating element; the rating word is the other one.
const RATING_BASE_CLASS: &str = "star-rating";

/// Availability recorded when a container has no availability element.
pub const AVAILABILITY_UNKNOWN: &str = "N/A";

/// Why a product container was left out of the extracted items.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no image with a src attribute")]
    MissingImage,
    #[error("image path \"{path}\" cannot be resolved: {reason}")]
    UnresolvableImage { path: String, reason: String },
    #[error("no title link with a title attribute")]
    MissingTitle,
    #[error("no price element")]
    MissingPrice,
    #[error("no star-rating element with a rating word")]
    MissingRating,
}

/// Result of extracting one product container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Ok(RawItem),
    Skipped { position: usize, reason: SkipReason },
}

/// Items extracted from one page, plus the containers that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ExtractReport {
    pub items: Vec<RawItem>,
    /// `(position, reason)` for every skipped container.
    pub skipped: Vec<(usize, SkipReason)>,
}

impl ExtractReport {
    /// Number of containers found on the page, kept or skipped.
    #[must_use]
    pub fn containers(&self) -> usize {
        self.items.len() + self.skipped.len()
    }
}

struct Selectors {
    product: Selector,
    image: Selector,
    title: Selector,
    price: Selector,
    rating: Selector,
    availability: Selector,
}

impl Selectors {
    fn new() -> Self {
        let parse = |css: &str| Selector::parse(css).expect("valid selector");
        Self {
            product: parse("article.product_pod"),
            image: parse("img"),
            title: parse("h3 a"),
            price: parse("p.price_color"),
            rating: parse("p.star-rating"),
            availability: parse("p.instock.availability"),
        }
    }
}

/// Parses catalog pages into [`RawItem`]s.
///
/// Holds the compiled selectors and the base URL for image paths, so one
/// instance serves a whole run.
pub struct Extractor {
    image_base: Url,
    selectors: Selectors,
}

impl Extractor {
    /// Creates an extractor resolving image paths against `image_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if `image_base_url` is not an
    /// absolute URL.
    pub fn new(image_base_url: &str) -> Result<Self, ScraperError> {
        let image_base = Url::parse(image_base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            url: image_base_url.to_owned(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            image_base,
            selectors: Selectors::new(),
        })
    }

    /// Extracts every product container of `markup`, found on page `page`.
    ///
    /// Never fails: blank markup or a page without containers yields an empty
    /// report, and a malformed container is skipped without affecting the
    /// others on the page.
    #[must_use]
    pub fn extract(&self, page: u32, markup: &str) -> ExtractReport {
        let mut report = ExtractReport::default();

        for outcome in self.outcomes(page, markup) {
            match outcome {
                ItemOutcome::Ok(item) => report.items.push(item),
                ItemOutcome::Skipped { position, reason } => {
                    tracing::warn!(page, position, %reason, "skipping catalog item");
                    report.skipped.push((position, reason));
                }
            }
        }

        report
    }

    /// Per-container outcomes for `markup`, in document order.
    #[must_use]
    pub fn outcomes(&self, page: u32, markup: &str) -> Vec<ItemOutcome> {
        if markup.trim().is_empty() {
            return Vec::new();
        }

        let document = Html::parse_document(markup);
        document
            .select(&self.selectors.product)
            .enumerate()
            .map(
                |(position, container)| match self.extract_item(page, position, container) {
                    Ok(item) => ItemOutcome::Ok(item),
                    Err(reason) => ItemOutcome::Skipped { position, reason },
                },
            )
            .collect()
    }

    fn extract_item(
        &self,
        page: u32,
        position: usize,
        container: ElementRef<'_>,
    ) -> Result<RawItem, SkipReason> {
        let s = &self.selectors;

        let image_path = first_attr(container, &s.image, "src").ok_or(SkipReason::MissingImage)?;
        let image_ref = self
            .image_base
            .join(image_path)
            .map_err(|e| SkipReason::UnresolvableImage {
                path: image_path.to_owned(),
                reason: e.to_string(),
            })?
            .to_string();

        let title = first_attr(container, &s.title, "title").ok_or(SkipReason::MissingTitle)?;

        let price_raw = container
            .select(&s.price)
            .next()
            .map(|el| el.text().collect::<String>())
            .ok_or(SkipReason::MissingPrice)?;

        let rating_raw = container
            .select(&s.rating)
            .next()
            .and_then(|el| el.value().classes().find(|c| *c != RATING_BASE_CLASS))
            .ok_or(SkipReason::MissingRating)?;

        let availability_raw = container
            .select(&s.availability)
            .next()
            .map_or_else(
                || AVAILABILITY_UNKNOWN.to_owned(),
                |el| el.text().collect::<String>().trim().to_owned(),
            );

        Ok(RawItem {
            page,
            position,
            image_ref,
            title: title.to_owned(),
            price_raw,
            rating_raw: rating_raw.to_owned(),
            availability_raw,
            scraped_at: Local::now()
                .naive_local()
                .format(SCRAPED_AT_FORMAT)
                .to_string(),
        })
    }
}

/// Value of `attr` on the first element under `container` matching
/// `selector`, if present and non-blank.
fn first_attr<'a>(container: ElementRef<'a>, selector: &Selector, attr: &str) -> Option<&'a str> {
    container
        .select(selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;

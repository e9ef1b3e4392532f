use chrono::NaiveDateTime;

use super::*;

const BASE: &str = "https://books.toscrape.com/catalogue/";

fn extractor() -> Extractor {
    Extractor::new(BASE).expect("valid base URL")
}

/// One well-formed `product_pod` container.
fn product_pod(n: usize, rating: &str) -> String {
    format!(
        r#"<article class="product_pod">
  <div class="image_container">
    <a href="book-{n}/index.html"><img src="../media/cache/aa/bb/book-{n}.jpg" alt="Book {n}" class="thumbnail"></a>
  </div>
  <p class="star-rating {rating}"><i class="icon-star"></i></p>
  <h3><a href="book-{n}/index.html" title="Book Number {n}: The Full Title">Book Number {n}: ...</a></h3>
  <div class="product_price">
    <p class="price_color">Â£5{n}.77</p>
    <p class="instock availability">
        <i class="icon-ok"></i>
        In stock
    </p>
  </div>
</article>"#
    )
}

fn page_with(pods: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>All products</title></head>
<body><section><ol class="row">{}</ol></section></body></html>"#,
        pods.iter()
            .map(|p| format!("<li>{p}</li>"))
            .collect::<String>()
    )
}

#[test]
fn extracts_every_well_formed_container() {
    let pods: Vec<String> = (0..20).map(|n| product_pod(n, "Three")).collect();
    let report = extractor().extract(1, &page_with(&pods));

    assert_eq!(report.items.len(), 20);
    assert!(report.skipped.is_empty());
    let positions: Vec<usize> = report.items.iter().map(|i| i.position).collect();
    assert_eq!(positions, (0..20).collect::<Vec<_>>());
}

#[test]
fn captures_fields_verbatim() {
    let report = extractor().extract(2, &page_with(&[product_pod(1, "Four")]));
    let item = &report.items[0];

    assert_eq!(item.page, 2);
    assert_eq!(item.position, 0);
    assert_eq!(
        item.image_ref,
        "https://books.toscrape.com/media/cache/aa/bb/book-1.jpg"
    );
    assert_eq!(item.title, "Book Number 1: The Full Title");
    assert_eq!(item.price_raw, "Â£51.77");
    assert_eq!(item.rating_raw, "Four");
    assert_eq!(item.availability_raw, "In stock");
}

#[test]
fn stamps_parseable_scraped_at() {
    let report = extractor().extract(1, &page_with(&[product_pod(1, "One")]));
    let stamp = &report.items[0].scraped_at;
    assert!(
        NaiveDateTime::parse_from_str(stamp, SCRAPED_AT_FORMAT).is_ok(),
        "unexpected scraped_at format: {stamp}"
    );
}

#[test]
fn missing_availability_defaults_to_na() {
    let pod = product_pod(1, "Two").replace("instock availability", "something-else");
    let report = extractor().extract(1, &page_with(&[pod]));
    assert_eq!(report.items[0].availability_raw, AVAILABILITY_UNKNOWN);
}

#[test]
fn container_without_price_is_skipped_alone() {
    let broken = product_pod(1, "Two").replace(r#"<p class="price_color">Â£51.77</p>"#, "");
    let pods = vec![product_pod(0, "One"), broken, product_pod(2, "Five")];
    let report = extractor().extract(1, &page_with(&pods));

    assert_eq!(report.items.len(), 2);
    assert_eq!(report.skipped, vec![(1, SkipReason::MissingPrice)]);
    assert_eq!(report.containers(), 3);
    let titles: Vec<&str> = report.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Book Number 0: The Full Title",
            "Book Number 2: The Full Title"
        ]
    );
}

#[test]
fn container_without_image_is_skipped() {
    let pod = product_pod(1, "Two").replace(r#"src="../media/cache/aa/bb/book-1.jpg""#, "");
    let outcomes = extractor().outcomes(1, &page_with(&[pod]));
    assert_eq!(
        outcomes,
        vec![ItemOutcome::Skipped {
            position: 0,
            reason: SkipReason::MissingImage
        }]
    );
}

#[test]
fn container_without_title_attribute_is_skipped() {
    let pod = product_pod(1, "Two").replace(r#"title="Book Number 1: The Full Title""#, "");
    let report = extractor().extract(1, &page_with(&[pod]));
    assert!(report.items.is_empty());
    assert_eq!(report.skipped, vec![(0, SkipReason::MissingTitle)]);
}

#[test]
fn rating_element_without_word_is_skipped() {
    let pod = product_pod(1, "Two").replace("star-rating Two", "star-rating");
    let report = extractor().extract(1, &page_with(&[pod]));
    assert_eq!(report.skipped, vec![(0, SkipReason::MissingRating)]);
}

#[test]
fn unknown_rating_word_is_kept_for_the_normalizer() {
    let report = extractor().extract(1, &page_with(&[product_pod(1, "Six")]));
    assert_eq!(report.items[0].rating_raw, "Six");
}

#[test]
fn page_without_containers_yields_empty_report() {
    let report = extractor().extract(1, &page_with(&[]));
    assert!(report.items.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn blank_markup_yields_empty_report() {
    let report = extractor().extract(1, "   \n");
    assert_eq!(report.containers(), 0);
}

#[test]
fn non_html_input_yields_empty_report() {
    let report = extractor().extract(1, "{\"products\": []}");
    assert_eq!(report.containers(), 0);
}

#[test]
fn rejects_relative_image_base() {
    let result = Extractor::new("catalogue/");
    assert!(
        matches!(result, Err(ScraperError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}

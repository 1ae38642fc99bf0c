//! Direct AliExpress storefront scraper.
//!
//! No official API: product data is pulled from the rendered storefront
//! HTML. Class names on the site are obfuscated and rotate between
//! deployments, so every extraction walks a cascade of selector
//! candidates and takes the first that matches. Each call opens a fresh
//! [`Page`] through the injected [`Browser`] and drops it on every exit
//! path, success or failure.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tienda_core::{pricing, SupplierProduct};

use crate::adapter::{ConnectionStatus, SupplierAdapter, SupplierOrder};
use crate::browser::Browser;
use crate::error::SupplierError;
use crate::extract::extract_external_id;
use crate::retry::retry_fixed;

const SUPPLIER: &str = "aliexpress-scraper";
const STOREFRONT: &str = "https://es.aliexpress.com";
/// Scraped search results are capped; past the first few cards the page
/// lazy-loads anyway.
const MAX_SEARCH_RESULTS: usize = 10;

/// Search result card containers, newest market observed first.
const SEARCH_CARD_SELECTORS: &[&str] = &[
    "div.search-item-card-wrapper-gallery",
    "a.search-card-item",
    "div[class*='manhattan--container']",
    "div.list--gallery--item",
];
/// Product page title candidates.
const TITLE_SELECTORS: &[&str] = &[
    "h1[data-pl='product-title']",
    "h1.product-title-text",
    "div.title--wrap--title h1",
    "h1",
];
/// Product page price candidates.
const PRICE_SELECTORS: &[&str] = &[
    "div[class*='price--current'] span",
    "span.product-price-value",
    "div.uniform-banner-box-price",
    "span[class*='price']",
];
/// Product page gallery image candidates.
const IMAGE_SELECTORS: &[&str] = &[
    "div[class*='slider--img'] img",
    "div.images-view-item img",
    "img[class*='magnifier--image']",
];

/// Supplier adapter that scrapes the AliExpress storefront directly.
pub struct AliExpressAdapter {
    browser: Arc<dyn Browser>,
    detail_max_retries: u32,
    detail_retry_delay: Duration,
}

impl AliExpressAdapter {
    #[must_use]
    pub fn new(
        browser: Arc<dyn Browser>,
        detail_max_retries: u32,
        detail_retry_delay_ms: u64,
    ) -> Self {
        Self {
            browser,
            detail_max_retries,
            detail_retry_delay: Duration::from_millis(detail_retry_delay_ms),
        }
    }

    /// Navigates a fresh page to `url` and returns the rendered HTML. The
    /// page is dropped before this function returns.
    async fn fetch_html(&self, url: &str) -> Result<String, SupplierError> {
        let mut page = self.browser.open().await?;
        page.goto(url).await?;
        Ok(page.content()?.to_owned())
    }

    async fn fetch_details(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        let url = format!("{STOREFRONT}/item/{external_id}.html");
        let html = self.fetch_html(&url).await?;
        parse_product_page(&html, external_id, &url)
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SupplierProduct>, SupplierError> {
        if let Some(pid) = extract_external_id(query) {
            tracing::info!(supplier = SUPPLIER, pid, "query is a direct product id");
            return match self.product_details(&pid).await {
                Ok(product) => Ok(vec![product]),
                Err(err) => {
                    tracing::warn!(supplier = SUPPLIER, pid, error = %err, "direct import lookup failed");
                    Ok(vec![])
                }
            };
        }

        let url = reqwest::Url::parse_with_params(
            &format!("{STOREFRONT}/wholesale"),
            &[("SearchText", query)],
        )
        .map_err(|e| SupplierError::InvalidBaseUrl {
            url: format!("{STOREFRONT}/wholesale"),
            reason: e.to_string(),
        })?;
        let html = self.fetch_html(url.as_str()).await?;
        Ok(parse_search_results(&html))
    }
}

#[async_trait]
impl SupplierAdapter for AliExpressAdapter {
    fn name(&self) -> &'static str {
        SUPPLIER
    }

    async fn search(&self, query: &str) -> Vec<SupplierProduct> {
        match self.try_search(query).await {
            Ok(products) => products,
            Err(err) => {
                tracing::warn!(supplier = SUPPLIER, query, error = %err, "search degraded to empty result");
                vec![]
            }
        }
    }

    async fn product_details(
        &self,
        external_id: &str,
    ) -> Result<SupplierProduct, SupplierError> {
        retry_fixed(self.detail_max_retries, self.detail_retry_delay, || {
            self.fetch_details(external_id)
        })
        .await
    }

    async fn place_order(&self, order: &SupplierOrder) -> Result<String, SupplierError> {
        let reference = format!("ALI-MOCK-{}", epoch_millis());
        tracing::info!(
            supplier = SUPPLIER,
            local_order_id = order.local_order_id,
            items = order.items.len(),
            reference,
            "placing order (synthetic reference)"
        );
        Ok(reference)
    }

    async fn check_status(&self) -> ConnectionStatus {
        match self.fetch_html(STOREFRONT).await {
            Ok(_) => ConnectionStatus::up("storefront reachable"),
            Err(err) => ConnectionStatus::down(err.to_string()),
        }
    }
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// HTML extraction. All synchronous: `scraper::Html` is not `Send`, so it
// must never live across an await point.
// ---------------------------------------------------------------------------

fn parse_product_page(
    html: &str,
    external_id: &str,
    url: &str,
) -> Result<SupplierProduct, SupplierError> {
    let document = Html::parse_document(html);

    let Some(title) = first_text(&document, TITLE_SELECTORS) else {
        // Title is the one field a real product page always renders; its
        // absence means a 404 shell or a captcha interstitial.
        return Err(SupplierError::NotFound {
            supplier: SUPPLIER,
            external_id: external_id.to_owned(),
        });
    };

    let price_cents = first_text(&document, PRICE_SELECTORS)
        .map(|text| scraped_price_cents(&text))
        .unwrap_or(0);

    let mut images: Vec<String> = Vec::new();
    for candidate in IMAGE_SELECTORS {
        if let Ok(selector) = Selector::parse(candidate) {
            for img in document.select(&selector) {
                if let Some(src) = img.value().attr("src").or_else(|| img.value().attr("data-src"))
                {
                    images.push(normalise_image_url(src));
                }
            }
            if !images.is_empty() {
                break;
            }
        }
    }
    let mut seen = std::collections::HashSet::new();
    images.retain(|u| !u.is_empty() && seen.insert(u.clone()));

    Ok(SupplierProduct {
        external_id: external_id.to_owned(),
        title,
        price_cents,
        shipping_cents: 0,
        description: String::new(),
        images,
        supplier: SUPPLIER.to_owned(),
        source_url: url.to_owned(),
    })
}

fn parse_search_results(html: &str) -> Vec<SupplierProduct> {
    let document = Html::parse_document(html);
    let mut products = Vec::new();

    for candidate in SEARCH_CARD_SELECTORS {
        let Ok(selector) = Selector::parse(candidate) else {
            continue;
        };
        for card in document.select(&selector) {
            if let Some(product) = parse_search_card(card) {
                products.push(product);
                if products.len() >= MAX_SEARCH_RESULTS {
                    return products;
                }
            }
        }
        if !products.is_empty() {
            break;
        }
    }
    products
}

/// Extracts one product from a result card. Cards without a resolvable
/// item link are skipped; everything else degrades field by field.
fn parse_search_card(card: ElementRef<'_>) -> Option<SupplierProduct> {
    let link_selector = Selector::parse("a[href*='/item/']").ok()?;
    let href = if card.value().name() == "a" {
        card.value().attr("href").map(ToOwned::to_owned)
    } else {
        card.select(&link_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(ToOwned::to_owned)
    }?;
    let source_url = absolute_url(&href);
    let external_id = extract_external_id(&source_url)?;

    let title = element_text(card, &["h3", "div[class*='title']", "a[title]"])
        .or_else(|| {
            Selector::parse("img")
                .ok()
                .and_then(|s| card.select(&s).next())
                .and_then(|img| img.value().attr("alt").map(ToOwned::to_owned))
        })
        .unwrap_or_default();
    if title.trim().is_empty() {
        return None;
    }

    let price_cents = element_text(card, &["div[class*='price']", "span[class*='price']"])
        .map(|text| scraped_price_cents(&text))
        .unwrap_or(0);

    let images = Selector::parse("img")
        .ok()
        .and_then(|s| card.select(&s).next())
        .and_then(|img| img.value().attr("src").map(|s| normalise_image_url(s)))
        .into_iter()
        .collect();

    Some(SupplierProduct {
        external_id,
        title: title.trim().to_owned(),
        price_cents,
        shipping_cents: 0,
        description: String::new(),
        images,
        supplier: SUPPLIER.to_owned(),
        source_url,
    })
}

fn first_text(document: &Html, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        if let Ok(selector) = Selector::parse(candidate) {
            if let Some(element) = document.select(&selector).next() {
                let text: String = element.text().collect::<String>().trim().to_owned();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

fn element_text(scope: ElementRef<'_>, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        if let Ok(selector) = Selector::parse(candidate) {
            if let Some(element) = scope.select(&selector).next() {
                let text: String = element.text().collect::<String>().trim().to_owned();
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

/// Parses a scraped price fragment into cents. The Spanish storefront
/// renders comma decimals ("12,34 €"); fragments may also carry US-style
/// thousands separators.
fn scraped_price_cents(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let decimal = if cleaned.contains(',') && !cleaned.contains('.') {
        cleaned.replace(',', ".")
    } else {
        cleaned.replace(',', "")
    };
    pricing::normalize_price_str(&decimal)
}

fn absolute_url(href: &str) -> String {
    if href.starts_with("//") {
        format!("https:{href}")
    } else if href.starts_with('/') {
        format!("{STOREFRONT}{href}")
    } else {
        href.to_owned()
    }
}

fn normalise_image_url(src: &str) -> String {
    absolute_url(src)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"
        <html><body>
          <h1 data-pl="product-title">Reloj inteligente deportivo</h1>
          <div class="price--current--abc123"><span>12,34 €</span></div>
          <div class="slider--img--xyz"><img src="//ae01.alicdn.com/kf/a.jpg"></div>
          <div class="slider--img--xyz"><img src="//ae01.alicdn.com/kf/b.jpg"></div>
        </body></html>"#;

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <div class="search-item-card-wrapper-gallery">
            <a href="//es.aliexpress.com/item/1005010179828716.html"><h3>Reloj inteligente</h3></a>
            <div class="price--box"><span class="price--current">9,99 €</span></div>
            <img src="//ae01.alicdn.com/kf/watch.jpg">
          </div>
          <div class="search-item-card-wrapper-gallery">
            <a href="/item/2005010179828717.html"><h3>Auriculares</h3></a>
            <span class="multi--price-sale">15,50 €</span>
          </div>
        </body></html>"#;

    #[test]
    fn product_page_cascade_extracts_all_fields() {
        let product = parse_product_page(
            PRODUCT_PAGE,
            "1005010179828716",
            "https://es.aliexpress.com/item/1005010179828716.html",
        )
        .unwrap();
        assert_eq!(product.title, "Reloj inteligente deportivo");
        assert_eq!(product.price_cents, 1234);
        assert_eq!(
            product.images,
            vec![
                "https://ae01.alicdn.com/kf/a.jpg",
                "https://ae01.alicdn.com/kf/b.jpg"
            ]
        );
    }

    #[test]
    fn empty_shell_page_maps_to_not_found() {
        let err = parse_product_page("<html><body></body></html>", "42", "https://x")
            .unwrap_err();
        assert!(matches!(err, SupplierError::NotFound { .. }));
    }

    #[test]
    fn search_cards_resolve_ids_and_comma_prices() {
        let products = parse_search_results(SEARCH_PAGE);
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].external_id, "1005010179828716");
        assert_eq!(products[0].price_cents, 999);
        assert_eq!(products[1].external_id, "2005010179828717");
        assert_eq!(products[1].price_cents, 1550);
    }

    #[test]
    fn scraped_prices_handle_both_separator_styles() {
        assert_eq!(scraped_price_cents("12,34 €"), 1234);
        assert_eq!(scraped_price_cents("US $1,234.56"), 123_456);
        assert_eq!(scraped_price_cents("19.99"), 1999);
        assert_eq!(scraped_price_cents("sin precio"), 0);
    }
}

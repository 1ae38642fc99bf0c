//! AliExpress adapter backed by a RapidAPI scraping gateway.
//!
//! Key-API variant: every request carries static `x-rapidapi-key` and
//! `x-rapidapi-host` headers, no token exchange. The gateway proxies a
//! headless scrape on its side, so 504 timeouts are a normal occurrence
//! and worth a couple of fixed-delay retries.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tienda_core::{pricing, SupplierProduct};

use crate::adapter::{ConnectionStatus, SupplierAdapter, SupplierOrder};
use crate::error::SupplierError;
use crate::extract::extract_external_id;
use crate::retry::retry_fixed;

const SUPPLIER: &str = "aliexpress";
const MAX_SEARCH_RESULTS: usize = 50;

/// Construction-time settings for the RapidAPI gateway.
#[derive(Debug, Clone)]
pub struct RapidApiSettings {
    /// `RAPIDAPI_KEY`. `None` degrades the adapter to disconnected.
    pub api_key: Option<String>,
    /// `x-rapidapi-host` header value, also the default base host.
    pub host: String,
    pub timeout_secs: u64,
    pub detail_max_retries: u32,
    pub detail_retry_delay_ms: u64,
}

/// Supplier adapter for AliExpress product data via a RapidAPI gateway.
pub struct RapidApiAdapter {
    client: Client,
    base_url: Url,
    settings: RapidApiSettings,
}

impl RapidApiAdapter {
    /// Creates an adapter against the configured RapidAPI host.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Http`] if the HTTP client cannot be built
    /// or [`SupplierError::InvalidBaseUrl`] if the host is unparsable.
    pub fn new(settings: RapidApiSettings) -> Result<Self, SupplierError> {
        let base = format!("https://{}", settings.host);
        Self::with_base_url(settings, &base)
    }

    /// Creates an adapter with a custom base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Http`] if the HTTP client cannot be built
    /// or [`SupplierError::InvalidBaseUrl`] for an unparsable base URL.
    pub fn with_base_url(
        settings: RapidApiSettings,
        base_url: &str,
    ) -> Result<Self, SupplierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SupplierError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    fn api_key(&self) -> Result<&str, SupplierError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(SupplierError::MissingCredential {
                supplier: SUPPLIER,
                var: "RAPIDAPI_KEY",
            })
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
        context: &str,
    ) -> Result<Value, SupplierError> {
        let api_key = self.api_key()?.to_owned();
        let url = self
            .base_url
            .join(path)
            .map_err(|e| SupplierError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })?;
        let response = self
            .client
            .get(url.clone())
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.settings.host)
            .query(params)
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SupplierError::RateLimited {
                supplier: SUPPLIER,
                retry_after_secs: 60,
            });
        }
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    async fn fetch_details(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        let payload = self
            .get_json(
                "scraper",
                &[("productId", external_id)],
                "rapidapi scraper",
            )
            .await?;
        let detail: RapidDetail =
            serde_json::from_value(payload).map_err(|e| SupplierError::Deserialize {
                context: format!("rapidapi scraper(productId={external_id})"),
                source: e,
            })?;

        let Some(title) = detail.title() else {
            return Err(SupplierError::NotFound {
                supplier: SUPPLIER,
                external_id: external_id.to_owned(),
            });
        };

        let price_cents = detail.price_cents();
        let images = detail.images();
        Ok(SupplierProduct {
            external_id: external_id.to_owned(),
            title,
            price_cents,
            shipping_cents: 0,
            description: detail.description.unwrap_or_default(),
            images,
            supplier: SUPPLIER.to_owned(),
            source_url: format!("https://www.aliexpress.com/item/{external_id}.html"),
        })
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

        let payload = self
            .get_json("search", &[("query", query)], "rapidapi search")
            .await?;
        let docs = payload
            .get("docs")
            .or_else(|| payload.get("results"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        // The gateway has no page-size parameter, so the cap is ours.
        let products = docs
            .into_iter()
            .filter_map(|doc| {
                let item: RapidSearchDoc = serde_json::from_value(doc).ok()?;
                let external_id = item.product_id?;
                let title = item.title?;
                Some(SupplierProduct {
                    source_url: format!("https://www.aliexpress.com/item/{external_id}.html"),
                    external_id,
                    title,
                    price_cents: pricing::normalize_price(&item.app_sale_price),
                    shipping_cents: 0,
                    description: String::new(),
                    images: item.product_main_image_url.into_iter().collect(),
                    supplier: SUPPLIER.to_owned(),
                })
            })
            .take(MAX_SEARCH_RESULTS)
            .collect();
        Ok(products)
    }
}

#[async_trait]
impl SupplierAdapter for RapidApiAdapter {
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
        retry_fixed(
            self.settings.detail_max_retries,
            Duration::from_millis(self.settings.detail_retry_delay_ms),
            || self.fetch_details(external_id),
        )
        .await
    }

    async fn place_order(&self, order: &SupplierOrder) -> Result<String, SupplierError> {
        let reference = format!("API-MOCK-{}", epoch_millis());
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
        if self.settings.api_key.is_none() {
            return ConnectionStatus::down("RAPIDAPI_KEY not configured");
        }
        // A known-product probe exercises the full request path, headers
        // and quota included.
        match self.fetch_details("1005006854519369").await {
            Ok(_) => ConnectionStatus::up("RapidAPI gateway reachable"),
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
// Gateway response shapes (loosely typed; the upstream scraper is not a
// stable contract)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RapidDetail {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "salePrice")]
    sale_price: Value,
    #[serde(default)]
    price: Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    images: Option<Vec<String>>,
    #[serde(default, rename = "imageUrls")]
    image_urls: Option<Vec<String>>,
    #[serde(default, rename = "mainImage")]
    main_image: Option<String>,
}

impl RapidDetail {
    fn title(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.title.clone())
            .filter(|t| !t.trim().is_empty())
    }

    fn price_cents(&self) -> i64 {
        let cents = pricing::normalize_price(&self.sale_price);
        if cents > 0 {
            cents
        } else {
            pricing::normalize_price(&self.price)
        }
    }

    fn images(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        if let Some(main) = &self.main_image {
            out.push(main.clone());
        }
        for list in [&self.images, &self.image_urls] {
            if let Some(list) = list {
                out.extend(list.iter().cloned());
            }
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|url| !url.is_empty() && seen.insert(url.clone()));
        out
    }
}

#[derive(Debug, Deserialize)]
struct RapidSearchDoc {
    #[serde(default, rename = "product_id")]
    product_id: Option<String>,
    #[serde(default, rename = "product_title")]
    title: Option<String>,
    #[serde(default, rename = "app_sale_price")]
    app_sale_price: Value,
    #[serde(default, rename = "product_main_image_url")]
    product_main_image_url: Option<String>,
}

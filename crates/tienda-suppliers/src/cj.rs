//! CJ Dropshipping adapter (token-API variant).
//!
//! CJ authenticates with an API key exchanged for a bearer access token.
//! CJ rate-limits the *authentication* endpoint itself (HTTP 429 / error
//! code `1600200`), so the token is cached across calls through an
//! injected [`TokenCache`] and refreshed lazily, behind a single-flight
//! gate, only when absent. An auth rate limit is surfaced as
//! [`SupplierError::RateLimited`], a hard backoff signal that is never
//! retried inline.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tienda_core::{pricing, SupplierProduct};

use crate::adapter::{ConnectionStatus, SupplierAdapter, SupplierOrder};
use crate::error::SupplierError;
use crate::extract::extract_external_id;
use crate::refine::refine_query;
use crate::retry::retry_fixed;
use crate::token::TokenCache;
use crate::translate::{translate_or_original, Translator};

const SUPPLIER: &str = "cj";
const DEFAULT_BASE_URL: &str = "https://developers.cjdropshipping.com/api2.0/v1/";
/// CJ application error code for "too many authentication requests".
const CJ_AUTH_RATE_LIMIT_CODE: i64 = 1_600_200;
/// Cooldown CJ asks for after an auth rate limit.
const AUTH_COOLDOWN_SECS: u64 = 300;
/// Search page size. CJ caps usable pages around 50; 48 gives variety
/// without tripping the cap.
const SEARCH_PAGE_SIZE: u32 = 48;

/// Construction-time settings, read from the deployment environment by the
/// registry.
#[derive(Debug, Clone)]
pub struct CjSettings {
    /// `CJD_API_KEY`. `None` degrades the adapter to disconnected.
    pub api_key: Option<String>,
    pub target_country: String,
    pub storefront_lang: String,
    pub search_lang: String,
    pub timeout_secs: u64,
    pub detail_max_retries: u32,
    pub detail_retry_delay_ms: u64,
}

/// Supplier adapter for the CJ Dropshipping REST API.
pub struct CjAdapter {
    client: Client,
    base_url: Url,
    settings: CjSettings,
    token_cache: Arc<dyn TokenCache>,
    translator: Arc<dyn Translator>,
    /// Single-flight gate around the token refresh path: two concurrent
    /// calls must not both hit the rate-limited auth endpoint.
    auth_gate: tokio::sync::Mutex<()>,
}

impl CjAdapter {
    /// Creates an adapter against the production CJ API.
    ///
    /// Never fails on a missing API key: the adapter constructs in a
    /// degraded state and reports disconnected instead.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Http`] if the HTTP client cannot be built.
    pub fn new(
        settings: CjSettings,
        token_cache: Arc<dyn TokenCache>,
        translator: Arc<dyn Translator>,
    ) -> Result<Self, SupplierError> {
        Self::with_base_url(settings, token_cache, translator, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for wiremock tests).
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::Http`] if the HTTP client cannot be built
    /// or [`SupplierError::InvalidBaseUrl`] for an unparsable base URL.
    pub fn with_base_url(
        settings: CjSettings,
        token_cache: Arc<dyn TokenCache>,
        translator: Arc<dyn Translator>,
        base_url: &str,
    ) -> Result<Self, SupplierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        // Trailing slash so Url::join appends instead of replacing the last
        // path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| SupplierError::InvalidBaseUrl {
            url: normalised.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            base_url,
            settings,
            token_cache,
            translator,
            auth_gate: tokio::sync::Mutex::new(()),
        })
    }

    fn api_key(&self) -> Result<&str, SupplierError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or(SupplierError::MissingCredential {
                supplier: SUPPLIER,
                var: "CJD_API_KEY",
            })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SupplierError> {
        self.base_url
            .join(path)
            .map_err(|e| SupplierError::InvalidBaseUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    /// Returns a valid access token, authenticating at most once across
    /// concurrent callers.
    async fn access_token(&self) -> Result<String, SupplierError> {
        if let Some(token) = self.token_cache.get(SUPPLIER).await {
            return Ok(token);
        }
        let _guard = self.auth_gate.lock().await;
        // Another caller may have refreshed while we waited for the gate.
        if let Some(token) = self.token_cache.get(SUPPLIER).await {
            return Ok(token);
        }
        let token = self.authenticate().await?;
        self.token_cache.set(SUPPLIER, &token).await;
        Ok(token)
    }

    async fn authenticate(&self) -> Result<String, SupplierError> {
        let api_key = self.api_key()?.to_owned();
        let url = self.endpoint("authentication/getAccessToken")?;
        tracing::info!(supplier = SUPPLIER, "requesting access token");

        let response = self
            .client
            .post(url.clone())
            .json(&serde_json::json!({ "apiKey": api_key }))
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SupplierError::RateLimited {
                supplier: SUPPLIER,
                retry_after_secs: AUTH_COOLDOWN_SECS,
            });
        }
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let envelope: CjEnvelope<CjAuthData> =
            serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
                context: "getAccessToken".to_owned(),
                source: e,
            })?;

        match envelope.data.and_then(|d| d.access_token) {
            Some(token) => Ok(token),
            None if envelope.code == Some(CJ_AUTH_RATE_LIMIT_CODE) => {
                Err(SupplierError::RateLimited {
                    supplier: SUPPLIER,
                    retry_after_secs: AUTH_COOLDOWN_SECS,
                })
            }
            None => Err(SupplierError::Api {
                supplier: SUPPLIER,
                message: envelope
                    .message
                    .unwrap_or_else(|| "no access token in response".to_owned()),
            }),
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SupplierProduct>, SupplierError> {
        // Direct-import short-circuit: a pasted id or product URL goes
        // straight to the details endpoint. Searching for the raw id
        // string would return nothing useful.
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
        if query.starts_with("http://") || query.starts_with("https://") {
            tracing::warn!(supplier = SUPPLIER, query, "URL without an extractable id, skipping search");
            return Ok(vec![]);
        }

        let refined = refine_query(self.translator.as_ref(), query, &self.settings.search_lang).await;
        let token = self.access_token().await?;
        let url = self.endpoint("product/list")?;
        let response = self
            .client
            .get(url.clone())
            .header("CJ-Access-Token", token)
            .query(&[
                ("productName", refined.as_str()),
                ("pageSize", &SEARCH_PAGE_SIZE.to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let envelope: CjEnvelope<CjProductList> =
            serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
                context: format!("product/list(query={refined})"),
                source: e,
            })?;

        let items = envelope.data.map(|d| d.list).unwrap_or_default();
        let mut products = Vec::with_capacity(items.len());
        for item in items {
            products.push(self.map_list_item(item).await);
        }
        Ok(products)
    }

    async fn map_list_item(&self, item: CjListItem) -> SupplierProduct {
        let name = if item.product_name_en.is_empty() {
            item.product_name
        } else {
            item.product_name_en
        };
        let title = translate_or_original(
            self.translator.as_ref(),
            &name,
            &self.settings.storefront_lang,
        )
        .await;
        SupplierProduct {
            source_url: format!("https://cjdropshipping.com/product-detail.html?id={}", item.pid),
            external_id: item.pid,
            title,
            price_cents: pricing::normalize_price(&item.sell_price),
            shipping_cents: 0,
            description: String::new(),
            images: item.product_image.into_iter().collect(),
            supplier: SUPPLIER.to_owned(),
        }
    }

    async fn fetch_details(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        let token = self.access_token().await?;
        let url = self.endpoint("product/query")?;
        let response = self
            .client
            .get(url.clone())
            .header("CJ-Access-Token", token)
            .query(&[("pid", external_id)])
            .send()
            .await?;
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SupplierError::RateLimited {
                supplier: SUPPLIER,
                retry_after_secs: AUTH_COOLDOWN_SECS,
            });
        }
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let envelope: CjEnvelope<CjProductDetail> =
            serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
                context: format!("product/query(pid={external_id})"),
                source: e,
            })?;

        let Some(detail) = envelope.data else {
            return Err(SupplierError::NotFound {
                supplier: SUPPLIER,
                external_id: external_id.to_owned(),
            });
        };

        let title = translate_or_original(
            self.translator.as_ref(),
            detail.name(),
            &self.settings.storefront_lang,
        )
        .await;

        let images = collect_images(detail.product_image.as_ref(), &detail.product_image_set);

        // Shipping estimation is best-effort: a freight failure must not
        // block the import, so it degrades to 0.
        let shipping_cents = match detail.variants.first().map(|v| v.vid.clone()) {
            Some(vid) => self.estimate_shipping(&vid).await.unwrap_or_else(|err| {
                tracing::warn!(supplier = SUPPLIER, error = %err, "freight estimation failed, defaulting to 0");
                0
            }),
            None => 0,
        };

        Ok(SupplierProduct {
            source_url: format!(
                "https://cjdropshipping.com/product-detail.html?id={}",
                detail.pid
            ),
            external_id: detail.pid,
            title,
            price_cents: pricing::normalize_price(&detail.sell_price),
            shipping_cents,
            // Original HTML description is kept as-is so the storefront
            // layout survives.
            description: detail.description.unwrap_or_default(),
            images,
            supplier: SUPPLIER.to_owned(),
        })
    }

    /// Asks CJ for freight options to the configured target country and
    /// picks the cheapest one, in cents.
    async fn estimate_shipping(&self, vid: &str) -> Result<i64, SupplierError> {
        let token = self.access_token().await?;
        let url = self.endpoint("logistic/freightCalculate")?;
        let response = self
            .client
            .post(url.clone())
            .header("CJ-Access-Token", token)
            .json(&serde_json::json!({
                "startCountryCode": "CN",
                "endCountryCode": self.settings.target_country,
                "products": [{ "vid": vid, "quantity": 1 }],
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let envelope: CjEnvelope<Vec<CjFreightOption>> =
            serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
                context: format!("freightCalculate(vid={vid})"),
                source: e,
            })?;

        let cheapest = envelope
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|option| {
                let cents = pricing::normalize_price(&option.logistic_price);
                (cents, option.logistic_name)
            })
            .filter(|(cents, _)| *cents > 0)
            .min_by_key(|(cents, _)| *cents);

        match cheapest {
            Some((cents, name)) => {
                tracing::debug!(supplier = SUPPLIER, logistic = name, cents, "selected freight option");
                Ok(cents)
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl SupplierAdapter for CjAdapter {
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
        // The CJ order API is intentionally not wired yet; a synthetic
        // reference keeps fulfillment moving and is distinguishable by its
        // -MOCK- marker.
        let reference = format!("CJ-ORDER-MOCK-{}", epoch_millis());
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
        match self.access_token().await {
            Ok(_) => ConnectionStatus::up("CJ API token valid"),
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

/// Merges the primary image and gallery into one ordered, de-duplicated
/// list. Both fields vary in shape (`string`, array, or a JSON array
/// serialized *as a string*, an observed upstream data-quality defect).
fn collect_images(primary: Option<&Value>, gallery: &Option<Value>) -> Vec<String> {
    let mut images: Vec<String> = Vec::new();
    if let Some(value) = primary {
        images.extend(image_candidates(value));
    }
    if let Some(value) = gallery {
        images.extend(image_candidates(value));
    }
    let mut seen = std::collections::HashSet::new();
    images.retain(|url| !url.is_empty() && seen.insert(url.clone()));
    images
}

fn image_candidates(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) if s.trim_start().starts_with('[') => {
            // Stringified JSON array.
            serde_json::from_str::<Vec<String>>(s).unwrap_or_else(|_| vec![s.clone()])
        }
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(ToOwned::to_owned))
            .collect(),
        _ => vec![],
    }
}

// ---------------------------------------------------------------------------
// CJ API response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CjEnvelope<T> {
    code: Option<i64>,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CjAuthData {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CjProductList {
    #[serde(default)]
    list: Vec<CjListItem>,
}

#[derive(Debug, Deserialize)]
struct CjListItem {
    pid: String,
    #[serde(rename = "productNameEn", default)]
    product_name_en: String,
    #[serde(rename = "productName", default)]
    product_name: String,
    #[serde(rename = "sellPrice", default)]
    sell_price: Value,
    #[serde(rename = "productImage", default)]
    product_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CjProductDetail {
    pid: String,
    #[serde(rename = "productNameEn", default)]
    product_name_en: String,
    #[serde(rename = "productName", default)]
    product_name: String,
    #[serde(rename = "sellPrice", default)]
    sell_price: Value,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "productImage", default)]
    product_image: Option<Value>,
    #[serde(rename = "productImageSet", default)]
    product_image_set: Option<Value>,
    #[serde(default)]
    variants: Vec<CjVariant>,
}

impl CjProductDetail {
    fn name(&self) -> &str {
        if self.product_name_en.is_empty() {
            &self.product_name
        } else {
            &self.product_name_en
        }
    }
}

#[derive(Debug, Deserialize)]
struct CjVariant {
    vid: String,
}

#[derive(Debug, Deserialize)]
struct CjFreightOption {
    #[serde(rename = "logisticName", default)]
    logistic_name: String,
    #[serde(rename = "logisticPrice", default)]
    logistic_price: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_candidates_handles_stringified_array() {
        let value = json!("[\"https://img/1.jpg\",\"https://img/2.jpg\"]");
        assert_eq!(
            image_candidates(&value),
            vec!["https://img/1.jpg", "https://img/2.jpg"]
        );
    }

    #[test]
    fn image_candidates_handles_plain_string_and_array() {
        assert_eq!(image_candidates(&json!("https://img/1.jpg")), vec!["https://img/1.jpg"]);
        assert_eq!(
            image_candidates(&json!(["https://img/1.jpg", "https://img/2.jpg"])),
            vec!["https://img/1.jpg", "https://img/2.jpg"]
        );
    }

    #[test]
    fn image_candidates_keeps_unparsable_bracket_string() {
        let value = json!("[not json");
        assert_eq!(image_candidates(&value), vec!["[not json"]);
    }

    #[test]
    fn collect_images_dedupes_primary_against_gallery() {
        let primary = json!("https://img/main.jpg");
        let gallery = Some(json!(["https://img/main.jpg", "https://img/2.jpg"]));
        assert_eq!(
            collect_images(Some(&primary), &gallery),
            vec!["https://img/main.jpg", "https://img/2.jpg"]
        );
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let envelope: CjEnvelope<CjAuthData> =
            serde_json::from_str(r#"{"result": false}"#).unwrap();
        assert!(envelope.data.is_none());
        assert!(envelope.code.is_none());
    }
}

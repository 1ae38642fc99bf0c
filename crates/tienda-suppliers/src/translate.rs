//! Best-effort translation boundary.
//!
//! Supplier search indexes are tuned for English while the storefront runs
//! in Spanish; titles go the other way. Translation is never allowed to
//! block a search or an import, so every call site falls back to the
//! original text on failure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SupplierError;

/// External translation collaborator.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translates `text` into `target_lang` (ISO 639-1 code).
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError`] on transport or protocol failure; callers
    /// treat any error as "keep the original text".
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, SupplierError>;
}

/// Translator that returns the input unchanged. Used when no endpoint is
/// configured and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranslator;

#[async_trait]
impl Translator for NoopTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Result<String, SupplierError> {
        Ok(text.to_owned())
    }
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// Client for a LibreTranslate-compatible `/translate` endpoint.
pub struct HttpTranslator {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpTranslator {
    /// Creates a translator against `endpoint` (the service root; the
    /// `/translate` path is appended per call).
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::InvalidBaseUrl`] for an unparsable endpoint
    /// or [`SupplierError::Http`] if the client cannot be built.
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, SupplierError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let normalised = format!("{}/translate", endpoint.trim_end_matches('/'));
        let endpoint =
            reqwest::Url::parse(&normalised).map_err(|e| SupplierError::InvalidBaseUrl {
                url: normalised.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl Translator for HttpTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, SupplierError> {
        if text.is_empty() {
            return Ok(String::new());
        }
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&serde_json::json!({
                "q": text,
                "source": "auto",
                "target": target_lang,
                "format": "text",
            }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.endpoint.to_string(),
            });
        }
        let body = response.text().await?;
        let parsed: TranslateResponse =
            serde_json::from_str(&body).map_err(|e| SupplierError::Deserialize {
                context: format!("translate(target={target_lang})"),
                source: e,
            })?;
        Ok(parsed.translated_text)
    }
}

/// Best-effort wrapper: translates or keeps the original on any failure.
pub async fn translate_or_original(
    translator: &dyn Translator,
    text: &str,
    target_lang: &str,
) -> String {
    match translator.translate(text, target_lang).await {
        Ok(translated) if !translated.is_empty() => translated,
        Ok(_) => text.to_owned(),
        Err(err) => {
            tracing::warn!(target_lang, error = %err, "translation failed, keeping original text");
            text.to_owned()
        }
    }
}

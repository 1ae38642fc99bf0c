//! Supplier registry and alias resolution.
//!
//! Catalog rows and config refer to suppliers by loosely-spelled names
//! ("cj", "CJDropshipping", "rapidapi"). The registry owns one adapter
//! instance per supplier and resolves any alias, case-insensitively, to
//! it. An unknown name resolves to the configured default adapter with a
//! warning rather than failing the operation; a product whose supplier
//! tag has drifted should still import and fulfill through the default
//! channel.

use std::collections::HashMap;
use std::sync::Arc;

use tienda_core::AppConfig;

use crate::adapter::SupplierAdapter;
use crate::aliexpress::AliExpressAdapter;
use crate::browser::HttpBrowser;
use crate::cj::{CjAdapter, CjSettings};
use crate::error::SupplierError;
use crate::rapidapi::{RapidApiAdapter, RapidApiSettings};
use crate::token::TokenCache;
use crate::translate::{HttpTranslator, NoopTranslator, Translator};

/// Owns every configured supplier adapter and maps aliases onto them.
pub struct SupplierRegistry {
    default_name: String,
    default_adapter: Arc<dyn SupplierAdapter>,
    adapters: HashMap<String, Arc<dyn SupplierAdapter>>,
}

impl std::fmt::Debug for SupplierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplierRegistry")
            .field("default_name", &self.default_name)
            .field("aliases", &self.adapters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SupplierRegistry {
    /// Builds a registry from explicit entries, for tests and embedding.
    ///
    /// Each entry is `(canonical_name, aliases, adapter)`. The canonical
    /// name itself is always registered.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError::UnknownDefaultSupplier`] if `default_name`
    /// names none of the entries.
    pub fn new(
        default_name: &str,
        entries: Vec<(&str, &[&str], Arc<dyn SupplierAdapter>)>,
    ) -> Result<Self, SupplierError> {
        let mut adapters = HashMap::new();
        for (canonical, aliases, adapter) in entries {
            adapters.insert(canonical.to_ascii_lowercase(), Arc::clone(&adapter));
            for alias in aliases {
                adapters.insert(alias.to_ascii_lowercase(), Arc::clone(&adapter));
            }
        }
        let default_name = default_name.to_ascii_lowercase();
        let default_adapter = adapters.get(&default_name).map(Arc::clone).ok_or_else(|| {
            SupplierError::UnknownDefaultSupplier {
                name: default_name.clone(),
            }
        })?;
        Ok(Self {
            default_name,
            default_adapter,
            adapters,
        })
    }

    /// Builds the full production registry from the app configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError`] if an adapter's HTTP client cannot be
    /// constructed.
    pub fn from_config(
        config: &AppConfig,
        token_cache: Arc<dyn TokenCache>,
    ) -> Result<Self, SupplierError> {
        let translator: Arc<dyn Translator> = match &config.translate_endpoint {
            Some(endpoint) => Arc::new(HttpTranslator::new(endpoint, config.http_timeout_secs)?),
            None => Arc::new(NoopTranslator),
        };

        let cj: Arc<dyn SupplierAdapter> = Arc::new(CjAdapter::new(
            CjSettings {
                api_key: config.cj_api_key.clone(),
                target_country: config.target_country.clone(),
                storefront_lang: config.storefront_lang.clone(),
                search_lang: config.search_lang.clone(),
                timeout_secs: config.detail_timeout_secs,
                detail_max_retries: config.detail_max_retries,
                detail_retry_delay_ms: config.detail_retry_delay_ms,
            },
            token_cache,
            Arc::clone(&translator),
        )?);

        let rapidapi: Arc<dyn SupplierAdapter> = Arc::new(RapidApiAdapter::new(
            RapidApiSettings {
                api_key: config.rapidapi_key.clone(),
                host: config.rapidapi_host.clone(),
                timeout_secs: config.detail_timeout_secs,
                detail_max_retries: config.detail_max_retries,
                detail_retry_delay_ms: config.detail_retry_delay_ms,
            },
        )?);

        let browser = Arc::new(HttpBrowser::new(
            &config.scraper_user_agent,
            &format!("{}-ES,{};q=0.9", config.storefront_lang, config.storefront_lang),
            config.scraper_page_timeout_secs,
        ));
        let scraper: Arc<dyn SupplierAdapter> = Arc::new(AliExpressAdapter::new(
            browser,
            config.detail_max_retries,
            config.detail_retry_delay_ms,
        ));

        Self::new(
            &config.default_supplier,
            vec![
                ("cj", &["cjdropshipping"], cj),
                ("aliexpress", &["rapidapi"], rapidapi),
                ("aliexpress-scraper", &["scraper"], scraper),
            ],
        )
    }

    /// Resolves a supplier name or alias to its adapter.
    ///
    /// `None`, empty, and unknown names all fall back to the default
    /// adapter; unknown names additionally log a warning so tag drift in
    /// catalog data is visible.
    #[must_use]
    pub fn resolve(&self, name: Option<&str>) -> Arc<dyn SupplierAdapter> {
        let requested = name.map(str::trim).filter(|s| !s.is_empty());
        if let Some(requested) = requested {
            let key = requested.to_ascii_lowercase();
            if let Some(adapter) = self.adapters.get(&key) {
                return Arc::clone(adapter);
            }
            tracing::warn!(
                supplier = requested,
                default = self.default_name,
                "unknown supplier name, falling back to default adapter"
            );
        }
        self.default()
    }

    /// Returns the default adapter.
    #[must_use]
    pub fn default(&self) -> Arc<dyn SupplierAdapter> {
        Arc::clone(&self.default_adapter)
    }

    /// Canonical adapters, deduplicated, for status reporting.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn SupplierAdapter>> {
        let mut seen = std::collections::HashSet::new();
        let mut out: Vec<Arc<dyn SupplierAdapter>> = Vec::new();
        for adapter in self.adapters.values() {
            if seen.insert(adapter.name()) {
                out.push(Arc::clone(adapter));
            }
        }
        out.sort_by_key(|a| a.name());
        out
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

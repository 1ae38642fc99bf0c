#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    /// Markup applied to the landed cost when computing the sale price.
    pub margin_multiplier: f64,
    /// Fixed per-product cost buffer in cents (payment-fee reserve).
    pub other_costs_cents: i64,
    /// Supplier the registry falls back to for unknown names.
    pub default_supplier: String,
    /// ISO country code used for supplier shipping estimation.
    pub target_country: String,
    /// Language of the storefront (search input, displayed titles).
    pub storefront_lang: String,
    /// Language supplier search indexes are tuned for.
    pub search_lang: String,

    /// CJ Dropshipping API key. Absent key degrades the adapter instead of
    /// failing startup.
    pub cj_api_key: Option<String>,
    pub rapidapi_key: Option<String>,
    pub rapidapi_host: String,
    /// LibreTranslate-compatible endpoint; translation is disabled when
    /// unset.
    pub translate_endpoint: Option<String>,

    pub http_timeout_secs: u64,
    /// Timeout for expensive detail fetches (paid API / page automation).
    pub detail_timeout_secs: u64,
    /// Additional attempts after the first failed detail fetch.
    pub detail_max_retries: u32,
    /// Fixed delay between detail-fetch attempts.
    pub detail_retry_delay_ms: u64,
    pub scraper_user_agent: String,
    /// Bound on waiting for storefront page content to become ready.
    pub scraper_page_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("margin_multiplier", &self.margin_multiplier)
            .field("other_costs_cents", &self.other_costs_cents)
            .field("default_supplier", &self.default_supplier)
            .field("target_country", &self.target_country)
            .field("storefront_lang", &self.storefront_lang)
            .field("search_lang", &self.search_lang)
            .field("cj_api_key", &self.cj_api_key.as_ref().map(|_| "[redacted]"))
            .field(
                "rapidapi_key",
                &self.rapidapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field("rapidapi_host", &self.rapidapi_host)
            .field("translate_endpoint", &self.translate_endpoint)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("detail_timeout_secs", &self.detail_timeout_secs)
            .field("detail_max_retries", &self.detail_max_retries)
            .field("detail_retry_delay_ms", &self.detail_retry_delay_ms)
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_page_timeout_secs", &self.scraper_page_timeout_secs)
            .finish()
    }
}

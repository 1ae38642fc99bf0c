//! Page-automation boundary for scraper-backed adapters.
//!
//! A [`Browser`] opens an isolated [`Page`] per call; the page owns every
//! per-call resource (HTTP session, cookies) and releases it when dropped,
//! on success and failure alike. Scraper adapters must never share a page
//! across calls; leaking one under repeated failures is a correctness
//! bug, which the adapter tests assert with a counting fake.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SupplierError;

/// Factory for isolated page sessions.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a fresh, isolated page. No state is shared with previously
    /// opened pages.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError`] when a session cannot be created.
    async fn open(&self) -> Result<Box<dyn Page>, SupplierError>;
}

/// One navigable page. Dropping the page releases its resources.
#[async_trait]
pub trait Page: Send {
    /// Navigates to `url` and waits for the content to become ready,
    /// bounded by the page timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError`] on transport failure or timeout.
    async fn goto(&mut self, url: &str) -> Result<(), SupplierError>;

    /// Returns the page content after a successful [`Self::goto`].
    ///
    /// # Errors
    ///
    /// Returns [`SupplierError`] when no navigation has happened.
    fn content(&self) -> Result<&str, SupplierError>;
}

/// HTTP-backed [`Browser`]: each page is a fresh `reqwest` client with a
/// realistic desktop user agent and storefront locale, so calls look like
/// independent visitor sessions and tear down with the page.
pub struct HttpBrowser {
    user_agent: String,
    accept_language: String,
    page_timeout: Duration,
}

impl HttpBrowser {
    #[must_use]
    pub fn new(user_agent: &str, accept_language: &str, page_timeout_secs: u64) -> Self {
        Self {
            user_agent: user_agent.to_owned(),
            accept_language: accept_language.to_owned(),
            page_timeout: Duration::from_secs(page_timeout_secs),
        }
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn open(&self) -> Result<Box<dyn Page>, SupplierError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) = reqwest::header::HeaderValue::from_str(&self.accept_language) {
            headers.insert(reqwest::header::ACCEPT_LANGUAGE, value);
        }
        let client = reqwest::Client::builder()
            .timeout(self.page_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .default_headers(headers)
            .build()?;
        Ok(Box::new(HttpPage {
            client,
            body: None,
        }))
    }
}

struct HttpPage {
    client: reqwest::Client,
    body: Option<String>,
}

#[async_trait]
impl Page for HttpPage {
    async fn goto(&mut self, url: &str) -> Result<(), SupplierError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SupplierError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        self.body = Some(response.text().await?);
        Ok(())
    }

    fn content(&self) -> Result<&str, SupplierError> {
        self.body
            .as_deref()
            .ok_or_else(|| SupplierError::UnexpectedStatus {
                status: 0,
                url: "page content requested before navigation".to_owned(),
            })
    }
}

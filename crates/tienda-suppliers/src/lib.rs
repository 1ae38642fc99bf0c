//! Supplier integrations for the tienda catalog.
//!
//! Each dropshipping supplier is wrapped in a [`SupplierAdapter`] that
//! normalizes its search, product-detail, and order surfaces into the
//! shared domain types from `tienda-core`. The [`SupplierRegistry`]
//! resolves supplier names and aliases to adapter instances and is the
//! only entry point callers need.

pub mod adapter;
pub mod aliexpress;
pub mod browser;
pub mod cj;
pub mod error;
pub mod extract;
pub mod rapidapi;
pub mod refine;
pub mod registry;
mod retry;
pub mod token;
pub mod translate;

pub use adapter::{
    is_mock_reference, ConnectionStatus, SupplierAdapter, SupplierOrder, SupplierOrderItem,
};
pub use aliexpress::AliExpressAdapter;
pub use browser::{Browser, HttpBrowser, Page};
pub use cj::{CjAdapter, CjSettings};
pub use error::SupplierError;
pub use extract::extract_external_id;
pub use rapidapi::{RapidApiAdapter, RapidApiSettings};
pub use refine::refine_query;
pub use registry::SupplierRegistry;
pub use token::{MemoryTokenCache, TokenCache};
pub use translate::{HttpTranslator, NoopTranslator, Translator};

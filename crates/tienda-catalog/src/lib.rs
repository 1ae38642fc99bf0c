//! Catalog pipeline: import supplier products, take paid checkouts, and
//! dispatch orders to suppliers.

pub mod checkout;
pub mod fulfill;
pub mod import;

pub use checkout::{handle_checkout, CheckoutError};
pub use fulfill::{fulfill_order, FulfillError, FulfillmentOutcome};
pub use import::{first_image, import_product, to_catalog_row, ImportError};

pub mod app_config;
pub mod config;
pub mod orders;
pub mod pricing;
pub mod products;
pub mod store;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use orders::{CheckoutEvent, CheckoutItem, FulfillmentOrder, NewOrder, OrderLine, OrderStatus};
pub use pricing::{landed_cost, normalize_price, sell_price, PricingPolicy};
pub use products::{CatalogProduct, NewCatalogProduct, SupplierProduct};
pub use store::{MemoryOrderStore, MemoryProductStore, OrderStore, ProductStore, StoreError};

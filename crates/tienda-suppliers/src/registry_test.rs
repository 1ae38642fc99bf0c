use std::sync::Arc;

use async_trait::async_trait;
use tienda_core::SupplierProduct;

use super::SupplierRegistry;
use crate::adapter::{ConnectionStatus, SupplierAdapter, SupplierOrder};
use crate::error::SupplierError;

struct FakeAdapter {
    name: &'static str,
}

#[async_trait]
impl SupplierAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn search(&self, _query: &str) -> Vec<SupplierProduct> {
        vec![]
    }

    async fn product_details(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        Err(SupplierError::NotFound {
            supplier: self.name,
            external_id: external_id.to_owned(),
        })
    }

    async fn place_order(&self, _order: &SupplierOrder) -> Result<String, SupplierError> {
        Ok(format!("{}-REF", self.name))
    }

    async fn check_status(&self) -> ConnectionStatus {
        ConnectionStatus::up("fake")
    }
}

fn registry() -> SupplierRegistry {
    let cj: Arc<dyn SupplierAdapter> = Arc::new(FakeAdapter { name: "cj" });
    let rapid: Arc<dyn SupplierAdapter> = Arc::new(FakeAdapter { name: "aliexpress" });
    let scraper: Arc<dyn SupplierAdapter> = Arc::new(FakeAdapter {
        name: "aliexpress-scraper",
    });
    SupplierRegistry::new(
        "cj",
        vec![
            ("cj", &["cjdropshipping"], cj),
            ("aliexpress", &["rapidapi"], rapid),
            ("aliexpress-scraper", &["scraper"], scraper),
        ],
    )
    .unwrap()
}

#[test]
fn canonical_names_resolve() {
    let registry = registry();
    assert_eq!(registry.resolve(Some("cj")).name(), "cj");
    assert_eq!(registry.resolve(Some("aliexpress")).name(), "aliexpress");
    assert_eq!(
        registry.resolve(Some("aliexpress-scraper")).name(),
        "aliexpress-scraper"
    );
}

#[test]
fn aliases_resolve_case_insensitively() {
    let registry = registry();
    assert_eq!(registry.resolve(Some("CJDropshipping")).name(), "cj");
    assert_eq!(registry.resolve(Some("RapidAPI")).name(), "aliexpress");
    assert_eq!(registry.resolve(Some("Scraper")).name(), "aliexpress-scraper");
}

#[test]
fn unknown_and_missing_names_fall_back_to_default() {
    let registry = registry();
    assert_eq!(registry.resolve(Some("shein")).name(), "cj");
    assert_eq!(registry.resolve(Some("  ")).name(), "cj");
    assert_eq!(registry.resolve(None).name(), "cj");
}

#[test]
fn unregistered_default_name_is_rejected_at_construction() {
    let cj: Arc<dyn SupplierAdapter> = Arc::new(FakeAdapter { name: "cj" });
    let err = SupplierRegistry::new("shein", vec![("cj", &[], cj)]).unwrap_err();
    assert!(matches!(
        err,
        SupplierError::UnknownDefaultSupplier { ref name } if name == "shein"
    ));
}

#[test]
fn all_reports_each_adapter_once() {
    let registry = registry();
    let names: Vec<&str> = registry.all().iter().map(|a| a.name()).collect();
    assert_eq!(names, vec!["aliexpress", "aliexpress-scraper", "cj"]);
}

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tienda_core::pricing::PricingPolicy;
use tienda_core::{MemoryProductStore, SupplierProduct};
use tienda_suppliers::{
    ConnectionStatus, SupplierAdapter, SupplierError, SupplierOrder,
};

use super::{first_image, import_product, ImportError};

struct FakeAdapter {
    detail_calls: AtomicUsize,
}

impl FakeAdapter {
    fn new() -> Self {
        Self {
            detail_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SupplierAdapter for FakeAdapter {
    fn name(&self) -> &'static str {
        "cj"
    }

    async fn search(&self, _query: &str) -> Vec<SupplierProduct> {
        vec![]
    }

    async fn product_details(&self, external_id: &str) -> Result<SupplierProduct, SupplierError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if external_id == "4040404040" {
            return Err(SupplierError::NotFound {
                supplier: "cj",
                external_id: external_id.to_owned(),
            });
        }
        Ok(SupplierProduct {
            external_id: external_id.to_owned(),
            title: "Reloj inteligente".to_owned(),
            price_cents: 1234,
            shipping_cents: 250,
            description: "<p>desc</p>".to_owned(),
            images: vec![
                "[\"https://img/main.jpg\",\"https://img/2.jpg\"]".to_owned(),
                "https://img/3.jpg".to_owned(),
            ],
            supplier: "cj".to_owned(),
            source_url: format!("https://cjdropshipping.com/product-detail.html?id={external_id}"),
        })
    }

    async fn place_order(&self, _order: &SupplierOrder) -> Result<String, SupplierError> {
        Ok("CJ-ORDER-MOCK-1".to_owned())
    }

    async fn check_status(&self) -> ConnectionStatus {
        ConnectionStatus::up("fake")
    }
}

#[tokio::test]
async fn url_input_imports_a_priced_row() {
    let adapter = FakeAdapter::new();
    let store = MemoryProductStore::new();
    let policy = PricingPolicy::default();

    let stored = import_product(
        &adapter,
        &store,
        &policy,
        "https://es.aliexpress.com/item/1005010179828716.html",
    )
    .await
    .unwrap();

    assert_eq!(stored.external_id, "1005010179828716");
    assert_eq!(stored.cost_cents, 1234);
    assert_eq!(stored.shipping_cents, 250);
    // (1234 + 250) * 1.5, rounded.
    assert_eq!(stored.sell_cents, 2226);
    assert!(stored.active);
    assert!(!stored.verified);
    // The stringified-array defect is unwrapped on the way in.
    assert_eq!(stored.image, "https://img/main.jpg");
}

#[tokio::test]
async fn reimport_updates_in_place() {
    let adapter = FakeAdapter::new();
    let store = MemoryProductStore::new();
    let policy = PricingPolicy::default();

    let first = import_product(&adapter, &store, &policy, "1005010179828716")
        .await
        .unwrap();
    let second = import_product(&adapter, &store, &policy, "1005010179828716")
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn free_text_is_rejected_before_any_supplier_call() {
    let adapter = FakeAdapter::new();
    let store = MemoryProductStore::new();
    let policy = PricingPolicy::default();

    let err = import_product(&adapter, &store, &policy, "nice blue watch")
        .await
        .unwrap_err();
    assert!(matches!(err, ImportError::NotImportable { .. }));
    assert_eq!(adapter.detail_calls.load(Ordering::SeqCst), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn supplier_not_found_propagates() {
    let adapter = FakeAdapter::new();
    let store = MemoryProductStore::new();
    let policy = PricingPolicy::default();

    let err = import_product(&adapter, &store, &policy, "4040404040")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::Supplier(SupplierError::NotFound { .. })
    ));
    assert!(store.is_empty().await);
}

#[test]
fn first_image_unwraps_stringified_arrays_only() {
    assert_eq!(
        first_image("[\"https://img/a.jpg\",\"https://img/b.jpg\"]"),
        "https://img/a.jpg"
    );
    assert_eq!(first_image("https://img/a.jpg"), "https://img/a.jpg");
    assert_eq!(first_image("[broken"), "[broken");
    assert_eq!(first_image("[]"), "");
}

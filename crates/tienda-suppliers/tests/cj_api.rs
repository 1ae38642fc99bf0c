//! Integration tests for the CJ adapter against a wiremock server.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tienda_suppliers::cj::{CjAdapter, CjSettings};
use tienda_suppliers::token::{MemoryTokenCache, TokenCache};
use tienda_suppliers::translate::Translator;
use tienda_suppliers::{SupplierAdapter, SupplierError};

/// Translator fake with a fixed phrase table. Unknown input passes
/// through unchanged.
struct TableTranslator;

#[async_trait]
impl Translator for TableTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, SupplierError> {
        let out = match (text, target_lang) {
            ("reloj inteligente deportivo", "en") => "sports smart watch",
            ("Sports Smart Watch Pro", "es") => "Reloj Inteligente Deportivo Pro",
            _ => text,
        };
        Ok(out.to_owned())
    }
}

fn settings() -> CjSettings {
    CjSettings {
        api_key: Some("test-key".to_owned()),
        target_country: "US".to_owned(),
        storefront_lang: "es".to_owned(),
        search_lang: "en".to_owned(),
        timeout_secs: 5,
        detail_max_retries: 2,
        detail_retry_delay_ms: 10,
    }
}

fn adapter(server: &MockServer) -> CjAdapter {
    CjAdapter::with_base_url(
        settings(),
        Arc::new(MemoryTokenCache::new()),
        Arc::new(TableTranslator),
        &server.uri(),
    )
    .unwrap()
}

async fn mount_auth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/authentication/getAccessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "result": true,
            "data": { "accessToken": "token-1" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn detail_body() -> serde_json::Value {
    json!({
        "code": 200,
        "result": true,
        "data": {
            "pid": "CJ123456789",
            "productNameEn": "Sports Smart Watch Pro",
            "sellPrice": "12.34",
            "description": "<p>desc</p>",
            "productImage": "https://img/main.jpg",
            "productImageSet": "[\"https://img/main.jpg\",\"https://img/2.jpg\"]",
            "variants": []
        }
    })
}

#[tokio::test]
async fn concurrent_detail_calls_authenticate_once() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .mount(&server)
        .await;

    let adapter = Arc::new(adapter(&server));
    let a = Arc::clone(&adapter);
    let b = Arc::clone(&adapter);
    let (first, second) = tokio::join!(
        a.product_details("CJ123456789"),
        b.product_details("CJ123456789"),
    );
    assert!(first.is_ok());
    assert!(second.is_ok());
    // The auth mock's expect(1) verifies single-flight on drop.
}

#[tokio::test]
async fn detail_normalizes_images_and_price() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .and(query_param("pid", "CJ123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .mount(&server)
        .await;

    let product = adapter(&server).product_details("CJ123456789").await.unwrap();
    assert_eq!(product.external_id, "CJ123456789");
    assert_eq!(product.title, "Reloj Inteligente Deportivo Pro");
    assert_eq!(product.price_cents, 1234);
    assert_eq!(product.shipping_cents, 0);
    assert_eq!(
        product.images,
        vec!["https://img/main.jpg", "https://img/2.jpg"]
    );
}

#[tokio::test]
async fn detail_includes_cheapest_freight_option() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    let mut body = detail_body();
    body["data"]["variants"] = json!([{ "vid": "V1" }]);
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/logistic/freightCalculate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": [
                { "logisticName": "CJPacket", "logisticPrice": "5.00" },
                { "logisticName": "YunExpress", "logisticPrice": "2.50" },
                { "logisticName": "Free-but-bogus", "logisticPrice": 0 }
            ]
        })))
        .mount(&server)
        .await;

    let product = adapter(&server).product_details("CJ123456789").await.unwrap();
    assert_eq!(product.shipping_cents, 250);
}

#[tokio::test]
async fn missing_product_maps_to_not_found_without_retry() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "result": false,
            "message": "product not exists",
            "data": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = adapter(&server).product_details("GONE").await.unwrap_err();
    assert!(matches!(
        err,
        SupplierError::NotFound { supplier: "cj", .. }
    ));
}

#[tokio::test]
async fn auth_http_429_is_a_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authentication/getAccessToken"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = adapter(&server).product_details("CJ123456789").await.unwrap_err();
    assert!(matches!(err, SupplierError::RateLimited { supplier: "cj", .. }));
}

#[tokio::test]
async fn auth_application_code_1600200_is_a_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authentication/getAccessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 1_600_200,
            "result": false,
            "message": "Too much request, QPS limit",
            "data": null
        })))
        .mount(&server)
        .await;

    let err = adapter(&server).product_details("CJ123456789").await.unwrap_err();
    assert!(matches!(err, SupplierError::RateLimited { supplier: "cj", .. }));
}

#[tokio::test]
async fn search_refines_query_and_maps_results() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/product/list"))
        .and(query_param("productName", "sports smart watch"))
        .and(query_param("pageSize", "48"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "data": {
                "list": [
                    {
                        "pid": "CJ111",
                        "productNameEn": "Sports Smart Watch Pro",
                        "sellPrice": 9.99,
                        "productImage": "https://img/watch.jpg"
                    },
                    {
                        "pid": "CJ222",
                        "productNameEn": "Fitness Band",
                        "sellPrice": "no price"
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let results = adapter(&server).search("reloj inteligente deportivo").await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].external_id, "CJ111");
    assert_eq!(results[0].title, "Reloj Inteligente Deportivo Pro");
    assert_eq!(results[0].price_cents, 999);
    assert_eq!(results[0].supplier, "cj");
    // Unparsable prices normalize to zero instead of failing the search.
    assert_eq!(results[1].price_cents, 0);
}

#[tokio::test]
async fn search_failure_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authentication/getAccessToken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let results = adapter(&server).search("reloj inteligente deportivo").await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn missing_api_key_is_reported_not_panicked() {
    let server = MockServer::start().await;
    let mut settings = settings();
    settings.api_key = None;
    let adapter = CjAdapter::with_base_url(
        settings,
        Arc::new(MemoryTokenCache::new()),
        Arc::new(TableTranslator),
        &server.uri(),
    )
    .unwrap();

    let err = adapter.product_details("CJ123456789").await.unwrap_err();
    assert!(matches!(
        err,
        SupplierError::MissingCredential { var: "CJD_API_KEY", .. }
    ));
    let status = adapter.check_status().await;
    assert!(!status.connected);
}

#[tokio::test]
async fn cached_token_survives_across_adapter_instances() {
    let server = MockServer::start().await;
    mount_auth(&server).await;
    Mock::given(method("GET"))
        .and(path("/product/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_body()))
        .mount(&server)
        .await;

    let cache: Arc<dyn TokenCache> = Arc::new(MemoryTokenCache::new());
    let first = CjAdapter::with_base_url(
        settings(),
        Arc::clone(&cache),
        Arc::new(TableTranslator),
        &server.uri(),
    )
    .unwrap();
    first.product_details("CJ123456789").await.unwrap();

    let second = CjAdapter::with_base_url(
        settings(),
        Arc::clone(&cache),
        Arc::new(TableTranslator),
        &server.uri(),
    )
    .unwrap();
    second.product_details("CJ123456789").await.unwrap();
    // expect(1) on the auth mock: the second instance reused the token.
}

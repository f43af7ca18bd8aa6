//! Integration tests for the carrier proxies and the blog.

use furnish_integration_tests::{
    CARRIER_KEY, FakeSanity, FakeShipEngine, blog_dir, browser, fake_shipengine, shipengine_config,
    spawn_storefront, spawn_storefront_with, storefront_config,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

async fn with_carrier(sanity: &FakeSanity, carrier: &FakeShipEngine) -> String {
    let mut config = storefront_config(sanity, None);
    config.shipengine = Some(shipengine_config(carrier));
    spawn_storefront_with(config).await
}

// ============================================================================
// Shipping
// ============================================================================

#[tokio::test]
async fn test_rates_pass_through() {
    let sanity = FakeSanity::start().await;
    let carrier = FakeShipEngine::start().await;
    let base_url = with_carrier(&sanity, &carrier).await;

    let resp = browser()
        .post(format!("{base_url}/api/shipengine/get-rates"))
        .json(&json!({
            "shipToAddress": { "name": "Ada", "postal_code": "10001", "country_code": "US" },
            "packages": [{ "weight": { "value": 40, "unit": "pound" } }],
        }))
        .send()
        .await
        .expect("Failed to quote rates");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse rates");
    assert_eq!(body["rates"][0]["rate_id"], fake_shipengine::RATE_ID);
    assert_eq!(body["rates"][0]["shipping_amount"]["amount"], 18.4);

    assert_eq!(carrier.api_keys(), vec![CARRIER_KEY.to_string()]);
    let sent = &carrier.requests()[0];
    assert_eq!(sent["shipment"]["ship_to"]["postal_code"], "10001");
    assert_eq!(sent["shipment"]["ship_from"]["city_locality"], "Austin");
    assert_eq!(sent["shipment"]["ship_from"]["address_residential_indicator"], "no");
    assert_eq!(sent["rate_options"]["carrier_ids"], json!(["se-1"]));
}

#[tokio::test]
async fn test_rates_require_package_list() {
    let sanity = FakeSanity::start().await;
    let carrier = FakeShipEngine::start().await;
    let base_url = with_carrier(&sanity, &carrier).await;

    let resp = browser()
        .post(format!("{base_url}/api/shipengine/get-rates"))
        .json(&json!({ "shipToAddress": {}, "packages": { "weight": 4 } }))
        .send()
        .await
        .expect("Failed to quote rates");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(carrier.requests().is_empty());
}

#[tokio::test]
async fn test_label_and_tracking() {
    let sanity = FakeSanity::start().await;
    let carrier = FakeShipEngine::start().await;
    let base_url = with_carrier(&sanity, &carrier).await;
    let client = browser();

    let resp = client
        .post(format!("{base_url}/api/shipengine/create-label"))
        .json(&json!({ "rateId": fake_shipengine::RATE_ID }))
        .send()
        .await
        .expect("Failed to buy label");
    assert_eq!(resp.status(), StatusCode::OK);
    let label: Value = resp.json().await.expect("Failed to parse label");
    assert_eq!(label["label_id"], fake_shipengine::LABEL_ID);

    let resp = client
        .get(format!(
            "{base_url}/api/shipengine/tracking/{}",
            fake_shipengine::LABEL_ID
        ))
        .send()
        .await
        .expect("Failed to track label");
    assert_eq!(resp.status(), StatusCode::OK);
    let tracking: Value = resp.json().await.expect("Failed to parse tracking");
    assert_eq!(tracking["status_code"], "IT");

    let resp = client
        .post(format!("{base_url}/api/shipengine/create-label"))
        .json(&json!({ "rateId": "  " }))
        .send()
        .await
        .expect("Failed to buy label");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Carrier rejections surface without the upstream body.
    let resp = client
        .post(format!("{base_url}/api/shipengine/create-label"))
        .json(&json!({ "rateId": "se-rate-stale" }))
        .send()
        .await
        .expect("Failed to buy label");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["error"], "Shipping service error");
}

#[tokio::test]
async fn test_shipping_without_carrier_key() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;

    let resp = browser()
        .get(format!("{base_url}/api/shipengine/tracking/se-label-1"))
        .send()
        .await
        .expect("Failed to track label");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["error"], "Shipping is not configured");
}

// ============================================================================
// Blog
// ============================================================================

#[tokio::test]
async fn test_blog_posts() {
    let sanity = FakeSanity::start().await;
    let mut config = storefront_config(&sanity, None);
    config.blog_dir = blog_dir();
    let base_url = spawn_storefront_with(config).await;
    let client = browser();

    let resp = client
        .get(format!("{base_url}/api/blog"))
        .send()
        .await
        .expect("Failed to list posts");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["cache-control"], "public, max-age=300");
    let posts: Value = resp.json().await.expect("Failed to parse posts");
    let slugs: Vec<&str> = posts
        .as_array()
        .expect("post list")
        .iter()
        .filter_map(|post| post["slug"].as_str())
        .collect();
    assert_eq!(
        slugs,
        ["caring-for-solid-wood", "choosing-a-sofa", "small-space-bedrooms"]
    );
    assert!(posts[0].get("contentHtml").is_none());

    let post: Value = client
        .get(format!("{base_url}/api/blog/choosing-a-sofa"))
        .send()
        .await
        .expect("Failed to get post")
        .json()
        .await
        .expect("Failed to parse post");
    assert_eq!(post["title"], "Choosing a Sofa That Lasts");
    assert_eq!(post["date"], "2025-02-01");
    assert!(
        post["contentHtml"]
            .as_str()
            .is_some_and(|html| html.contains("Fabric</h2>"))
    );

    let resp = client
        .get(format!("{base_url}/api/blog/no-such-post"))
        .send()
        .await
        .expect("Failed to get post");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("Failed to parse body");
    assert_eq!(body["error"], "Post not found");
}

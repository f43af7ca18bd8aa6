//! Integration tests for the session cart and wishlist.

use furnish_integration_tests::{FakeSanity, browser, spawn_storefront};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

async fn add(client: &Client, base_url: &str, item: Value) -> Value {
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&item)
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse cart")
}

async fn cart(client: &Client, base_url: &str) -> Value {
    client
        .get(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to get cart")
        .json()
        .await
        .expect("Failed to parse cart")
}

#[tokio::test]
async fn test_add_merges_lines() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;
    let client = browser();

    add(&client, &base_url, json!({ "id": "oak-table", "name": "Oak Table", "price": 200.0 })).await;
    let body = add(
        &client,
        &base_url,
        json!({ "id": "oak-table", "name": "Oak Table", "price": 200.0, "quantity": 2 }),
    )
    .await;

    let items = body["items"].as_array().expect("cart items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(body["count"], 3);
    assert_eq!(body["total"].as_f64(), Some(600.0));
}

#[tokio::test]
async fn test_cart_is_per_visitor() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;

    let alice = browser();
    let bob = browser();
    add(&alice, &base_url, json!({ "id": "pine-bed", "name": "Pine Bed", "price": 450.0 })).await;

    assert_eq!(cart(&alice, &base_url).await["count"], 1);
    assert_eq!(cart(&bob, &base_url).await["count"], 0);
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;
    let client = browser();

    add(&client, &base_url, json!({ "id": "oak-table", "name": "Oak Table", "price": 200.0 })).await;
    add(&client, &base_url, json!({ "id": "pine-bed", "name": "Pine Bed", "price": 450.0 })).await;

    let resp = client
        .patch(format!("{base_url}/api/cart/items/oak-table"))
        .json(&json!({ "quantity": 0 }))
        .send()
        .await
        .expect("Failed to update line");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse cart");
    // Quantities are clamped to at least one.
    assert_eq!(body["items"][0]["quantity"], 1);

    let resp = client
        .patch(format!("{base_url}/api/cart/items/missing"))
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .expect("Failed to update line");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .delete(format!("{base_url}/api/cart/items/pine-bed"))
        .send()
        .await
        .expect("Failed to remove line");
    let body: Value = resp.json().await.expect("Failed to parse cart");
    assert_eq!(body["count"], 1);
    assert_eq!(body["total"].as_f64(), Some(200.0));

    let resp = client
        .delete(format!("{base_url}/api/cart"))
        .send()
        .await
        .expect("Failed to clear cart");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(cart(&client, &base_url).await["count"], 0);
}

#[tokio::test]
async fn test_negative_price_rejected() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;

    let resp = browser()
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({ "id": "oak-table", "name": "Oak Table", "price": -1.0 }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wishlist_add_and_remove() {
    let sanity = FakeSanity::start().await;
    let base_url = spawn_storefront(&sanity, None).await;
    let client = browser();

    let item = json!({ "id": "oak-table", "name": "Oak Table", "price": 200.0 });
    for _ in 0..2 {
        let resp = client
            .post(format!("{base_url}/api/wishlist/items"))
            .json(&item)
            .send()
            .await
            .expect("Failed to save to wishlist");
        assert!(resp.status().is_success());
    }

    let body: Value = client
        .get(format!("{base_url}/api/wishlist"))
        .send()
        .await
        .expect("Failed to get wishlist")
        .json()
        .await
        .expect("Failed to parse wishlist");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));

    let resp = client
        .delete(format!("{base_url}/api/wishlist/items/oak-table"))
        .send()
        .await
        .expect("Failed to remove from wishlist");
    assert!(resp.status().is_success());
}

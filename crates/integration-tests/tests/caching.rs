//! Gateway caching behavior as seen through the services.

use std::time::Duration;

use mirra_backend::config::CacheTtls;
use mirra_backend::services::{CheckoutItem, ProductFilter};
use mirra_backend::store::{collections, DocumentStore};

use mirra_integration_tests::TestContext;

#[tokio::test]
async fn repeated_listings_hit_the_cache() {
    let ctx = TestContext::new().await;
    ctx.add_product("Musk Attar", 90, 3).await;

    let filter = ProductFilter::default();
    ctx.catalog.list(&filter).await.expect("list");
    let reads = ctx.store.read_count();

    for _ in 0..5 {
        ctx.catalog.list(&filter).await.expect("list");
    }
    assert_eq!(ctx.store.read_count(), reads, "listings must be served from cache");
}

#[tokio::test]
async fn writes_invalidate_the_collection() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Clay Mask", 40, 3).await;

    let filter = ProductFilter::default();
    ctx.catalog.list(&filter).await.expect("list");

    ctx.catalog
        .set_active(&product.id, false)
        .await
        .expect("hide");

    let page = ctx.catalog.list(&filter).await.expect("list");
    assert!(
        !page.items[0].active,
        "listing after a write must reflect the write"
    );
}

#[tokio::test]
async fn checkout_sees_fresh_stock_despite_a_warm_cache() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Hair Serum", 35, 2).await;

    // Warm the per-document cache.
    ctx.catalog.get(&product.id).await.expect("get");

    // Mutate stock behind the gateway's back.
    ctx.store
        .update(
            collections::PRODUCTS,
            product.id.as_str(),
            serde_json::json!({ "stock": 0, "active": false }),
        )
        .await
        .expect("direct update");

    // Checkout reads stock fresh and must refuse.
    ctx.orders
        .checkout(TestContext::checkout_request(
            None,
            vec![CheckoutItem {
                product_id: product.id.clone(),
                quantity: 1,
            }],
        ))
        .await
        .expect_err("stale cache must not sell missing stock");
}

#[tokio::test]
async fn entries_expire_on_their_collection_ttl() {
    let ttls = CacheTtls::default().with_ttl(collections::PRODUCTS, Duration::from_millis(200));
    let ctx = TestContext::with_ttls(ttls).await;
    let product = ctx.add_product("Night Cream", 70, 3).await;

    ctx.catalog.get(&product.id).await.expect("get");
    let reads = ctx.store.read_count();

    ctx.catalog.get(&product.id).await.expect("get");
    assert_eq!(ctx.store.read_count(), reads);

    tokio::time::sleep(Duration::from_millis(400)).await;
    ctx.catalog.get(&product.id).await.expect("get");
    assert!(
        ctx.store.read_count() > reads,
        "expired entries must be re-read from the store"
    );
}

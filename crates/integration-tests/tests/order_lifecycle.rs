//! Order status machine and stock restoration across the stack.

use mirra_backend::services::{CheckoutItem, OrderError};
use mirra_core::{OrderStatus, PaymentStatus};

use mirra_integration_tests::TestContext;

async fn placed_order(ctx: &TestContext) -> (mirra_backend::models::Order, mirra_core::ProductId) {
    let product = ctx.add_product("Amber Night", 120, 5).await;
    let order = ctx
        .orders
        .checkout(TestContext::checkout_request(
            None,
            vec![CheckoutItem {
                product_id: product.id.clone(),
                quantity: 2,
            }],
        ))
        .await
        .expect("checkout");
    (order, product.id)
}

#[tokio::test]
async fn full_happy_path_to_delivered() {
    let ctx = TestContext::new().await;
    let (order, _) = placed_order(&ctx).await;

    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        ctx.orders
            .set_status(&order.id, status, "staff@mirrabeauty.store", None)
            .await
            .expect("transition");
    }

    let order = ctx.orders.get(&order.id).await.expect("get");
    assert_eq!(order.status, OrderStatus::Delivered);
    // Delivery completes the payment.
    assert_eq!(order.payment_status, PaymentStatus::Completed);
    // Placement plus four transitions.
    assert_eq!(order.history.len(), 5);
    assert_eq!(order.history[0].status, OrderStatus::Pending);
    assert_eq!(order.history[0].actor, "storefront");
    assert_eq!(order.history[4].actor, "staff@mirrabeauty.store");
}

#[tokio::test]
async fn delivered_orders_cannot_be_cancelled() {
    let ctx = TestContext::new().await;
    let (order, _) = placed_order(&ctx).await;

    ctx.orders
        .set_status(&order.id, OrderStatus::Delivered, "staff", None)
        .await
        .expect("deliver");

    let err = ctx
        .orders
        .cancel(&order.id, "staff", None)
        .await
        .expect_err("must reject");
    assert!(matches!(
        err,
        OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        }
    ));

    // Refund remains available after delivery.
    let order = ctx
        .orders
        .set_status(&order.id, OrderStatus::Refunded, "staff", None)
        .await
        .expect("refund");
    assert_eq!(order.payment_status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn cancel_restores_stock_exactly_once() {
    let ctx = TestContext::new().await;
    let (order, product_id) = placed_order(&ctx).await;

    let before = ctx.catalog.get(&product_id).await.expect("get").stock;
    assert_eq!(before, 3);

    let cancelled = ctx
        .orders
        .cancel(&order.id, "staff", Some("customer request".to_owned()))
        .await
        .expect("cancel");
    assert!(cancelled.stock_restored);
    assert_eq!(cancelled.payment_status, PaymentStatus::Refunded);
    assert_eq!(ctx.catalog.get(&product_id).await.expect("get").stock, 5);

    // Deleting the cancelled order must not restore again.
    ctx.orders.delete(&order.id).await.expect("delete");
    assert_eq!(ctx.catalog.get(&product_id).await.expect("get").stock, 5);
    assert!(matches!(
        ctx.orders.get(&order.id).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_an_open_order_restores_stock() {
    let ctx = TestContext::new().await;
    let (order, product_id) = placed_order(&ctx).await;

    ctx.orders.delete(&order.id).await.expect("delete");
    let product = ctx.catalog.get(&product_id).await.expect("get");
    assert_eq!(product.stock, 5);
    assert!(product.active);
}

#[tokio::test]
async fn cancelling_a_sold_out_product_reactivates_it() {
    let ctx = TestContext::new().await;
    let product = ctx.add_product("Jasmine Oil", 60, 1).await;

    let order = ctx
        .orders
        .checkout(TestContext::checkout_request(
            None,
            vec![CheckoutItem {
                product_id: product.id.clone(),
                quantity: 1,
            }],
        ))
        .await
        .expect("checkout");
    assert!(!ctx.catalog.get(&product.id).await.expect("get").active);

    ctx.orders.cancel(&order.id, "staff", None).await.expect("cancel");
    let product = ctx.catalog.get(&product.id).await.expect("get");
    assert_eq!(product.stock, 1);
    assert!(product.active);
}

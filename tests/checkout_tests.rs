mod common;

use axum::http::{Method, StatusCode};
use cafe::payment::webhook;
use chrono::Utc;
use common::{checkout_completed, line, FakeGateway, TestContext, WEBHOOK_SECRET};
use entity::{
    order::{self, DrinkSize},
    processed_event,
    sea_orm_active_enums::{OrderStatus, PaymentStatus, Tier},
    temp_checkout,
};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sea_orm::{prelude::Decimal, EntityTrait, PaginatorTrait};
use serde_json::json;

async fn start(ctx: &TestContext, token: &str) -> serde_json::Value {
    let latte = ctx.drink_id("Latte").await;
    let drip = ctx.drink_id("Drip Coffee").await;
    let oat = ctx.milk_id("Oat").await;
    let vanilla = ctx.syrup_id("Vanilla").await;
    let caramel = ctx.syrup_id("Caramel").await;

    let (status, body) = ctx
        .call(
            Method::POST,
            "/api/checkout",
            Some(token),
            Some(json!({
                "items": [
                    {
                        "drink_id": latte,
                        "size": "large",
                        "quantity": 2,
                        "milk_id": oat,
                        "syrup_ids": [vanilla, caramel]
                    },
                    { "drink_id": drip, "size": "small", "quantity": 1 }
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn checkout_prices_cart_and_parks_it() {
    let ctx = TestContext::new().await;
    let token = ctx.token("ada");

    let body = start(&ctx, &token).await;

    // 2 x (4.50 + 1.00 large + 0.75 oat + 0.50 + 0.50) + 2.50
    let total: Decimal = body["total"].as_str().unwrap().parse().unwrap();
    assert_eq!(total, dec!(17.00));
    assert_eq!(body["session_id"], json!("cs_test_1"));
    assert_eq!(body["url"], json!("https://pay.test/cs_test_1"));

    let request = ctx.gateway.last_request().unwrap();
    assert_eq!(request.reference, body["checkout_id"].as_str().unwrap());
    assert_eq!(request.customer_email, "ada@example.com");
    assert_eq!(request.lines.len(), 2);
    assert_eq!(request.lines[0].name, "Latte (large; Oat, Vanilla, Caramel)");
    assert_eq!(request.lines[0].unit_amount, dec!(7.25));
    assert_eq!(request.lines[1].name, "Drip Coffee (small)");
    assert!(request.success_url.starts_with("https://cafe.test/orders/success"));
    assert_eq!(request.cancel_url, "https://cafe.test/cart");

    let parked = temp_checkout::Entity::find().all(ctx.db()).await.unwrap();
    assert_eq!(parked.len(), 1);
    assert_eq!(parked[0].session_id.as_deref(), Some("cs_test_1"));
    assert_eq!(parked[0].items.quantity(), 3);
}

#[tokio::test]
async fn checkout_requires_sign_in_and_a_valid_cart() {
    let ctx = TestContext::new().await;
    let token = ctx.token("ada");

    let (status, _) = ctx
        .call(Method::POST, "/api/checkout", None, Some(json!({ "items": [] })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx
        .call(Method::POST, "/api/checkout", Some(&token), Some(json!({ "items": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Cart is empty"));

    let americano = ctx.drink_id("Americano").await;
    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({ "items": [{ "drink_id": americano, "quantity": 1, "milk_id": 1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({ "items": [{ "drink_id": americano, "quantity": 21 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .call(
            Method::POST,
            "/api/checkout",
            Some(&token),
            Some(json!({ "items": [{ "drink_id": americano, "quantity": "two" }] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quantity"), "{body}");
    assert!(ctx.gateway.last_request().is_none());
}

#[tokio::test]
async fn gateway_failure_drops_the_parked_cart() {
    let ctx = TestContext::with_gateway(FakeGateway::failing()).await;
    let drip = ctx.drink_id("Drip Coffee").await;

    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/checkout",
            Some(&ctx.token("ada")),
            Some(json!({ "items": [{ "drink_id": drip, "quantity": 1 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn completed_payment_creates_order_and_awards_points_once() {
    let ctx = TestContext::new().await;
    let token = ctx.token("ada");
    let started = start(&ctx, &token).await;
    let reference = started["checkout_id"].as_str().unwrap();

    let event = checkout_completed("evt_1", "cs_test_1", reference, 1700);
    let (status, body) = ctx.deliver(&event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("order_created"));

    let orders = order::Entity::find().all(ctx.db()).await.unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.total, dec!(17.00));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.session_id, "cs_test_1");
    assert_eq!(order.payment_intent.as_deref(), Some("pi_cs_test_1"));
    assert_eq!(order.points_awarded, 17);
    assert_eq!(order.items.0.len(), 2);
    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 0);

    let customer = ctx.user(order.user_id).await;
    assert_eq!(customer.points, 17);
    assert_eq!(customer.lifetime_points, 17);

    // Same event delivered again.
    let (status, body) = ctx.deliver(&event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("duplicate"));

    // A different event for the same session.
    let again = checkout_completed("evt_2", "cs_test_1", reference, 1700);
    let (_, body) = ctx.deliver(&again).await;
    assert_eq!(body["outcome"], json!("duplicate"));

    assert_eq!(order::Entity::find().count(ctx.db()).await.unwrap(), 1);
    assert_eq!(ctx.user(order.user_id).await.points, 17);
    assert_eq!(processed_event::Entity::find().count(ctx.db()).await.unwrap(), 2);
}

#[tokio::test]
async fn completion_falls_back_to_session_id() {
    let ctx = TestContext::new().await;
    start(&ctx, &ctx.token("ada")).await;

    let mut event = checkout_completed("evt_1", "cs_test_1", "unknown", 1700);
    event["data"]["object"]["client_reference_id"] = serde_json::Value::Null;
    let (_, body) = ctx.deliver(&event).await;

    assert_eq!(body["outcome"], json!("order_created"));
}

#[tokio::test]
async fn unmatched_and_unpaid_sessions_create_nothing() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .deliver(&checkout_completed("evt_1", "cs_nope", "missing", 500))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("unmatched"));

    let mut unpaid = checkout_completed("evt_2", "cs_nope", "missing", 500);
    unpaid["data"]["object"]["payment_status"] = json!("unpaid");
    let (_, body) = ctx.deliver(&unpaid).await;
    assert_eq!(body["outcome"], json!("ignored"));

    let (_, body) = ctx
        .deliver(&json!({ "id": "evt_3", "type": "invoice.paid", "data": { "object": {} } }))
        .await;
    assert_eq!(body["outcome"], json!("ignored"));

    assert_eq!(order::Entity::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn expired_session_discards_the_parked_cart() {
    let ctx = TestContext::new().await;
    let started = start(&ctx, &ctx.token("ada")).await;

    let event = json!({
        "id": "evt_exp",
        "type": "checkout.session.expired",
        "data": { "object": {
            "id": "cs_test_1",
            "client_reference_id": started["checkout_id"],
            "payment_status": "unpaid"
        } }
    });
    let (status, body) = ctx.deliver(&event).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("expired"));
    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 0);
    assert_eq!(order::Entity::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn delayed_payment_is_fulfilled_when_it_succeeds() {
    let ctx = TestContext::new().await;
    let started = start(&ctx, &ctx.token("ada")).await;
    let reference = started["checkout_id"].as_str().unwrap();

    let mut pending = checkout_completed("evt_1", "cs_test_1", reference, 1700);
    pending["data"]["object"]["payment_status"] = json!("unpaid");
    let (status, body) = ctx.deliver(&pending).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("ignored"));
    assert_eq!(order::Entity::find().count(ctx.db()).await.unwrap(), 0);
    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 1);

    let mut succeeded = checkout_completed("evt_2", "cs_test_1", reference, 1700);
    succeeded["type"] = json!("checkout.session.async_payment_succeeded");
    let (status, body) = ctx.deliver(&succeeded).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("order_created"));

    let (_, body) = ctx.deliver(&succeeded).await;
    assert_eq!(body["outcome"], json!("duplicate"));

    let orders = order::Entity::find().all(ctx.db()).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].payment_status, PaymentStatus::Paid);
    let customer = ctx.user(orders[0].user_id).await;
    assert_eq!(customer.points, 17);
    assert_eq!(customer.lifetime_points, 17);
    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn failed_delayed_payment_discards_the_parked_cart() {
    let ctx = TestContext::new().await;
    let started = start(&ctx, &ctx.token("ada")).await;

    let event = json!({
        "id": "evt_fail",
        "type": "checkout.session.async_payment_failed",
        "data": { "object": {
            "id": "cs_test_1",
            "client_reference_id": started["checkout_id"],
            "payment_status": "unpaid"
        } }
    });
    let (status, body) = ctx.deliver(&event).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], json!("failed"));

    assert_eq!(temp_checkout::Entity::find().count(ctx.db()).await.unwrap(), 0);
    assert_eq!(order::Entity::find().count(ctx.db()).await.unwrap(), 0);
    let recorded = processed_event::Entity::find_by_id("evt_fail".to_owned())
        .one(ctx.db())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(recorded.kind, "checkout.failed");
}

#[tokio::test]
async fn webhook_rejects_bad_signatures() {
    let ctx = TestContext::new().await;
    let payload = checkout_completed("evt_1", "cs_1", "ref", 100).to_string();

    let (status, _) = ctx.deliver_raw(payload.clone(), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let forged = webhook::sign(payload.as_bytes(), "not-the-secret", Utc::now().timestamp());
    let (status, _) = ctx.deliver_raw(payload.clone(), Some(forged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let stale = webhook::sign(payload.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp() - 3600);
    let (status, _) = ctx.deliver_raw(payload, Some(stale)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(processed_event::Entity::find().count(ctx.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn spending_crosses_tier_thresholds() {
    let ctx = TestContext::new().await;
    let customer = ctx.customer("ada").await;
    assert_eq!(customer.tier, Tier::Bronze);

    let cold_brew = ctx.drink_id("Cold Brew").await;
    // 20 x (4.00 + 1.00 large) = 100.00
    let order = ctx
        .paid_order(&customer, &[line(cold_brew, DrinkSize::Large, 20)], "evt_a")
        .await;
    assert_eq!(order.points_awarded, 100);
    assert_eq!(ctx.user(customer.id).await.tier, Tier::Bronze);

    let order = ctx
        .paid_order(&customer, &[line(cold_brew, DrinkSize::Large, 20)], "evt_b")
        .await;
    assert_eq!(order.points_awarded, 100);
    let customer = ctx.user(customer.id).await;
    assert_eq!(customer.lifetime_points, 200);
    assert_eq!(customer.tier, Tier::Silver);

    let (status, body) = ctx.call(Method::GET, "/api/me", Some(&ctx.token("ada")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], json!("silver"));
    assert_eq!(body["role"], json!("customer"));
    assert_eq!(body["progress"]["next_tier"], json!("gold"));
    assert_eq!(body["progress"]["points_to_next"], json!(300));
}

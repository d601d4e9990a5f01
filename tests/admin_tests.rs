mod common;

use axum::http::{Method, StatusCode};
use common::{line, TestContext};
use entity::{order::DrinkSize, role, sea_orm_active_enums::Tier};
use pretty_assertions::assert_eq;
use serde_json::json;

fn staff_user(external_id: &str, email: &str) -> serde_json::Value {
    json!({
        "external_id": external_id,
        "email": email,
        "name": "Grace",
        "role": "staff",
        "employee_number": "E-100",
        "store_number": "002"
    })
}

#[tokio::test]
async fn admin_creates_staff_users() {
    let ctx = TestContext::new().await;
    ctx.admin("root").await;
    let token = ctx.token("root");

    let (status, body) = ctx
        .call(Method::POST, "/api/admin/users", Some(&token), Some(staff_user("idp|grace", "grace@example.com")))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["external_id"], json!("idp|grace"));
    assert_eq!(body["role"], json!("staff"));
    assert_eq!(body["tier"], json!("bronze"));
    assert_eq!(body["points"], json!(0));
    assert_eq!(body["employee_number"], json!("E-100"));

    let (status, _) = ctx
        .call(Method::POST, "/api/admin/users", Some(&token), Some(staff_user("idp|grace", "other@example.com")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = ctx
        .call(Method::POST, "/api/admin/users", Some(&token), Some(staff_user("idp|other", "grace@example.com")))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut unknown_role = staff_user("idp|x", "x@example.com");
    unknown_role["role"] = json!("owner");
    let (status, _) = ctx
        .call(Method::POST, "/api/admin/users", Some(&token), Some(unknown_role))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx.call(Method::GET, "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let emails: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["root@example.com", "grace@example.com"]);
}

#[tokio::test]
async fn only_admins_create_users_and_change_roles() {
    let ctx = TestContext::new().await;
    ctx.employee("boss", role::MANAGER).await;
    let barista = ctx.employee("barista", role::STAFF).await;
    ctx.admin("root").await;

    let (status, _) = ctx
        .call(
            Method::POST,
            "/api/admin/users",
            Some(&ctx.token("boss")),
            Some(staff_user("idp|grace", "grace@example.com")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.call(Method::POST, "/api/admin/users", None, Some(staff_user("a", "b"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let uri = format!("/api/admin/users/{}/role", barista.id);
    let (status, _) = ctx
        .call(Method::PATCH, &uri, Some(&ctx.token("boss")), Some(json!({ "role": "manager" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .call(Method::PATCH, &uri, Some(&ctx.token("root")), Some(json!({ "role": "manager" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("manager"));

    // The promotion takes effect on the next request.
    let (status, _) = ctx
        .call(Method::GET, "/api/admin/dashboard", Some(&ctx.token("barista")), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.call(Method::GET, "/api/admin/roles", Some(&ctx.token("boss")), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body.as_array().unwrap().iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["customer", "staff", "manager", "admin"]);
}

#[tokio::test]
async fn invalid_tokens_are_rejected() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.call(Method::GET, "/api/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid session token"));
}

#[tokio::test]
async fn managers_adjust_points_and_tiers_follow() {
    let ctx = TestContext::new().await;
    ctx.employee("boss", role::MANAGER).await;
    let customer = ctx.customer("ada").await;
    let uri = format!("/api/admin/users/{}/points", customer.id);
    let boss = ctx.token("boss");

    let (status, body) = ctx.call(Method::PATCH, &uri, Some(&boss), Some(json!({ "delta": 520 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], json!(520));
    assert_eq!(body["lifetime_points"], json!(520));
    assert_eq!(body["tier"], json!("gold"));

    let (status, body) = ctx.call(Method::PATCH, &uri, Some(&boss), Some(json!({ "delta": -500 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], json!(20));
    assert_eq!(body["lifetime_points"], json!(520));
    assert_eq!(body["tier"], json!("gold"));

    let (status, _) = ctx.call(Method::PATCH, &uri, Some(&boss), Some(json!({ "delta": -21 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.user(customer.id).await.points, 20);

    let (status, _) = ctx
        .call(Method::PATCH, "/api/admin/users/999/points", Some(&boss), Some(json!({ "delta": 1 })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn out_of_range_point_adjustments_are_rejected() {
    let ctx = TestContext::new().await;
    ctx.employee("boss", role::MANAGER).await;
    let customer = ctx.customer("ada").await;
    let uri = format!("/api/admin/users/{}/points", customer.id);
    let boss = ctx.token("boss");

    let (status, _) = ctx.call(Method::PATCH, &uri, Some(&boss), Some(json!({ "delta": 10 }))).await;
    assert_eq!(status, StatusCode::OK);

    for delta in [i64::MAX, i64::MIN] {
        let (status, body) = ctx.call(Method::PATCH, &uri, Some(&boss), Some(json!({ "delta": delta }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["error"].is_string());
    }

    let customer = ctx.user(customer.id).await;
    assert_eq!(customer.points, 10);
    assert_eq!(customer.lifetime_points, 10);
}

#[tokio::test]
async fn dashboard_and_order_listing() {
    let ctx = TestContext::new().await;
    ctx.employee("boss", role::MANAGER).await;
    let ada = ctx.customer("ada").await;
    let bob = ctx.customer("bob").await;

    let latte = ctx.drink_id("Latte").await;
    let drip = ctx.drink_id("Drip Coffee").await;
    // 3 x 5.50 = 16.50
    ctx.paid_order(&ada, &[line(latte, DrinkSize::Large, 3)], "evt_1").await;
    // 2 x 3.00 + 4.50 = 10.50
    ctx.paid_order(
        &bob,
        &[line(drip, DrinkSize::Medium, 2), line(latte, DrinkSize::Small, 1)],
        "evt_2",
    )
    .await;
    ctx.paid_order(&bob, &[line(drip, DrinkSize::Small, 1)], "evt_3").await;

    let boss = ctx.token("boss");
    let (status, body) = ctx.call(Method::GET, "/api/admin/dashboard", Some(&boss), None).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["total_orders"], json!(3));
    assert_eq!(body["orders_by_status"], json!({ "pending": 3 }));
    assert_eq!(body["customers"], json!(2));
    assert_eq!(body["tiers"], json!({ "bronze": 2 }));
    assert_eq!(body["active_shifts"], json!(0));
    assert_eq!(body["average_rating"], json!(null));
    let revenue: rust_decimal::Decimal = body["revenue"].as_str().unwrap().parse().unwrap();
    assert_eq!(revenue, rust_decimal_macros::dec!(29.50));
    assert_eq!(body["top_drinks"][0]["drink_name"], json!("Latte"));
    assert_eq!(body["top_drinks"][0]["quantity"], json!(4));
    assert_eq!(body["top_drinks"][1]["quantity"], json!(3));

    let (status, body) = ctx
        .call(Method::GET, "/api/admin/orders?per_page=2&page=1", Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_pages"], json!(2));
    assert_eq!(body["orders"].as_array().unwrap().len(), 2);

    let (_, body) = ctx
        .call(Method::GET, "/api/admin/orders?status=completed", Some(&boss), None)
        .await;
    assert_eq!(body["orders"], json!([]));

    let (status, body) = ctx
        .call(
            Method::GET,
            &format!("/api/admin/orders?page={}&per_page=100", u64::MAX),
            Some(&boss),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["orders"], json!([]));
    assert_eq!(body["num_pages"], json!(1));

    let (status, body) = ctx
        .call(Method::GET, "/api/admin/orders?page=two", Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (_, body) = ctx.call(Method::GET, "/api/orders", Some(&ctx.token("bob")), None).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(ctx.user(bob.id).await.tier, Tier::Bronze);
}

#[tokio::test]
async fn managers_maintain_the_menu() {
    let ctx = TestContext::new().await;
    ctx.employee("boss", role::MANAGER).await;
    let boss = ctx.token("boss");

    let (status, category) = ctx
        .call(Method::POST, "/api/admin/categories", Some(&boss), Some(json!({ "name": "Seasonal" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = ctx
        .call(Method::POST, "/api/admin/categories", Some(&boss), Some(json!({ "name": "Seasonal" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, syrup) = ctx
        .call(
            Method::POST,
            "/api/admin/customizations/syrups",
            Some(&boss),
            Some(json!({ "name": "Pumpkin Spice", "price": "0.75" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(syrup["kind"], json!("syrup"));

    let oat = ctx.milk_id("Oat").await;
    let drink = json!({
        "name": "Pumpkin Latte",
        "description": "Autumn only.",
        "base_price": "5.25",
        "category_id": category["id"],
        "milk_ids": [oat],
        "syrup_ids": [syrup["id"]]
    });
    let (status, created) = ctx.call(Method::POST, "/api/admin/drinks", Some(&boss), Some(drink.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["name"], json!("Pumpkin Latte"));
    assert_eq!(created["available"], json!(true));
    assert_eq!(created["milks"].as_array().unwrap().len(), 1);
    assert_eq!(created["syrups"][0]["name"], json!("Pumpkin Spice"));

    let id = created["id"].as_i64().unwrap();
    let (_, menu) = ctx.call(Method::GET, "/api/menu", None, None).await;
    let seasonal = menu
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == json!("Seasonal"))
        .unwrap();
    assert_eq!(seasonal["drinks"][0]["id"], json!(id));

    let mut hidden = drink.clone();
    hidden["available"] = json!(false);
    hidden["syrup_ids"] = json!([]);
    let (status, updated) = ctx
        .call(Method::PUT, &format!("/api/admin/drinks/{id}"), Some(&boss), Some(hidden))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["syrups"], json!([]));

    let (_, menu) = ctx.call(Method::GET, "/api/menu", None, None).await;
    let seasonal = menu
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == json!("Seasonal"))
        .unwrap();
    assert_eq!(seasonal["drinks"], json!([]));

    let mut bad = drink.clone();
    bad["milk_ids"] = json!([999]);
    let (status, _) = ctx.call(Method::POST, "/api/admin/drinks", Some(&boss), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .call(Method::DELETE, &format!("/api/admin/drinks/{id}"), Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx.call(Method::GET, &format!("/api/drinks/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = ctx
        .call(Method::DELETE, &format!("/api/admin/drinks/{id}"), Some(&boss), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

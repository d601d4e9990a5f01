use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

mod admin;
mod checkout;
mod menu;
mod orders;
mod rewards;
mod staff;
mod webhooks;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route("/menu", get(menu::menu))
        .route("/drinks/{id}", get(menu::drink))
        .route("/customizations", get(menu::customizations))
        .route("/me", get(rewards::me))
        .route("/checkout", post(checkout::start))
        .route("/webhooks/payment", post(webhooks::payment))
        .route("/orders", get(orders::list_own))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/review", post(orders::review))
        .route("/rewards", get(rewards::catalog))
        .route("/rewards/redeem", post(rewards::redeem))
        .route("/rewards/history", get(rewards::history))
        .route("/staff/tickets", get(staff::tickets))
        .route("/staff/tickets/{id}", patch(staff::update_ticket))
        .route("/staff/shifts", get(staff::my_shifts))
        .route("/staff/shifts/clock-in", post(staff::clock_in))
        .route("/staff/shifts/clock-out", post(staff::clock_out))
        .route("/staff/inventory", get(staff::inventory).post(staff::log_inventory))
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/orders", get(admin::orders))
        .route("/admin/reviews", get(admin::reviews))
        .route("/admin/users", get(admin::users).post(admin::create_user))
        .route("/admin/users/{id}/role", patch(admin::change_role))
        .route("/admin/users/{id}/points", patch(admin::adjust_points))
        .route("/admin/roles", get(admin::roles))
        .route("/admin/shifts/active", get(admin::active_shifts))
        .route("/admin/payroll", get(admin::payrolls).post(admin::generate_payroll))
        .route("/admin/categories", post(admin::create_category))
        .route("/admin/drinks", post(admin::create_drink))
        .route("/admin/drinks/{id}", put(admin::update_drink).delete(admin::delete_drink))
        .route("/admin/customizations/{kind}", post(admin::create_customization));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

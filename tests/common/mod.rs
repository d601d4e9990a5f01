#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use cafe::{
    auth::{self, Claims},
    config::{Config, PaymentConfig},
    payment::{
        to_minor_units,
        webhook::{self, CheckoutSessionObject},
        CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway,
    },
    pricing::CartLine,
    service::{
        checkout::{complete_checkout, start_checkout, Completion},
        users::{Mutation as UserMutation, NewStaffUser},
    },
    state::AppState,
};
use chrono::Utc;
use entity::{drink, milk, order, order::DrinkSize, role, sauce, syrup, user};
use jsonwebtoken::{encode, EncodingKey, Header};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "test-identity-secret";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Records checkout requests and hands out predictable sessions.
#[derive(Default)]
pub struct FakeGateway {
    pub requests: Mutex<Vec<CheckoutSessionRequest>>,
    pub fail: bool,
    counter: AtomicUsize,
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn last_request(&self) -> Option<CheckoutSessionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(PaymentError::Gateway {
                status: 503,
                body: "unavailable".to_owned(),
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_test_{n}");
        Ok(CheckoutSession {
            url: format!("https://pay.test/{id}"),
            id,
        })
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_owned(),
        host: "127.0.0.1".to_owned(),
        port: 0,
        run_migrations: true,
        auth_jwt_secret: JWT_SECRET.to_owned(),
        payment: PaymentConfig {
            api_base: "https://payments.test".to_owned(),
            api_key: "sk_test".to_owned(),
            webhook_secret: WEBHOOK_SECRET.to_owned(),
            currency: "usd".to_owned(),
            webhook_tolerance_secs: 300,
        },
        public_base_url: "https://cafe.test".to_owned(),
    }
}

pub struct TestContext {
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_gateway(FakeGateway::default()).await
    }

    pub async fn with_gateway(gateway: FakeGateway) -> Self {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();

        let gateway = Arc::new(gateway);
        let state = AppState::new(db, test_config(), gateway.clone());
        Self { state, gateway }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.conn
    }

    pub fn app(&self) -> Router {
        cafe::router(self.state.clone())
    }

    pub fn token(&self, sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_owned(),
            email: format!("{sub}@example.com"),
            name: Some(sub.to_owned()),
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).unwrap()
    }

    /// Signs in `sub` as a customer, provisioning the account.
    pub async fn customer(&self, sub: &str) -> user::Model {
        let claims = Claims {
            sub: sub.to_owned(),
            email: format!("{sub}@example.com"),
            name: Some(sub.to_owned()),
            exp: (Utc::now().timestamp() + 3600) as usize,
        };
        auth::resolve(self.db(), &claims).await.unwrap().user
    }

    pub async fn employee(&self, sub: &str, role_name: &str) -> user::Model {
        UserMutation::create_staff_user(
            self.db(),
            NewStaffUser {
                external_id: sub.to_owned(),
                email: format!("{sub}@example.com"),
                name: sub.to_owned(),
                role: role_name.to_owned(),
                employee_number: Some(format!("E-{sub}")),
                store_number: Some("001".to_owned()),
            },
        )
        .await
        .unwrap()
        .user
    }

    pub async fn admin(&self, sub: &str) -> user::Model {
        self.employee(sub, role::ADMIN).await
    }

    pub async fn drink_id(&self, name: &str) -> i32 {
        drink::Entity::find()
            .filter(drink::Column::Name.eq(name))
            .one(self.db())
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub async fn milk_id(&self, name: &str) -> i32 {
        milk::Entity::find()
            .filter(milk::Column::Name.eq(name))
            .one(self.db())
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub async fn syrup_id(&self, name: &str) -> i32 {
        syrup::Entity::find()
            .filter(syrup::Column::Name.eq(name))
            .one(self.db())
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub async fn sauce_id(&self, name: &str) -> i32 {
        sauce::Entity::find()
            .filter(sauce::Column::Name.eq(name))
            .one(self.db())
            .await
            .unwrap()
            .unwrap()
            .id
    }

    pub async fn user(&self, id: i32) -> user::Model {
        user::Entity::find_by_id(id).one(self.db()).await.unwrap().unwrap()
    }

    /// Runs a cart through checkout and a paid completion event.
    pub async fn paid_order(&self, customer: &user::Model, cart: &[CartLine], event_id: &str) -> order::Model {
        let started = start_checkout(self.db(), self.gateway.as_ref(), &self.state.config, customer, cart)
            .await
            .unwrap();
        let session = CheckoutSessionObject {
            id: started.session_id,
            client_reference_id: Some(started.checkout_id),
            amount_total: Some(to_minor_units(started.total).unwrap()),
            payment_status: Some("paid".to_owned()),
            payment_intent: None,
        };
        match complete_checkout(self.db(), event_id, &session).await.unwrap() {
            Completion::Created(order) => order,
            other => panic!("expected a new order, got {other:?}"),
        }
    }

    /// Sends a JSON request through the full router.
    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app().oneshot(request).await.unwrap();
        read(response).await
    }

    /// Delivers a gateway event with a valid signature.
    pub async fn deliver(&self, event: &Value) -> (StatusCode, Value) {
        let payload = event.to_string();
        let signature = webhook::sign(payload.as_bytes(), WEBHOOK_SECRET, Utc::now().timestamp());
        self.deliver_raw(payload, Some(signature)).await
    }

    pub async fn deliver_raw(&self, payload: String, signature: Option<String>) -> (StatusCode, Value) {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/api/webhooks/payment")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            request = request.header(webhook::SIGNATURE_HEADER, signature);
        }
        let request = request.body(Body::from(payload)).unwrap();

        let response = self.app().oneshot(request).await.unwrap();
        read(response).await
    }
}

async fn read(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

pub fn line(drink_id: i32, size: DrinkSize, quantity: i32) -> CartLine {
    CartLine {
        drink_id,
        size,
        quantity,
        milk_id: None,
        syrup_ids: vec![],
        sauce_ids: vec![],
    }
}

pub fn checkout_completed(event_id: &str, session_id: &str, reference: &str, amount_total: i64) -> Value {
    json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": {
            "object": {
                "id": session_id,
                "client_reference_id": reference,
                "amount_total": amount_total,
                "payment_status": "paid",
                "payment_intent": format!("pi_{session_id}"),
            }
        }
    })
}

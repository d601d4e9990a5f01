use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::AppResult;
use crate::payment::webhook::{self, CheckoutEvent, Event, SIGNATURE_HEADER};
use crate::service::checkout::{complete_checkout, expire_checkout, fail_checkout, Completion};
use crate::state::AppState;

/// Receives gateway events. Anything that passes verification is acknowledged
/// with 200, including events we do not act on.
pub async fn payment(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<Json<Value>> {
    let payment = &state.config.payment;
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    webhook::verify(
        &body,
        signature,
        &payment.webhook_secret,
        Utc::now().timestamp(),
        payment.webhook_tolerance_secs,
    )?;

    let event = Event::parse(&body)?;
    let outcome = match event.checkout()? {
        CheckoutEvent::Completed(session) => match complete_checkout(&state.conn, &event.id, &session).await? {
            Completion::Created(order) => {
                info!(event_id = %event.id, order_id = order.id, "payment completed");
                "order_created"
            }
            Completion::AlreadyProcessed => "duplicate",
            Completion::Unmatched => "unmatched",
        },
        CheckoutEvent::Expired(session) => {
            expire_checkout(&state.conn, &event.id, &session).await?;
            "expired"
        }
        CheckoutEvent::Failed(session) => {
            fail_checkout(&state.conn, &event.id, &session).await?;
            "failed"
        }
        CheckoutEvent::Ignored => {
            debug!(event_id = %event.id, kind = %event.kind, "ignoring event");
            "ignored"
        }
    };

    Ok(Json(json!({ "received": true, "outcome": outcome })))
}

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::extract::Json;
use crate::pricing::CartLine;
use crate::service::checkout::{start_checkout, StartedCheckout};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub items: Vec<CartLine>,
}

pub async fn start(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CheckoutBody>,
) -> AppResult<(StatusCode, Json<StartedCheckout>)> {
    let started = start_checkout(
        &state.conn,
        state.gateway.as_ref(),
        &state.config,
        &current.user,
        &body.items,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(started)))
}

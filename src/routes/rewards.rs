use axum::{extract::State, http::StatusCode};
use entity::reward_redemption;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::AppResult;
use crate::extract::Json;
use crate::service::{
    rewards::{Mutation as RewardMutation, Query as RewardQuery, Redemption, RewardCatalog},
    users::Profile,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RedeemBody {
    pub reward: String,
}

pub async fn me(current: CurrentUser) -> Json<Profile> {
    Json(Profile::new(current.user, &current.role))
}

pub async fn catalog() -> Json<RewardCatalog> {
    Json(RewardQuery::catalog())
}

pub async fn redeem(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<RedeemBody>,
) -> AppResult<(StatusCode, Json<Redemption>)> {
    let redemption = RewardMutation::redeem(&state.conn, current.id(), &body.reward).await?;
    Ok((StatusCode::CREATED, Json(redemption)))
}

pub async fn history(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<reward_redemption::Model>>> {
    Ok(Json(RewardQuery::history(&state.conn, current.id()).await?))
}

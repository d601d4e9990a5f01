use axum::{extract::State, http::StatusCode};
use entity::{order, review};
use serde::Serialize;

use crate::auth::{CurrentUser, RoleLevel};
use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path};
use crate::service::{
    orders::Query as OrderQuery,
    reviews::{Mutation as ReviewMutation, NewReview, Query as ReviewQuery},
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: order::Model,
    pub review: Option<review::Model>,
}

pub async fn list_own(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<order::Model>>> {
    Ok(Json(OrderQuery::orders_for_user(&state.conn, current.id()).await?))
}

/// Customers only see their own orders; other ids answer 404.
pub async fn detail(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<OrderDetail>> {
    let order = OrderQuery::find_order_by_id(&state.conn, id)
        .await?
        .filter(|order| order.user_id == current.id() || current.has(RoleLevel::Staff))
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    let review = ReviewQuery::review_for_order(&state.conn, id).await?;

    Ok(Json(OrderDetail { order, review }))
}

pub async fn review(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(input): Json<NewReview>,
) -> AppResult<(StatusCode, Json<review::Model>)> {
    let review = ReviewMutation::create_review(&state.conn, current.id(), id, input).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

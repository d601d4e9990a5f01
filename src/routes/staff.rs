use axum::{extract::State, http::StatusCode};
use entity::{inventory_log, order, sea_orm_active_enums::OrderStatus, shift};
use serde::Deserialize;

use crate::auth::{CurrentUser, RoleLevel};
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::service::{
    inventory::{InventoryOverview, Mutation as InventoryMutation, Query as InventoryQuery, StockChange},
    orders::{Mutation as OrderMutation, Query as OrderQuery},
    shifts::{Mutation as ShiftMutation, Query as ShiftQuery},
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketUpdate {
    pub status: OrderStatus,
}

pub async fn tickets(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<order::Model>>> {
    current.require(RoleLevel::Staff)?;
    Ok(Json(OrderQuery::ticket_queue(&state.conn).await?))
}

pub async fn update_ticket(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<TicketUpdate>,
) -> AppResult<Json<order::Model>> {
    current.require(RoleLevel::Staff)?;
    Ok(Json(OrderMutation::update_ticket_status(&state.conn, id, body.status).await?))
}

pub async fn clock_in(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<(StatusCode, Json<shift::Model>)> {
    current.require(RoleLevel::Staff)?;
    let shift = ShiftMutation::clock_in(&state.conn, &current.user).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

pub async fn clock_out(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<shift::Model>> {
    current.require(RoleLevel::Staff)?;
    Ok(Json(ShiftMutation::clock_out(&state.conn, current.id()).await?))
}

pub async fn my_shifts(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<shift::Model>>> {
    current.require(RoleLevel::Staff)?;
    Ok(Json(ShiftQuery::shifts_for_user(&state.conn, current.id()).await?))
}

pub async fn inventory(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<InventoryOverview>> {
    current.require(RoleLevel::Staff)?;
    Ok(Json(InventoryQuery::overview(&state.conn).await?))
}

pub async fn log_inventory(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<StockChange>,
) -> AppResult<(StatusCode, Json<inventory_log::Model>)> {
    current.require(RoleLevel::Staff)?;
    let log = InventoryMutation::log_change(&state.conn, current.id(), body).await?;
    Ok((StatusCode::CREATED, Json(log)))
}

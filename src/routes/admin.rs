use axum::{extract::State, http::StatusCode};
use entity::{category, payroll, review, role, sea_orm_active_enums::OrderStatus, user};
use sea_orm::prelude::Decimal;
use serde::Deserialize;

use crate::auth::{CurrentUser, RoleLevel};
use crate::error::AppResult;
use crate::extract::{Json, Path, Query};
use crate::pricing::MenuEntry;
use crate::service::{
    catalog::{Customization, CustomizationKind, DrinkInput, Mutation as CatalogMutation},
    dashboard::{Dashboard, Query as DashboardQuery},
    orders::{OrderPage, Query as OrderQuery, DEFAULT_PAGE_SIZE},
    payroll::{Mutation as PayrollMutation, PayrollRequest, Query as PayrollQuery},
    reviews::Query as ReviewQuery,
    shifts::{ActiveShift, Query as ShiftQuery},
    users::{Mutation as UserMutation, NewStaffUser, Query as UserQuery, UserWithRole},
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderParams {
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PayrollParams {
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct PointsBody {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CustomizationBody {
    pub name: String,
    pub price: Decimal,
}

pub async fn dashboard(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Dashboard>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(DashboardQuery::dashboard(&state.conn).await?))
}

pub async fn orders(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<OrderParams>,
) -> AppResult<Json<OrderPage>> {
    current.require(RoleLevel::Manager)?;
    let page = OrderQuery::find_orders_in_page(
        &state.conn,
        params.status,
        params.page.unwrap_or(1),
        params.per_page.unwrap_or(DEFAULT_PAGE_SIZE),
    )
    .await?;
    Ok(Json(page))
}

pub async fn reviews(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<review::Model>>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(ReviewQuery::list_reviews(&state.conn).await?))
}

pub async fn users(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<UserWithRole>>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(UserQuery::list_users(&state.conn).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<NewStaffUser>,
) -> AppResult<(StatusCode, Json<UserWithRole>)> {
    current.require(RoleLevel::Admin)?;
    let created = UserMutation::create_staff_user(&state.conn, body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn change_role(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<RoleBody>,
) -> AppResult<Json<UserWithRole>> {
    current.require(RoleLevel::Admin)?;
    Ok(Json(UserMutation::change_role(&state.conn, id, &body.role).await?))
}

pub async fn adjust_points(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<PointsBody>,
) -> AppResult<Json<user::Model>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(UserMutation::adjust_points(&state.conn, id, body.delta).await?))
}

pub async fn roles(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<role::Model>>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(UserQuery::list_roles(&state.conn).await?))
}

pub async fn active_shifts(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Vec<ActiveShift>>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(ShiftQuery::active_shifts(&state.conn).await?))
}

pub async fn payrolls(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PayrollParams>,
) -> AppResult<Json<Vec<payroll::Model>>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(PayrollQuery::list_payrolls(&state.conn, params.user_id).await?))
}

pub async fn generate_payroll(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<PayrollRequest>,
) -> AppResult<(StatusCode, Json<payroll::Model>)> {
    current.require(RoleLevel::Manager)?;
    let payroll = PayrollMutation::generate(&state.conn, body).await?;
    Ok((StatusCode::CREATED, Json(payroll)))
}

pub async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<CategoryBody>,
) -> AppResult<(StatusCode, Json<category::Model>)> {
    current.require(RoleLevel::Manager)?;
    let category = CatalogMutation::create_category(&state.conn, &body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn create_drink(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(body): Json<DrinkInput>,
) -> AppResult<(StatusCode, Json<MenuEntry>)> {
    current.require(RoleLevel::Manager)?;
    let drink = CatalogMutation::create_drink(&state.conn, body).await?;
    Ok((StatusCode::CREATED, Json(drink)))
}

pub async fn update_drink(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    Json(body): Json<DrinkInput>,
) -> AppResult<Json<MenuEntry>> {
    current.require(RoleLevel::Manager)?;
    Ok(Json(CatalogMutation::update_drink(&state.conn, id, body).await?))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require(RoleLevel::Manager)?;
    CatalogMutation::delete_drink(&state.conn, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_customization(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(kind): Path<CustomizationKind>,
    Json(body): Json<CustomizationBody>,
) -> AppResult<(StatusCode, Json<Customization>)> {
    current.require(RoleLevel::Manager)?;
    let created = CatalogMutation::create_customization(&state.conn, kind, &body.name, body.price).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

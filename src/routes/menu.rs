use axum::extract::State;

use crate::error::{AppError, AppResult};
use crate::extract::{Json, Path};
use crate::pricing::MenuEntry;
use crate::service::catalog::{Customizations, MenuCategory, Query as CatalogQuery};
use crate::state::AppState;

pub async fn menu(State(state): State<AppState>) -> AppResult<Json<Vec<MenuCategory>>> {
    Ok(Json(CatalogQuery::menu(&state.conn).await?))
}

pub async fn drink(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<MenuEntry>> {
    CatalogQuery::drink_detail(&state.conn, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Drink {id}")))
}

pub async fn customizations(State(state): State<AppState>) -> AppResult<Json<Customizations>> {
    Ok(Json(CatalogQuery::customizations(&state.conn).await?))
}

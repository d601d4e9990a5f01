use std::collections::BTreeMap;

use chrono::Utc;
use entity::inventory_log;
use sea_orm::{ActiveModelTrait, DbConn, DbErr, EntityTrait, QueryOrder, QuerySelect, Set};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockChange {
    pub item_name: String,
    pub change: i32,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub item_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventoryOverview {
    pub levels: Vec<StockLevel>,
    pub recent: Vec<inventory_log::Model>,
}

pub const RECENT_LOGS: u64 = 50;

/// Net quantity per item, alphabetical.
pub fn stock_levels(logs: &[inventory_log::Model]) -> Vec<StockLevel> {
    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for log in logs {
        *totals.entry(log.item_name.as_str()).or_default() += i64::from(log.change);
    }
    totals
        .into_iter()
        .map(|(item_name, quantity)| StockLevel {
            item_name: item_name.to_owned(),
            quantity,
        })
        .collect()
}

pub struct Query;

impl Query {
    pub async fn recent_logs(db: &DbConn, limit: u64) -> Result<Vec<inventory_log::Model>, DbErr> {
        inventory_log::Entity::find()
            .order_by_desc(inventory_log::Column::CreatedAt)
            .order_by_desc(inventory_log::Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn overview(db: &DbConn) -> Result<InventoryOverview, DbErr> {
        let all = inventory_log::Entity::find().all(db).await?;
        Ok(InventoryOverview {
            levels: stock_levels(&all),
            recent: Self::recent_logs(db, RECENT_LOGS).await?,
        })
    }
}

pub struct Mutation;

impl Mutation {
    pub async fn log_change(db: &DbConn, user_id: i32, input: StockChange) -> AppResult<inventory_log::Model> {
        let item_name = input.item_name.trim();
        if item_name.is_empty() {
            return Err(AppError::BadRequest("Item name is required".to_owned()));
        }
        if input.change == 0 {
            return Err(AppError::BadRequest("Change must not be zero".to_owned()));
        }

        Ok(inventory_log::ActiveModel {
            item_name: Set(item_name.to_owned()),
            change: Set(input.change),
            reason: Set(input.reason.trim().to_owned()),
            user_id: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }
}

use chrono::Utc;
use entity::{order, review, sea_orm_active_enums::OrderStatus};
use sea_orm::{ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    pub rating: i32,
    #[serde(default)]
    pub comment: Option<String>,
}

pub struct Query;

impl Query {
    pub async fn list_reviews(db: &DbConn) -> Result<Vec<review::Model>, DbErr> {
        review::Entity::find()
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(db)
            .await
    }

    pub async fn review_for_order(db: &DbConn, order_id: i32) -> Result<Option<review::Model>, DbErr> {
        review::Entity::find()
            .filter(review::Column::OrderId.eq(order_id))
            .one(db)
            .await
    }
}

pub struct Mutation;

impl Mutation {
    /// A customer rates one of their completed orders, once.
    pub async fn create_review(db: &DbConn, user_id: i32, order_id: i32, input: NewReview) -> AppResult<review::Model> {
        if !(1..=5).contains(&input.rating) {
            return Err(AppError::BadRequest("Rating must be between 1 and 5".to_owned()));
        }

        let order = order::Entity::find_by_id(order_id)
            .one(db)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("Order {order_id}")))?;

        if order.status != OrderStatus::Completed {
            return Err(AppError::Conflict("Only completed orders can be reviewed".to_owned()));
        }
        if Query::review_for_order(db, order_id).await?.is_some() {
            return Err(AppError::Conflict(format!("Order {order_id} is already reviewed")));
        }

        let comment = input
            .comment
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty());

        Ok(review::ActiveModel {
            order_id: Set(order_id),
            user_id: Set(user_id),
            rating: Set(input.rating),
            comment: Set(comment),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }
}

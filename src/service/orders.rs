use chrono::Utc;
use entity::{order, sea_orm_active_enums::OrderStatus};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    pub page: u64,
    pub per_page: u64,
    pub num_pages: u64,
}

pub struct Query;

impl Query {
    pub async fn find_order_by_id(db: &DbConn, id: i32) -> Result<Option<order::Model>, DbErr> {
        order::Entity::find_by_id(id).one(db).await
    }

    pub async fn orders_for_user(db: &DbConn, user_id: i32) -> Result<Vec<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .all(db)
            .await
    }

    /// Pages start at 1; a page past the last one comes back empty.
    pub async fn find_orders_in_page(
        db: &DbConn,
        status: Option<OrderStatus>,
        page: u64,
        per_page: u64,
    ) -> Result<OrderPage, DbErr> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let mut select = order::Entity::find();
        if let Some(status) = status {
            select = select.filter(order::Column::Status.eq(status));
        }

        let paginator = select
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id)
            .paginate(db, per_page);
        let num_pages = paginator.num_pages().await?;

        // Pages past the end are empty; fetching them would overflow the offset.
        let orders = if page > num_pages.max(1) {
            Vec::new()
        } else {
            paginator.fetch_page(page - 1).await?
        };

        Ok(OrderPage {
            orders,
            page,
            per_page,
            num_pages,
        })
    }

    /// Open tickets, oldest first.
    pub async fn ticket_queue(db: &DbConn) -> Result<Vec<order::Model>, DbErr> {
        order::Entity::find()
            .filter(order::Column::Status.is_in(OrderStatus::OPEN))
            .order_by_asc(order::Column::CreatedAt)
            .order_by_asc(order::Column::Id)
            .all(db)
            .await
    }
}

pub struct Mutation;

impl Mutation {
    pub async fn update_ticket_status(db: &DbConn, id: i32, next: OrderStatus) -> AppResult<order::Model> {
        let order = order::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;

        let current = order.status;
        if !current.can_transition_to(next) {
            return Err(AppError::Conflict(format!(
                "Order {id} cannot move from {current:?} to {next:?}"
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(next);
        active.updated_at = Set(Utc::now());
        let order = active.update(db).await?;

        info!(order_id = id, from = ?current, to = ?next, "ticket status changed");
        Ok(order)
    }
}

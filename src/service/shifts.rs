use chrono::{DateTime, Utc};
use entity::{shift, user};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbConn, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveShift {
    #[serde(flatten)]
    pub shift: shift::Model,
    pub user_name: String,
    pub employee_number: Option<String>,
}

/// Worked time in hours, from whole minutes, to two decimal places.
pub fn hours_between(clock_in: DateTime<Utc>, clock_out: DateTime<Utc>) -> Decimal {
    let minutes = (clock_out - clock_in).num_minutes().max(0);
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

pub struct Query;

impl Query {
    pub async fn open_shift<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<shift::Model>, DbErr> {
        shift::Entity::find()
            .filter(shift::Column::UserId.eq(user_id))
            .filter(shift::Column::ClockOut.is_null())
            .one(db)
            .await
    }

    pub async fn shifts_for_user(db: &DbConn, user_id: i32) -> Result<Vec<shift::Model>, DbErr> {
        shift::Entity::find()
            .filter(shift::Column::UserId.eq(user_id))
            .order_by_desc(shift::Column::ClockIn)
            .all(db)
            .await
    }

    pub async fn active_shifts(db: &DbConn) -> Result<Vec<ActiveShift>, DbErr> {
        let rows = shift::Entity::find()
            .filter(shift::Column::ClockOut.is_null())
            .find_also_related(user::Entity)
            .order_by_asc(shift::Column::ClockIn)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(shift, user)| {
                let (user_name, employee_number) = user
                    .map(|u| (u.name, u.employee_number))
                    .unwrap_or_default();
                ActiveShift {
                    shift,
                    user_name,
                    employee_number,
                }
            })
            .collect())
    }
}

pub struct Mutation;

impl Mutation {
    pub async fn clock_in(db: &DbConn, staff: &user::Model) -> AppResult<shift::Model> {
        let txn = db.begin().await?;
        if Query::open_shift(&txn, staff.id).await?.is_some() {
            return Err(AppError::Conflict("Already clocked in".to_owned()));
        }

        let shift = shift::ActiveModel {
            user_id: Set(staff.id),
            store_number: Set(staff.store_number.clone()),
            clock_in: Set(Utc::now()),
            clock_out: Set(None),
            hours: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        info!(user_id = staff.id, shift_id = shift.id, "clocked in");
        Ok(shift)
    }

    pub async fn clock_out(db: &DbConn, user_id: i32) -> AppResult<shift::Model> {
        let txn = db.begin().await?;
        let open = Query::open_shift(&txn, user_id)
            .await?
            .ok_or_else(|| AppError::Conflict("Not clocked in".to_owned()))?;

        let now = Utc::now();
        let hours = hours_between(open.clock_in, now);

        let mut active: shift::ActiveModel = open.into();
        active.clock_out = Set(Some(now));
        active.hours = Set(Some(hours));
        let shift = active.update(&txn).await?;
        txn.commit().await?;

        info!(user_id, shift_id = shift.id, %hours, "clocked out");
        Ok(shift)
    }
}

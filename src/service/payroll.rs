use chrono::{NaiveDate, NaiveTime, Utc};
use entity::{payroll, shift, user};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PayrollRequest {
    pub user_id: i32,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub hourly_rate: Decimal,
}

pub struct Query;

impl Query {
    pub async fn list_payrolls(db: &DbConn, user_id: Option<i32>) -> Result<Vec<payroll::Model>, DbErr> {
        let mut select = payroll::Entity::find();
        if let Some(user_id) = user_id {
            select = select.filter(payroll::Column::UserId.eq(user_id));
        }
        select
            .order_by_desc(payroll::Column::PeriodEnd)
            .order_by_desc(payroll::Column::Id)
            .all(db)
            .await
    }
}

pub struct Mutation;

impl Mutation {
    /// Pays out closed shifts that started within the period, both ends inclusive.
    pub async fn generate(db: &DbConn, request: PayrollRequest) -> AppResult<payroll::Model> {
        let PayrollRequest {
            user_id,
            period_start,
            period_end,
            hourly_rate,
        } = request;

        if period_start > period_end {
            return Err(AppError::BadRequest("Period start must not be after its end".to_owned()));
        }
        if hourly_rate <= Decimal::ZERO {
            return Err(AppError::BadRequest("Hourly rate must be positive".to_owned()));
        }
        user::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let from = period_start.and_time(NaiveTime::MIN).and_utc();
        let until = period_end
            .succ_opt()
            .ok_or_else(|| AppError::BadRequest("Period end is out of range".to_owned()))?
            .and_time(NaiveTime::MIN)
            .and_utc();

        let shifts = shift::Entity::find()
            .filter(shift::Column::UserId.eq(user_id))
            .filter(shift::Column::ClockOut.is_not_null())
            .filter(shift::Column::ClockIn.gte(from))
            .filter(shift::Column::ClockIn.lt(until))
            .all(db)
            .await?;

        let hours: Decimal = shifts.iter().filter_map(|s| s.hours).sum();
        let gross_pay = hours
            .checked_mul(hourly_rate)
            .ok_or_else(|| AppError::BadRequest(format!("Gross pay for {hours} hours at {hourly_rate} is out of range")))?
            .round_dp(2);

        let payroll = payroll::ActiveModel {
            user_id: Set(user_id),
            period_start: Set(period_start),
            period_end: Set(period_end),
            hours: Set(hours),
            hourly_rate: Set(hourly_rate),
            gross_pay: Set(gross_pay),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(user_id, shifts = shifts.len(), %hours, %gross_pay, "payroll generated");
        Ok(payroll)
    }
}

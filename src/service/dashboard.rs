//! Back-office figures. Aggregation happens here rather than in SQL so that
//! decimal sums behave the same on every backend.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveTime, Utc};
use entity::{order, review, role, sea_orm_active_enums::PaymentStatus, shift, user};
use sea_orm::{prelude::Decimal, ColumnTrait, DbConn, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use serde::Serialize;

pub const TOP_DRINKS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkSales {
    pub drink_id: i32,
    pub drink_name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OrderStats {
    pub orders_by_status: BTreeMap<String, u64>,
    pub total_orders: u64,
    pub revenue: Decimal,
    pub revenue_today: Decimal,
    pub average_order_value: Decimal,
    pub top_drinks: Vec<DrinkSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub orders: OrderStats,
    pub customers: u64,
    pub tiers: BTreeMap<String, u64>,
    pub active_shifts: u64,
    pub average_rating: Option<Decimal>,
    pub review_count: u64,
}

fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

/// Revenue counts paid orders only; `today_start` bounds the daily figure.
pub fn summarize(orders: &[order::Model], today_start: DateTime<Utc>) -> OrderStats {
    let mut stats = OrderStats {
        total_orders: orders.len() as u64,
        ..Default::default()
    };
    let mut paid = 0u64;
    let mut sales: HashMap<i32, DrinkSales> = HashMap::new();

    for order in orders {
        *stats.orders_by_status.entry(label(&order.status)).or_default() += 1;

        if order.payment_status != PaymentStatus::Paid {
            continue;
        }
        paid += 1;
        stats.revenue += order.total;
        if order.created_at >= today_start {
            stats.revenue_today += order.total;
        }
        for item in &order.items.0 {
            sales
                .entry(item.drink_id)
                .or_insert_with(|| DrinkSales {
                    drink_id: item.drink_id,
                    drink_name: item.drink_name.clone(),
                    quantity: 0,
                })
                .quantity += i64::from(item.quantity);
        }
    }

    if paid > 0 {
        stats.average_order_value = (stats.revenue / Decimal::from(paid)).round_dp(2);
    }
    stats.revenue = stats.revenue.round_dp(2);
    stats.revenue_today = stats.revenue_today.round_dp(2);

    let mut top: Vec<DrinkSales> = sales.into_values().collect();
    top.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.drink_name.cmp(&b.drink_name)));
    top.truncate(TOP_DRINKS);
    stats.top_drinks = top;

    stats
}

pub struct Query;

impl Query {
    pub async fn dashboard(db: &DbConn) -> Result<Dashboard, DbErr> {
        let today_start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let orders = order::Entity::find().all(db).await?;

        let customers = user::Entity::find()
            .inner_join(role::Entity)
            .filter(role::Column::Name.eq(role::CUSTOMER))
            .all(db)
            .await?;
        let mut tiers = BTreeMap::new();
        for customer in &customers {
            *tiers.entry(label(&customer.tier)).or_default() += 1;
        }

        let active_shifts = shift::Entity::find()
            .filter(shift::Column::ClockOut.is_null())
            .count(db)
            .await?;

        let ratings: Vec<i32> = review::Entity::find()
            .select_only()
            .column(review::Column::Rating)
            .into_tuple()
            .all(db)
            .await?;
        let average_rating = (!ratings.is_empty()).then(|| {
            let sum: i64 = ratings.iter().map(|&r| i64::from(r)).sum();
            (Decimal::from(sum) / Decimal::from(ratings.len() as u64)).round_dp(2)
        });

        Ok(Dashboard {
            orders: summarize(&orders, today_start),
            customers: customers.len() as u64,
            tiers,
            active_shifts,
            average_rating,
            review_count: ratings.len() as u64,
        })
    }
}

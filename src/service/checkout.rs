//! From priced cart to paid order.
//!
//! `start_checkout` parks the cart as a temp checkout and hands the customer to the
//! gateway. The gateway's completion event later turns that temp checkout
//! into an order and credits loyalty points. Completion runs in a single
//! transaction keyed by the gateway's event id, so a re-delivered event is a
//! no-op.

use chrono::Utc;
use entity::{
    order::{self, OrderItem, OrderItems},
    processed_event,
    sea_orm_active_enums::{OrderStatus, PaymentStatus},
    temp_checkout, user,
};
use sea_orm::{
    prelude::Decimal, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbConn, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{catalog, users};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::loyalty::points_for_total;
use crate::payment::{
    to_minor_units, webhook::CheckoutSessionObject, CheckoutLine, CheckoutSessionRequest, PaymentGateway,
};
use crate::pricing::{price_cart, CartLine};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedCheckout {
    pub checkout_id: String,
    pub session_id: String,
    pub url: String,
    pub total: Decimal,
    pub items: OrderItems,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Created(order::Model),
    AlreadyProcessed,
    /// No temp checkout matched the session; nothing to fulfil.
    Unmatched,
}

#[instrument(skip_all, fields(user_id = customer.id))]
pub async fn start_checkout(
    db: &DbConn,
    gateway: &dyn PaymentGateway,
    config: &Config,
    customer: &user::Model,
    cart: &[CartLine],
) -> AppResult<StartedCheckout> {
    let drink_ids: Vec<i32> = cart.iter().map(|line| line.drink_id).collect();
    let menu = catalog::Query::menu_entries(db, &drink_ids).await?;
    let (items, total) = price_cart(cart, &menu)?;

    let checkout = temp_checkout::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(customer.id),
        items: Set(items.clone()),
        total: Set(total),
        session_id: Set(None),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;

    let request = CheckoutSessionRequest {
        reference: checkout.id.clone(),
        customer_email: customer.email.clone(),
        lines: items.0.iter().map(checkout_line).collect(),
        success_url: format!(
            "{}/orders/success?session_id={{CHECKOUT_SESSION_ID}}",
            config.public_base_url
        ),
        cancel_url: format!("{}/cart", config.public_base_url),
    };

    let session = match gateway.create_checkout_session(&request).await {
        Ok(session) => session,
        Err(e) => {
            temp_checkout::Entity::delete_by_id(checkout.id.clone())
                .exec(db)
                .await?;
            return Err(e.into());
        }
    };

    let checkout_id = checkout.id.clone();
    let mut active: temp_checkout::ActiveModel = checkout.into();
    active.session_id = Set(Some(session.id.clone()));
    active.update(db).await?;

    info!(checkout_id = %checkout_id, session_id = %session.id, %total, "checkout started");
    Ok(StartedCheckout {
        checkout_id,
        session_id: session.id,
        url: session.url,
        total,
        items,
    })
}

fn checkout_line(item: &OrderItem) -> CheckoutLine {
    let mut extras: Vec<&str> = Vec::new();
    extras.extend(item.milk.as_deref());
    extras.extend(item.syrups.iter().map(String::as_str));
    extras.extend(item.sauces.iter().map(String::as_str));

    let size = match item.size {
        entity::order::DrinkSize::Small => "small",
        entity::order::DrinkSize::Medium => "medium",
        entity::order::DrinkSize::Large => "large",
    };
    let name = if extras.is_empty() {
        format!("{} ({size})", item.drink_name)
    } else {
        format!("{} ({size}; {})", item.drink_name, extras.join(", "))
    };

    CheckoutLine {
        name,
        unit_amount: item.unit_price,
        quantity: item.quantity,
    }
}

#[instrument(skip(db, session), fields(session_id = %session.id))]
pub async fn complete_checkout(db: &DbConn, event_id: &str, session: &CheckoutSessionObject) -> AppResult<Completion> {
    let txn = db.begin().await?;

    if already_processed(&txn, event_id).await? {
        return Ok(Completion::AlreadyProcessed);
    }

    let existing = order::Entity::find()
        .filter(order::Column::SessionId.eq(session.id.as_str()))
        .one(&txn)
        .await?;
    if existing.is_some() {
        record(&txn, event_id, "checkout.completed").await?;
        txn.commit().await?;
        return Ok(Completion::AlreadyProcessed);
    }

    let Some(checkout) = find_temp_checkout(&txn, session).await? else {
        warn!("no temp checkout for completed session");
        record(&txn, event_id, "checkout.completed").await?;
        txn.commit().await?;
        return Ok(Completion::Unmatched);
    };

    if let Some(paid) = session.amount_total {
        if to_minor_units(checkout.total).ok() != Some(paid) {
            warn!(expected = %checkout.total, paid, "gateway amount differs from priced cart");
        }
    }

    let customer = user::Entity::find_by_id(checkout.user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", checkout.user_id)))?;

    let points = points_for_total(checkout.total);
    let now = Utc::now();
    let order = order::ActiveModel {
        user_id: Set(customer.id),
        items: Set(checkout.items.clone()),
        total: Set(checkout.total),
        status: Set(OrderStatus::Pending),
        payment_status: Set(PaymentStatus::Paid),
        session_id: Set(session.id.clone()),
        payment_intent: Set(session.payment_intent.clone()),
        points_awarded: Set(points),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let customer = users::award_points(&txn, customer, points).await?;
    temp_checkout::Entity::delete_by_id(checkout.id)
        .exec(&txn)
        .await?;
    record(&txn, event_id, "checkout.completed").await?;
    txn.commit().await?;

    info!(
        order_id = order.id,
        user_id = customer.id,
        points,
        tier = ?customer.tier,
        "order created from payment"
    );
    Ok(Completion::Created(order))
}

/// The customer abandoned the hosted page. Returns whether a parked cart was dropped.
pub async fn expire_checkout(db: &DbConn, event_id: &str, session: &CheckoutSessionObject) -> AppResult<bool> {
    discard(db, event_id, "checkout.expired", session).await
}

pub async fn fail_checkout(db: &DbConn, event_id: &str, session: &CheckoutSessionObject) -> AppResult<bool> {
    discard(db, event_id, "checkout.failed", session).await
}

#[instrument(skip(db, session), fields(session_id = %session.id))]
async fn discard(db: &DbConn, event_id: &str, kind: &str, session: &CheckoutSessionObject) -> AppResult<bool> {
    let txn = db.begin().await?;

    if already_processed(&txn, event_id).await? {
        return Ok(false);
    }

    let found = match find_temp_checkout(&txn, session).await? {
        Some(checkout) => {
            temp_checkout::Entity::delete_by_id(checkout.id)
                .exec(&txn)
                .await?;
            true
        }
        None => false,
    };

    record(&txn, event_id, kind).await?;
    txn.commit().await?;
    Ok(found)
}

async fn already_processed(txn: &DatabaseTransaction, event_id: &str) -> AppResult<bool> {
    Ok(processed_event::Entity::find_by_id(event_id.to_owned())
        .one(txn)
        .await?
        .is_some())
}

async fn record<C: ConnectionTrait>(db: &C, event_id: &str, kind: &str) -> AppResult<()> {
    processed_event::ActiveModel {
        event_id: Set(event_id.to_owned()),
        kind: Set(kind.to_owned()),
        processed_at: Set(Utc::now()),
    }
    .insert(db)
    .await?;
    Ok(())
}

async fn find_temp_checkout<C: ConnectionTrait>(
    db: &C,
    session: &CheckoutSessionObject,
) -> AppResult<Option<temp_checkout::Model>> {
    if let Some(reference) = &session.client_reference_id {
        if let Some(checkout) = temp_checkout::Entity::find_by_id(reference.clone()).one(db).await? {
            return Ok(Some(checkout));
        }
    }

    Ok(temp_checkout::Entity::find()
        .filter(temp_checkout::Column::SessionId.eq(session.id.as_str()))
        .one(db)
        .await?)
}

//! Payment gateway seam.
//!
//! The gateway owns card handling and payment-state transitions. We only ask
//! it for a hosted checkout page and later consume its signed webhook events.

use async_trait::async_trait;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod stripe;
pub mod webhook;

pub use stripe::StripeGateway;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("request to gateway failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway answered {status}: {body}")]
    Gateway { status: u16, body: String },

    #[error("amount {0} cannot be expressed in minor units")]
    Amount(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutLine {
    pub name: String,
    pub unit_amount: Decimal,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSessionRequest {
    /// Our temp checkout id, echoed back by the gateway on completion.
    pub reference: String,
    pub customer_email: String,
    pub lines: Vec<CheckoutLine>,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Converts a decimal amount into the gateway's minor currency unit.
pub fn to_minor_units(amount: Decimal) -> Result<i64, PaymentError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .filter(|cents| *cents >= 0)
        .ok_or(PaymentError::Amount(amount))
}

pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

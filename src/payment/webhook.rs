//! Signed webhook events from the payment gateway.
//!
//! The signature header has the form `t=<unix seconds>,v1=<hex hmac>[,v1=...]`.
//! The MAC is HMAC-SHA256 over `"<t>.<raw body>"` keyed by the endpoint
//! secret. Several `v1` entries may be present while a secret is rotated.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Missing signature header")]
    MissingSignature,

    #[error("Malformed signature header")]
    MalformedSignature,

    #[error("Signature does not match payload")]
    BadSignature,

    #[error("Signature timestamp outside tolerance")]
    Stale,

    #[error("Malformed event payload: {0}")]
    Payload(String),
}

/// Checks `header` against `payload` and returns the signed timestamp.
pub fn verify(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<i64, WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| WebhookError::MalformedSignature)?,
                )
            }
            Some(("v1", value)) => signatures.push(value),
            Some(_) => {}
            None => return Err(WebhookError::MalformedSignature),
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedSignature)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedSignature);
    }

    let matched = signatures.iter().any(|signature| {
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        mac_for(secret, timestamp, payload)
            .map(|mac| mac.verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(WebhookError::BadSignature);
    }

    if (now - timestamp).abs() > tolerance_secs {
        return Err(WebhookError::Stale);
    }

    Ok(timestamp)
}

/// Produces a header value the way the gateway does. Used by tests and local tooling.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = mac_for(secret, timestamp, payload)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("t={timestamp},v1={signature}")
}

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> Option<Hmac<Sha256>> {
    // HMAC accepts keys of any length, so this only fails on a broken build.
    let mut mac = <Hmac<Sha256>>::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(mac)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The parts of a checkout session object we act on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutEvent {
    Completed(CheckoutSessionObject),
    Expired(CheckoutSessionObject),
    Failed(CheckoutSessionObject),
    Ignored,
}

impl Event {
    pub fn parse(payload: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))
    }

    pub fn checkout(&self) -> Result<CheckoutEvent, WebhookError> {
        let session = || {
            serde_json::from_value::<CheckoutSessionObject>(self.data.object.clone())
                .map_err(|e| WebhookError::Payload(e.to_string()))
        };

        Ok(match self.kind.as_str() {
            "checkout.session.completed" => {
                let session = session()?;
                // Delayed payment methods complete the session before money moves;
                // those arrive again as async_payment_succeeded.
                if session.payment_status.as_deref() == Some("unpaid") {
                    CheckoutEvent::Ignored
                } else {
                    CheckoutEvent::Completed(session)
                }
            }
            "checkout.session.async_payment_succeeded" => CheckoutEvent::Completed(session()?),
            "checkout.session.expired" => CheckoutEvent::Expired(session()?),
            "checkout.session.async_payment_failed" => CheckoutEvent::Failed(session()?),
            _ => CheckoutEvent::Ignored,
        })
    }
}

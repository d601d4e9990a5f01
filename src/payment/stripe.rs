use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use super::{to_minor_units, CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway};
use crate::config::PaymentConfig;

/// Hosted checkout through a Stripe-compatible REST API.
#[derive(Clone, Debug)]
pub struct StripeGateway {
    client: Client,
    api_base: String,
    api_key: String,
    currency: String,
}

impl StripeGateway {
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            currency: config.currency.clone(),
        }
    }

    fn form(&self, request: &CheckoutSessionRequest) -> Result<Vec<(String, String)>, PaymentError> {
        let mut form = vec![
            ("mode".to_owned(), "payment".to_owned()),
            ("client_reference_id".to_owned(), request.reference.clone()),
            ("customer_email".to_owned(), request.customer_email.clone()),
            ("success_url".to_owned(), request.success_url.clone()),
            ("cancel_url".to_owned(), request.cancel_url.clone()),
            ("metadata[temp_checkout_id]".to_owned(), request.reference.clone()),
        ];

        for (i, line) in request.lines.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
            form.push((format!("{prefix}[price_data][currency]"), self.currency.clone()));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                to_minor_units(line.unit_amount)?.to_string(),
            ));
            form.push((format!("{prefix}[price_data][product_data][name]"), line.name.clone()));
        }

        Ok(form)
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip_all, fields(reference = %request.reference))]
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = self.form(request)?;

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.api_key)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Gateway {
                status: status.as_u16(),
                body,
            });
        }

        let session: CheckoutSession = response.json().await?;
        debug!(session_id = %session.id, "checkout session created");
        Ok(session)
    }
}

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;
use crate::order::OrderId;

/// One displayed line of the hosted payment page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Everything the provider needs to build a hosted checkout session.
///
/// `metadata` is opaque to the provider and echoed back on webhooks; the
/// orchestrator stores the order correlation id there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub order_id: OrderId,
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
    pub metadata: serde_json::Value,
}

/// External payment provider, abstracted to session creation.
///
/// Webhook signature verification happens at the transport boundary before
/// a [`PaymentEvent`] is ever constructed.
pub trait PaymentProvider: Send + Sync {
    /// Returns the hosted payment page URL for the customer redirect.
    fn create_checkout_session(
        &self,
        request: SessionRequest,
    ) -> impl Future<Output = Result<String, CheckoutError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    Succeeded,
    Failed,
}

/// A verified webhook payload, reduced to what settlement needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub kind: PaymentEventKind,
    pub order_id: OrderId,
}

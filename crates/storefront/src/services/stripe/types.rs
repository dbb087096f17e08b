//! Stripe API response shapes (only the fields the store reads).

use serde::{Deserialize, Serialize};

/// A Stripe customer.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A Stripe `PaymentIntent`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

impl PaymentIntent {
    /// Whether the charge has completed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }

    /// Whether the charge is still settling. Stripe sends
    /// `payment_intent.succeeded` once it completes.
    #[must_use]
    pub fn processing(&self) -> bool {
        self.status == "processing"
    }
}

/// A saved payment method, trimmed to what checkout displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub card: Option<Card>,
}

/// Card details on a payment method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub brand: String,
    pub last4: String,
    pub exp_month: u8,
    pub exp_year: u16,
}

/// Stripe list envelope.
#[derive(Debug, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
}

/// A webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: EventData,
}

/// The object an event is about.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

impl Event {
    /// The id of the event's object, if it has one.
    #[must_use]
    pub fn object_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(serde_json::Value::as_str)
    }
}

/// Error body returned by the Stripe API.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response body for `POST /api/payments/intent`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub amount: i64,
    pub currency: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_event_parses_object_id() {
        let event: Event = serde_json::from_str(
            r#"{
                "id": "evt_123",
                "type": "payment_intent.succeeded",
                "data": {"object": {"id": "pi_456", "amount": 5999, "status": "succeeded"}}
            }"#,
        )
        .unwrap();
        assert_eq!(event.kind, "payment_intent.succeeded");
        assert_eq!(event.object_id(), Some("pi_456"));
    }

    #[test]
    fn test_payment_method_list_parses() {
        let list: List<PaymentMethod> = serde_json::from_str(
            r#"{"object":"list","data":[{"id":"pm_1","type":"card",
                "card":{"brand":"visa","last4":"4242","exp_month":12,"exp_year":2030}}]}"#,
        )
        .unwrap();
        let card = list.data[0].card.as_ref().unwrap();
        assert_eq!(card.last4, "4242");
        assert_eq!(list.data[0].kind, "card");
    }
}

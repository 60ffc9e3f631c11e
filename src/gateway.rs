use std::collections::HashMap;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Thin client for the Stripe Checkout Session API.
///
/// The base URL is configurable so tests can point it at a stub server.
/// Gateway failures never mutate booking state; they surface as
/// `AppError::Upstream` and are safe to retry.
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    secret_key: String,
    api_url: String,
}

/// Single line item for a checkout session. `amount` is in minor units.
#[derive(Debug, Clone)]
pub struct CheckoutLineItem {
    pub name: String,
    pub amount: i64,
    pub currency: String,
}

/// Booking intent carried through the session metadata so the verified
/// session alone is enough to materialize the booking.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingIntent {
    pub customer_id: Uuid,
    pub decorator_id: Uuid,
    pub service_id: Uuid,
    pub event_date: NaiveDate,
    pub event_time: String,
    pub event_location: String,
    pub notes: String,
    pub service_category: String,
}

impl BookingIntent {
    pub fn to_metadata(&self) -> Vec<(String, String)> {
        vec![
            ("customer_id".into(), self.customer_id.to_string()),
            ("decorator_id".into(), self.decorator_id.to_string()),
            ("service_id".into(), self.service_id.to_string()),
            ("event_date".into(), self.event_date.to_string()),
            ("event_time".into(), self.event_time.clone()),
            ("event_location".into(), self.event_location.clone()),
            ("notes".into(), self.notes.clone()),
            ("service_category".into(), self.service_category.clone()),
        ]
    }

    pub fn from_metadata(metadata: &HashMap<String, String>) -> AppResult<Self> {
        let field = |key: &str| -> AppResult<&String> {
            metadata
                .get(key)
                .ok_or_else(|| AppError::BadRequest(format!("session metadata missing {key}")))
        };
        let uuid_field = |key: &str| -> AppResult<Uuid> {
            Uuid::parse_str(field(key)?)
                .map_err(|_| AppError::BadRequest(format!("session metadata has invalid {key}")))
        };

        let event_date = field("event_date")?
            .parse::<NaiveDate>()
            .map_err(|_| AppError::BadRequest("session metadata has invalid event_date".into()))?;

        Ok(Self {
            customer_id: uuid_field("customer_id")?,
            decorator_id: uuid_field("decorator_id")?,
            service_id: uuid_field("service_id")?,
            event_date,
            event_time: field("event_time")?.clone(),
            event_location: metadata.get("event_location").cloned().unwrap_or_default(),
            notes: metadata.get("notes").cloned().unwrap_or_default(),
            service_category: metadata
                .get("service_category")
                .cloned()
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatedSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub payment_status: String,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl StripeGateway {
    pub fn new(secret_key: String, api_url: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            api_url,
        }
    }

    /// Open a checkout session encoding the booking intent in its metadata.
    pub async fn create_checkout_session(
        &self,
        item: &CheckoutLineItem,
        success_url: &str,
        cancel_url: &str,
        intent: &BookingIntent,
    ) -> AppResult<CreatedSession> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            (
                "line_items[0][price_data][currency]".into(),
                item.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                item.name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                item.amount.to_string(),
            ),
            ("line_items[0][quantity]".into(), "1".into()),
            ("success_url".into(), success_url.to_string()),
            ("cancel_url".into(), cancel_url.to_string()),
        ];
        for (key, value) in intent.to_metadata() {
            form.push((format!("metadata[{key}]"), value));
        }

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("checkout session create: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .json::<CreatedSession>()
                .await
                .map_err(|e| AppError::Upstream(format!("checkout session parse: {e}"))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Upstream(format!(
                    "checkout session create returned {status}: {body}"
                )))
            }
        }
    }

    /// Fetch a session's settlement status and metadata.
    pub async fn retrieve_session(&self, session_id: &str) -> AppResult<CheckoutSession> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{session_id}", self.api_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("checkout session retrieve: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .json::<CheckoutSession>()
                .await
                .map_err(|e| AppError::Upstream(format!("checkout session parse: {e}"))),
            StatusCode::NOT_FOUND => Err(AppError::NotFound),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AppError::Upstream(format!(
                    "checkout session retrieve returned {status}: {body}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_intent() -> BookingIntent {
        BookingIntent {
            customer_id: Uuid::new_v4(),
            decorator_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            event_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            event_time: "18:00".into(),
            event_location: "Dhaka".into(),
            notes: "stage flowers".into(),
            service_category: "Wedding".into(),
        }
    }

    #[test]
    fn intent_metadata_round_trips() {
        let intent = sample_intent();
        let map: HashMap<String, String> = intent.to_metadata().into_iter().collect();
        let parsed = BookingIntent::from_metadata(&map).unwrap();
        assert_eq!(parsed, intent);
    }

    #[test]
    fn intent_rejects_missing_fields() {
        let mut map: HashMap<String, String> =
            sample_intent().to_metadata().into_iter().collect();
        map.remove("decorator_id");
        let err = BookingIntent::from_metadata(&map).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn create_session_posts_form_and_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/sessions"))
            .and(body_string_contains("mode=payment"))
            .and(body_string_contains("unit_amount%5D=250000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_test_123",
                "url": "https://checkout.example/cs_test_123"
            })))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new("sk_test".into(), server.uri());
        let item = CheckoutLineItem {
            name: "Wedding Stage".into(),
            amount: 250000,
            currency: "BDT".into(),
        };
        let created = gateway
            .create_checkout_session(&item, "https://app/success", "https://app/cancel", &sample_intent())
            .await
            .unwrap();
        assert_eq!(created.id, "cs_test_123");
    }

    #[tokio::test]
    async fn retrieve_session_surfaces_gateway_errors_as_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkout/sessions/cs_down"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new("sk_test".into(), server.uri());
        let err = gateway.retrieve_session("cs_down").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[tokio::test]
    async fn retrieve_session_parses_settled_payload() {
        let server = MockServer::start().await;
        let intent = sample_intent();
        let metadata: HashMap<String, String> = intent.to_metadata().into_iter().collect();
        Mock::given(method("GET"))
            .and(path("/checkout/sessions/cs_paid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "cs_paid",
                "payment_status": "paid",
                "payment_intent": "pi_42",
                "amount_total": 250000,
                "metadata": metadata
            })))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new("sk_test".into(), server.uri());
        let session = gateway.retrieve_session("cs_paid").await.unwrap();
        assert_eq!(session.payment_status, "paid");
        assert_eq!(session.payment_intent.as_deref(), Some("pi_42"));
        assert_eq!(
            BookingIntent::from_metadata(&session.metadata).unwrap(),
            intent
        );
    }
}

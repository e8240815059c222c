use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::ShopLensService;

/// An inbound product change notification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
	pub topic: Option<String>,
	pub shop_domain: Option<String>,
	/// Parsed body, or `Value::Null` when the body was not JSON.
	pub payload: Value,
}

/// One line of the webhook log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookLogEntry {
	#[serde(with = "time::serde::rfc3339")]
	pub timestamp: OffsetDateTime,
	pub event: Option<String>,
	pub shop: Option<String>,
	pub product_id: Value,
	pub title: Value,
}
impl WebhookLogEntry {
	pub fn from_event(event: &WebhookEvent, timestamp: OffsetDateTime) -> Self {
		let field = |key: &str| event.payload.get(key).cloned().unwrap_or(Value::Null);

		Self {
			timestamp,
			event: event.topic.clone(),
			shop: event.shop_domain.clone(),
			product_id: field("id"),
			title: field("title"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
	Logged,
	LogFailed { message: String },
}

#[derive(Debug, Clone)]
pub struct WebhookReceipt {
	pub event: Option<String>,
	pub outcome: WebhookOutcome,
}
impl WebhookReceipt {
	/// The acknowledgement body; identical whether or not the log write succeeded.
	pub fn response(&self) -> WebhookResponse {
		WebhookResponse { status: "processed".to_string(), event: self.event.clone() }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookResponse {
	pub status: String,
	pub event: Option<String>,
}

impl ShopLensService {
	pub async fn handle_webhook(&self, event: WebhookEvent) -> WebhookReceipt {
		let entry = WebhookLogEntry::from_event(&event, OffsetDateTime::now_utc());

		tracing::info!(
			topic = ?event.topic,
			shop = ?event.shop_domain,
			product_id = %entry.product_id,
			"Webhook event received."
		);

		let outcome = match self.webhook_log.append(&entry).await {
			Ok(()) => WebhookOutcome::Logged,
			Err(err) => {
				tracing::error!(
					error = %err,
					path = %self.webhook_log.path().display(),
					"Failed to append webhook log entry."
				);

				WebhookOutcome::LogFailed { message: err.to_string() }
			},
		};

		WebhookReceipt { event: event.topic, outcome }
	}
}

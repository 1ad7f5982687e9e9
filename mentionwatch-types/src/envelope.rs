//! The push envelope and its tagged message union.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    Alert, ApiHealth, EmailDelivery, QueueError, QueueStatus, RecoveryAction, SentimentUpdate,
    SystemHealth, UserActivity,
};

/// Errors produced while decoding a pushed envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame was not a JSON envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The `type` tag is not one the console understands.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// The `data` field does not match the shape of its `type`.
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Full state sent once right after a connection opens.
///
/// Every field is optional; absent categories keep their current value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialData {
    #[serde(default, alias = "queueStatus", skip_serializing_if = "Option::is_none")]
    pub queue_status: Option<QueueStatus>,
    #[serde(default, alias = "systemHealth", skip_serializing_if = "Option::is_none")]
    pub system_health: Option<SystemHealth>,
    #[serde(default, alias = "apiHealth", skip_serializing_if = "Option::is_none")]
    pub api_health: Option<ApiHealth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
    #[serde(default, alias = "recoveryActions", skip_serializing_if = "Option::is_none")]
    pub recovery_actions: Option<Vec<RecoveryAction>>,
    #[serde(default, alias = "userActivity", skip_serializing_if = "Option::is_none")]
    pub user_activity: Option<Vec<UserActivity>>,
    #[serde(default, alias = "emailDelivery", skip_serializing_if = "Option::is_none")]
    pub email_delivery: Option<Vec<EmailDelivery>>,
}

/// A decoded push message, discriminated by the envelope's `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    InitialData(Box<InitialData>),
    QueueUpdate(QueueStatus),
    QueueError(QueueError),
    SystemHealth(SystemHealth),
    ApiHealth(ApiHealth),
    SystemAlert(Alert),
    SentimentUpdate(SentimentUpdate),
    RecoveryAction(RecoveryAction),
    UserActivity(UserActivity),
    EmailDelivery(EmailDelivery),
}

impl Message {
    /// The wire `type` tag of this message.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::InitialData(_) => "initial_data",
            Message::QueueUpdate(_) => "queue_update",
            Message::QueueError(_) => "queue_error",
            Message::SystemHealth(_) => "system_health",
            Message::ApiHealth(_) => "api_health",
            Message::SystemAlert(_) => "system_alert",
            Message::SentimentUpdate(_) => "sentiment_update",
            Message::RecoveryAction(_) => "recovery_action",
            Message::UserActivity(_) => "user_activity",
            Message::EmailDelivery(_) => "email_delivery",
        }
    }

    fn decode(kind: &str, data: Value) -> Result<Self, EnvelopeError> {
        // Payload structs default every field, so a missing body is an empty object.
        let data = if data.is_null() {
            Value::Object(Default::default())
        } else {
            data
        };

        match kind {
            "initial_data" => {
                payload("initial_data", data).map(|d| Message::InitialData(Box::new(d)))
            }
            "queue_update" => payload("queue_update", data).map(Message::QueueUpdate),
            "queue_error" => payload("queue_error", data).map(Message::QueueError),
            "system_health" => payload("system_health", data).map(Message::SystemHealth),
            "api_health" => payload("api_health", data).map(Message::ApiHealth),
            "system_alert" => payload("system_alert", data).map(Message::SystemAlert),
            "sentiment_update" => {
                payload("sentiment_update", data).map(Message::SentimentUpdate)
            }
            "recovery_action" => payload("recovery_action", data).map(Message::RecoveryAction),
            "user_activity" => payload("user_activity", data).map(Message::UserActivity),
            "email_delivery" => payload("email_delivery", data).map(Message::EmailDelivery),
            other => Err(EnvelopeError::UnknownType(other.to_string())),
        }
    }

    fn data_value(&self) -> Value {
        let value = match self {
            Message::InitialData(d) => serde_json::to_value(d),
            Message::QueueUpdate(d) => serde_json::to_value(d),
            Message::QueueError(d) => serde_json::to_value(d),
            Message::SystemHealth(d) => serde_json::to_value(d),
            Message::ApiHealth(d) => serde_json::to_value(d),
            Message::SystemAlert(d) => serde_json::to_value(d),
            Message::SentimentUpdate(d) => serde_json::to_value(d),
            Message::RecoveryAction(d) => serde_json::to_value(d),
            Message::UserActivity(d) => serde_json::to_value(d),
            Message::EmailDelivery(d) => serde_json::to_value(d),
        };
        value.unwrap_or(Value::Null)
    }
}

fn payload<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    data: Value,
) -> Result<T, EnvelopeError> {
    serde_json::from_value(data).map_err(|source| EnvelopeError::Payload { kind, source })
}

/// The backend may send timestamps as ISO strings or epoch milliseconds.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawTimestamp> for String {
    fn from(ts: RawTimestamp) -> Self {
        match ts {
            RawTimestamp::Text(s) => s,
            RawTimestamp::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
}

/// A decoded `{ type, data, timestamp }` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Server timestamp, normalised to a string (numbers keep their decimal form).
    pub timestamp: Option<String>,
    pub message: Message,
}

impl Envelope {
    pub fn new(message: Message, timestamp: Option<String>) -> Self {
        Self { timestamp, message }
    }

    /// Decode one envelope from its JSON text.
    pub fn parse(text: &str) -> Result<Self, EnvelopeError> {
        let raw: RawEnvelope = serde_json::from_str(text)?;
        let message = Message::decode(&raw.kind, raw.data)?;
        Ok(Self {
            timestamp: raw.timestamp.map(String::from),
            message,
        })
    }

    /// Encode back to the wire shape. Used for recording sessions.
    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("type".to_string(), Value::from(self.message.kind()));
        obj.insert("data".to_string(), self.message.data_value());
        if let Some(ref ts) = self.timestamp {
            obj.insert("timestamp".to_string(), Value::from(ts.as_str()));
        }
        Value::Object(obj)
    }
}

//! JSON bodies exchanged with the intake backend.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::transport::{SendReply, SessionId, StartReply, UploadAck};

#[derive(Debug, Serialize)]
pub(crate) struct StartBody<'a> {
    pub name: &'a str,
    pub phone: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageBody<'a> {
    pub session_id: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StartPayload {
    pub session_id: String,
    pub bot_message: String,
}

impl From<StartPayload> for StartReply {
    fn from(payload: StartPayload) -> Self {
        Self {
            session_id: SessionId::new(payload.session_id),
            bot_message: payload.bot_message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePayload {
    pub bot_message: String,
    #[serde(default, deserialize_with = "lenient_quick_replies")]
    pub quick_replies: Option<Vec<String>>,
}

impl From<MessagePayload> for SendReply {
    fn from(payload: MessagePayload) -> Self {
        Self {
            bot_message: payload.bot_message,
            quick_replies: payload.quick_replies,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UploadPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub document_id: Option<String>,
}

impl From<UploadPayload> for UploadAck {
    fn from(payload: UploadPayload) -> Self {
        Self {
            status: payload.status,
            document_id: payload.document_id,
        }
    }
}

fn lenient_quick_replies<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(quick_replies_from_value(value))
}

/// Anything that is not a JSON array counts as "no quick replies".
pub(crate) fn quick_replies_from_value(value: Value) -> Option<Vec<String>> {
    let Value::Array(items) = value else {
        return None;
    };

    Some(items.into_iter().map(quick_reply_label).collect())
}

fn quick_reply_label(item: Value) -> String {
    match item {
        Value::String(text) => text,
        Value::Object(ref fields) => fields
            .get("title")
            .or_else(|| fields.get("text"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| item.to_string()),
        other => other.to_string(),
    }
}

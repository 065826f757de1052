//! Request body encoding.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::config::MEDIA_TYPE_JSON;
use crate::error_handling::HttpError;

/// A request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    /// Raw bytes, sent as-is
    Bytes(Bytes),
    /// Text, sent verbatim unless JSON encoding is requested
    Text(String),
    /// Any other value, sent as JSON
    Json(Value),
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Body::Json(value)
    }
}

impl Body {
    /// Serializes any `Serialize` value into a JSON body.
    pub fn json<T: serde::Serialize>(value: &T) -> Result<Self, HttpError> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(|e| HttpError::Encode(Arc::new(e)))
    }
}

/// An encoded payload and the content type it must be sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub bytes: Bytes,
    pub content_type: Option<&'static str>,
}

/// Encodes `body` for the wire.
///
/// Bytes pass through unchanged, as do strings unless `json_request` is set.
/// Every other non-null value is serialized as JSON. Empty bodies and JSON
/// `null` produce no payload.
pub fn encode(body: &Body, json_request: bool) -> Result<Option<EncodedBody>, HttpError> {
    let encoded = match body {
        Body::Empty | Body::Json(Value::Null) => return Ok(None),
        Body::Bytes(bytes) => EncodedBody {
            bytes: bytes.clone(),
            content_type: None,
        },
        Body::Text(text) if !json_request => EncodedBody {
            bytes: Bytes::from(text.clone()),
            content_type: None,
        },
        Body::Text(text) => json_payload(&Value::String(text.clone()))?,
        Body::Json(value) => json_payload(value)?,
    };
    Ok(Some(encoded))
}

fn json_payload(value: &Value) -> Result<EncodedBody, HttpError> {
    let bytes = serde_json::to_vec(value).map_err(|e| HttpError::Encode(Arc::new(e)))?;
    Ok(EncodedBody {
        bytes: Bytes::from(bytes),
        content_type: Some(MEDIA_TYPE_JSON),
    })
}

//! Error types for the Mixcloud client

use mixcloud_model::ModelError;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not valid JSON, or options could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Local file or runtime failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The API answered with an error payload
    #[error("{0}")]
    Api(#[from] ApiError),

    /// OAuth code exchange failed
    #[error("{0}")]
    OAuth(#[from] OAuthError),

    /// Caller-side precondition not met (missing token, oversized upload, ...)
    #[error("{0}")]
    Precondition(String),

    /// Failure raised by the model layer
    #[error(transparent)]
    Model(ModelError),
}

impl ClientError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        ClientError::Precondition(message.into())
    }
}

impl From<ModelError> for ClientError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Fetch(inner) => match inner.downcast::<ClientError>() {
                Ok(client) => *client,
                Err(other) => ClientError::Model(ModelError::Fetch(other)),
            },
            ModelError::PreconditionViolation(message) => ClientError::Precondition(message),
            other => ClientError::Model(other),
        }
    }
}

impl From<ClientError> for ModelError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Model(model) => model,
            other => ModelError::fetch(other),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error payload returned by the API: `{"error": {"type", "message", ...}}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiError {
    /// Error type, as named by the API
    pub error_type: String,
    /// Error message
    pub message: String,
    /// Any further fields of the error object
    pub extra: Map<String, Value>,
}

impl ApiError {
    /// Extract the error from a response payload.
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let mut info = match payload.get("error") {
            Some(Value::Object(info)) => info.clone(),
            _ => Map::new(),
        };
        let error_type = take_string(&mut info, "type");
        let message = take_string(&mut info, "message");
        Self {
            error_type,
            message,
            extra: info,
        }
    }
}

fn take_string(info: &mut Map<String, Value>, key: &str) -> String {
    match info.remove(key) {
        Some(Value::String(text)) => text,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extra = self
            .extra
            .iter()
            .filter(|(_, value)| is_truthy(value))
            .map(|(key, value)| format!("{}: {}", key, display_value(value)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut parts = Vec::new();
        if !self.message.is_empty() {
            parts.push(self.message.clone());
        }
        if !extra.is_empty() {
            parts.push(format!("({})", extra));
        }
        if !self.error_type.is_empty() {
            let error_type = if parts.is_empty() {
                self.error_type.clone()
            } else {
                format!("{}:", self.error_type)
            };
            parts.insert(0, error_type);
        }

        f.write_str(&parts.join(" "))
    }
}

impl std::error::Error for ApiError {}

/// OAuth failure payload: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OAuthError {
    /// Error message
    pub message: String,
}

impl OAuthError {
    /// Extract the error from a token response payload.
    pub fn from_payload(payload: &Value) -> Self {
        let message = match payload.get("error") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Self { message }
    }
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OAuthError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(value: Value) -> ApiError {
        match value {
            Value::Object(map) => ApiError::from_payload(&map),
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn full_api_error_message() {
        let err = api_error(json!({
            "error": {
                "type": "RateLimitException",
                "message": "You have made too many requests.",
                "retry_after": 30,
                "detail": "",
            }
        }));
        assert_eq!(
            err.to_string(),
            "RateLimitException: You have made too many requests. (retry_after: 30)"
        );
    }

    #[test]
    fn partial_api_error_messages() {
        assert_eq!(
            api_error(json!({"error": {"type": "OAuthException"}})).to_string(),
            "OAuthException"
        );
        assert_eq!(
            api_error(json!({"error": {"message": "Bad thing"}})).to_string(),
            "Bad thing"
        );
        assert_eq!(
            api_error(json!({"error": {"type": "X", "a": "b", "c": 0}})).to_string(),
            "X: (a: b)"
        );
        assert_eq!(api_error(json!({"error": "oops"})).to_string(), "");
    }

    #[test]
    fn oauth_error_displays_message() {
        let err = OAuthError::from_payload(&json!({"error": "invalid_grant"}));
        assert_eq!(err.to_string(), "invalid_grant");
        assert_eq!(OAuthError::from_payload(&json!({})).to_string(), "");
    }

    #[test]
    fn client_errors_survive_the_model_layer() {
        let api = ApiError {
            error_type: "NotFound".to_string(),
            ..ApiError::default()
        };
        let model: ModelError = ClientError::Api(api.clone()).into();
        assert!(matches!(model, ModelError::Fetch(_)));

        let back: ClientError = model.into();
        assert!(matches!(back, ClientError::Api(ref inner) if *inner == api));
    }

    #[test]
    fn model_errors_map_to_client_errors() {
        let err: ClientError = ModelError::KeyNotFound("x".to_string()).into();
        assert!(matches!(err, ClientError::Model(ModelError::KeyNotFound(_))));

        let err: ClientError = ModelError::PreconditionViolation("mixed".to_string()).into();
        assert!(matches!(err, ClientError::Precondition(ref m) if m == "mixed"));
    }
}

//! Gate settings loaded from configuration files.

use http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::GateConfigError;
use crate::factory::GateFactory;
use crate::options::{ErrorMessage, GateOptions};

/// Serializable gate overrides.
///
/// ```yaml
/// message: "Authentication Failed"
/// status: 401
/// error_json: { ok: false, success: false }
/// error_message: "Authentication service unavailable"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GateSettings {
    /// Default failure message; falls back to the preset's.
    pub message: Option<String>,

    /// Default failure status; falls back to the preset's.
    pub status: Option<u16>,

    /// Fields merged into every failure body. Must be a JSON object.
    pub error_json: Value,

    /// Fixed message for predicate faults. Unset means "use the error's text".
    pub error_message: Option<String>,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            message: None,
            status: None,
            error_json: serde_json::json!({ "ok": false }),
            error_message: None,
        }
    }
}

impl GateSettings {
    /// Build the factory, starting from `preset` for unset fields.
    ///
    /// # Errors
    ///
    /// Returns [`GateConfigError`] for an empty message or an invalid status code.
    pub fn factory(&self, preset: &GateFactory) -> Result<GateFactory, GateConfigError> {
        let message = match &self.message {
            Some(message) if message.is_empty() => {
                return Err(GateConfigError::EmptyDefaultMessage);
            }
            Some(message) => message.clone(),
            None => preset.default_message().to_owned(),
        };

        let status = match self.status {
            Some(code) => parse_status(code)?,
            None => preset.default_status(),
        };

        Ok(GateFactory::new(message, status))
    }

    /// Build the per-gate options. The error handler is not configurable
    /// here; attach one with [`GateOptions::with_error_handler`].
    ///
    /// # Errors
    ///
    /// Returns [`GateConfigError`] when `error_json` is not an object or
    /// `error_message` is empty.
    pub fn options(&self) -> Result<GateOptions, GateConfigError> {
        let error_json = match &self.error_json {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => return Err(GateConfigError::ErrorJsonNotObject(json_kind(other))),
        };

        let error_message = match &self.error_message {
            Some(text) if text.is_empty() => return Err(GateConfigError::EmptyErrorMessage),
            Some(text) => ErrorMessage::Fixed(text.clone()),
            None => ErrorMessage::FromError,
        };

        Ok(GateOptions::new()
            .with_error_json(error_json)
            .with_error_message(error_message))
    }
}

fn parse_status(code: u16) -> Result<StatusCode, GateConfigError> {
    StatusCode::from_u16(code).map_err(|_| GateConfigError::InvalidStatus(code))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! The response a gate terminates a request with.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use serde_json::{Map, Value};

use crate::options::{FailureKind, FailureReport};

/// Early termination produced by a [`Gate`](crate::Gate).
#[derive(Debug, Clone, PartialEq)]
pub struct GateRejection {
    pub kind: FailureKind,
    pub status: StatusCode,
    pub body: Map<String, Value>,
}

impl GateRejection {
    /// Build `{ "error": message, ...error_json }`.
    ///
    /// `error_json` is merged last so its keys win, `error` included.
    pub(crate) fn new(
        kind: FailureKind,
        status: StatusCode,
        message: String,
        error_json: &Map<String, Value>,
    ) -> Self {
        let mut body = Map::with_capacity(error_json.len() + 1);
        body.insert("error".to_owned(), Value::String(message));
        body.extend(error_json.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { kind, status, body }
    }

    /// The `error` field as sent to the client.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }

    /// What the error handler is told about this rejection.
    #[must_use]
    pub fn report(&self) -> FailureReport {
        FailureReport {
            kind: self.kind,
            status: self.status,
            body: self.body.clone(),
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (self.status, Json(Value::Object(self.body))).into_response()
    }
}

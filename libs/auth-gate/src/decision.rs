//! Predicate outcomes.

use http::StatusCode;
use serde_json::Value;

/// Result of a predicate that completed without failing.
///
/// Only [`Decision::Allow`] lets a request through. Every other outcome is a
/// denial, optionally carrying a [`Denial`] with status and message overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Forward the request to the next pipeline stage.
    Allow,
    /// Terminate the request.
    Deny(Denial),
}

impl Decision {
    /// Deny using the factory defaults.
    #[must_use]
    pub fn deny() -> Self {
        Self::Deny(Denial::default())
    }

    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Failure descriptor returned by a predicate that rejects a request.
///
/// Missing fields fall back to the factory's default status and message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Denial {
    pub status: Option<StatusCode>,
    pub error: Option<String>,
}

impl Denial {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Status to respond with, given the factory default.
    pub(crate) fn status_or(&self, default: StatusCode) -> StatusCode {
        self.status.unwrap_or(default)
    }

    /// Message to respond with, given the factory default. Empty messages count as absent.
    pub(crate) fn error_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.error.as_deref().filter(|e| !e.is_empty()).unwrap_or(default)
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Self::Allow } else { Self::deny() }
    }
}

impl From<Denial> for Decision {
    fn from(denial: Denial) -> Self {
        Self::Deny(denial)
    }
}

impl From<Option<Denial>> for Decision {
    fn from(denial: Option<Denial>) -> Self {
        Self::Deny(denial.unwrap_or_default())
    }
}

impl From<()> for Decision {
    fn from((): ()) -> Self {
        Self::deny()
    }
}

/// Loosely typed outcome, e.g. a policy service answer.
///
/// Only the JSON literal `true` allows; any other value denies, truthy objects
/// included. Objects may carry `status` and `error` fields.
impl From<Value> for Decision {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => Self::Allow,
            Value::Object(map) => {
                let status = map
                    .get("status")
                    .and_then(Value::as_u64)
                    .and_then(|code| u16::try_from(code).ok())
                    .and_then(|code| StatusCode::from_u16(code).ok());
                let error = map
                    .get("error")
                    .and_then(Value::as_str)
                    .filter(|e| !e.is_empty())
                    .map(ToOwned::to_owned);
                Self::Deny(Denial { status, error })
            }
            _ => Self::deny(),
        }
    }
}

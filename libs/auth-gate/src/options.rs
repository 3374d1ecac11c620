//! Per-gate overrides: extra response fields, error message derivation and
//! the failure hook.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use serde_json::{Map, Value};
use tower::BoxError;

/// Why a gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The predicate completed and did not allow the request.
    Denied,
    /// The predicate failed or panicked.
    PredicateFault,
}

/// What the error handler receives after every rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct FailureReport {
    pub kind: FailureKind,
    pub status: StatusCode,
    /// The exact JSON body sent to the client.
    pub body: Map<String, Value>,
}

/// Hook invoked after every rejection, e.g. to ship failures to an APM service.
///
/// Errors and panics raised here are logged and otherwise ignored; the
/// response has already been produced.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// # Errors
    ///
    /// Any error is logged by the gate and otherwise ignored.
    async fn handle(&self, report: FailureReport) -> Result<(), BoxError>;
}

/// Error handler backed by a synchronous closure. See [`handler_fn`].
pub struct HandlerFn<F>(F);

#[must_use]
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn(f)
}

#[async_trait]
impl<F, E> ErrorHandler for HandlerFn<F>
where
    F: Fn(FailureReport) -> Result<(), E> + Send + Sync,
    E: Into<BoxError>,
{
    async fn handle(&self, report: FailureReport) -> Result<(), BoxError> {
        (self.0)(report).map_err(Into::into)
    }
}

/// Error handler backed by a closure returning a future. See [`async_handler_fn`].
pub struct AsyncHandlerFn<F>(F);

#[must_use]
pub fn async_handler_fn<F>(f: F) -> AsyncHandlerFn<F> {
    AsyncHandlerFn(f)
}

#[async_trait]
impl<F, Fut, E> ErrorHandler for AsyncHandlerFn<F>
where
    F: Fn(FailureReport) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), E>> + Send,
    E: Into<BoxError>,
{
    async fn handle(&self, report: FailureReport) -> Result<(), BoxError> {
        (self.0)(report).await.map_err(Into::into)
    }
}

type MessageFn = dyn Fn(&BoxError) -> String + Send + Sync;

/// How the client-facing message is derived from a predicate fault.
#[derive(Clone, Default)]
pub enum ErrorMessage {
    /// The error's own text, or the factory default when that text is empty.
    #[default]
    FromError,
    /// Always the same text, whatever the error.
    Fixed(String),
    /// Caller supplied derivation.
    Custom(Arc<MessageFn>),
}

impl ErrorMessage {
    #[must_use]
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&BoxError) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    pub(crate) fn render(&self, err: &BoxError, default_message: &str) -> String {
        match self {
            Self::FromError => {
                let text = err.to_string();
                if text.is_empty() {
                    default_message.to_owned()
                } else {
                    text
                }
            }
            Self::Fixed(text) => text.clone(),
            Self::Custom(f) => f(err),
        }
    }
}

impl fmt::Debug for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FromError => f.write_str("FromError"),
            Self::Fixed(text) => f.debug_tuple("Fixed").field(text).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<&str> for ErrorMessage {
    fn from(text: &str) -> Self {
        Self::Fixed(text.to_owned())
    }
}

impl From<String> for ErrorMessage {
    fn from(text: String) -> Self {
        Self::Fixed(text)
    }
}

/// Optional overrides applied to a single gate.
///
/// Defaults: `error_json` is `{"ok": false}`, messages come from the error
/// itself and no error handler is installed.
#[derive(Clone)]
pub struct GateOptions {
    pub(crate) error_json: Map<String, Value>,
    pub(crate) error_message: ErrorMessage,
    pub(crate) error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl Default for GateOptions {
    fn default() -> Self {
        let mut error_json = Map::new();
        error_json.insert("ok".to_owned(), Value::Bool(false));
        Self {
            error_json,
            error_message: ErrorMessage::default(),
            error_handler: None,
        }
    }
}

impl GateOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fields merged into every failure body.
    ///
    /// Fields are merged after `error`, so an `error` key here overrides
    /// the computed message.
    #[must_use]
    pub fn with_error_json(mut self, error_json: Map<String, Value>) -> Self {
        self.error_json = error_json;
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, error_message: impl Into<ErrorMessage>) -> Self {
        self.error_message = error_message.into();
        self
    }

    #[must_use]
    pub fn with_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn with_shared_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    #[must_use]
    pub fn error_json(&self) -> &Map<String, Value> {
        &self.error_json
    }

    #[must_use]
    pub fn error_message(&self) -> &ErrorMessage {
        &self.error_message
    }

    #[must_use]
    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }
}

impl fmt::Debug for GateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateOptions")
            .field("error_json", &self.error_json)
            .field("error_message", &self.error_message)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

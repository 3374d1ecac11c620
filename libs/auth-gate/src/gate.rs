//! The gate middleware.
//!
//! Each invocation is a one-shot flow: evaluate the predicate, then either
//! proceed or terminate with a [`GateRejection`] and report the failure.
//! Nothing raised by the predicate or the error handler escapes the gate.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures_util::FutureExt;
use http::StatusCode;
use http::request::Parts;
use tower::BoxError;
use tracing::Instrument;

use crate::decision::Decision;
use crate::errors::PredicatePanic;
use crate::factory::GateFactory;
use crate::options::{FailureKind, FailureReport, GateOptions};
use crate::predicate::Predicate;
use crate::rejection::GateRejection;

/// Outcome of one gate invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Proceed,
    Terminated(GateRejection),
}

/// Authentication / authorization gate built by a [`GateFactory`].
///
/// Cheap to clone; all clones share the same immutable configuration, so
/// concurrent invocations never interfere with each other.
pub struct Gate<R> {
    inner: Arc<GateInner<R>>,
}

struct GateInner<R> {
    factory: GateFactory,
    predicate: Arc<dyn Predicate<R>>,
    options: GateOptions,
}

impl<R> Clone for Gate<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for Gate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("factory", &self.inner.factory)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<R> Gate<R>
where
    R: Sync,
{
    pub(crate) fn new(
        factory: GateFactory,
        predicate: Arc<dyn Predicate<R>>,
        options: GateOptions,
    ) -> Self {
        Self {
            inner: Arc::new(GateInner {
                factory,
                predicate,
                options,
            }),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &GateFactory {
        &self.inner.factory
    }

    #[must_use]
    pub fn options(&self) -> &GateOptions {
        &self.inner.options
    }

    /// Run the predicate against `request` and decide.
    ///
    /// Only decides: the error handler is not invoked here. Callers that
    /// emit the rejection themselves pass [`GateRejection::report`] to
    /// [`Gate::report_failure`] afterwards; [`Gate::run`] does both.
    pub async fn evaluate(&self, request: &R) -> Verdict {
        let predicate = &self.inner.predicate;
        let outcome = AssertUnwindSafe(async { predicate.evaluate(request).await })
            .catch_unwind()
            .await;

        let (kind, status, message) = match outcome {
            Ok(Ok(Decision::Allow)) => return Verdict::Proceed,
            Ok(Ok(Decision::Deny(denial))) => {
                let status = denial.status_or(self.inner.factory.default_status());
                tracing::debug!(status = status.as_u16(), "Gate denied request");
                let message = denial.error_or(self.inner.factory.default_message());
                (FailureKind::Denied, status, message.to_owned())
            }
            Ok(Err(err)) => self.predicate_fault(&err),
            Err(payload) => {
                let err: BoxError = Box::new(PredicatePanic(panic_message(payload.as_ref())));
                self.predicate_fault(&err)
            }
        };

        Verdict::Terminated(GateRejection::new(
            kind,
            status,
            message,
            &self.inner.options.error_json,
        ))
    }

    fn predicate_fault(&self, err: &BoxError) -> (FailureKind, StatusCode, String) {
        let status = self.inner.factory.default_status();
        tracing::warn!(status = status.as_u16(), error = %err, "Gate predicate failed");

        let default_message = self.inner.factory.default_message();
        let error_message = &self.inner.options.error_message;
        let render = AssertUnwindSafe(|| error_message.render(err, default_message));
        let message = std::panic::catch_unwind(render).unwrap_or_else(|payload| {
            tracing::error!(
                panic = %panic_message(payload.as_ref()),
                "Gate error_message panicked, using default message"
            );
            default_message.to_owned()
        });

        (FailureKind::PredicateFault, status, message)
    }

    /// Hand a failure to the configured error handler, if any.
    ///
    /// Inside a Tokio runtime the handler runs on a detached task carrying
    /// the current span, so this returns immediately. Without one it is
    /// driven to completion in place. Handler errors and panics are logged
    /// and never returned.
    pub async fn report_failure(&self, report: FailureReport) {
        let Some(handler) = self.inner.options.error_handler.clone() else {
            return;
        };

        let task = async move {
            let outcome = AssertUnwindSafe(async move { handler.handle(report).await })
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!(error = %err, "Gate error handler failed"),
                Err(payload) => tracing::error!(
                    panic = %panic_message(payload.as_ref()),
                    "Gate error handler panicked"
                ),
            }
        }
        .instrument(tracing::Span::current());

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(task);
        } else {
            task.await;
        }
    }
}

impl Gate<Parts> {
    /// Middleware entry point: the predicate sees the request head only.
    ///
    /// On rejection the response is built first, then the error handler
    /// is dispatched.
    pub async fn run(&self, request: Request, next: Next) -> Response {
        let (parts, body) = request.into_parts();
        match self.evaluate(&parts).await {
            Verdict::Proceed => next.run(Request::from_parts(parts, body)).await,
            Verdict::Terminated(rejection) => {
                let report = rejection.report();
                let response = rejection.into_response();
                self.report_failure(report).await;
                response
            }
        }
    }
}

/// Gate middleware for `axum::middleware::from_fn_with_state`.
///
/// ```ignore
/// let app = Router::new()
///     .route("/me", get(me))
///     .layer(axum::middleware::from_fn_with_state(gate, gate_middleware));
/// ```
pub async fn gate_middleware(
    State(gate): State<Gate<Parts>>,
    request: Request,
    next: Next,
) -> Response {
    gate.run(request, next).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_owned()
    }
}

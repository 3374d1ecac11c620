//! Predicate abstraction and closure adapters.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tower::BoxError;

use crate::decision::Decision;

/// Decides whether a request may pass a [`Gate`](crate::Gate).
///
/// `Ok` means the predicate completed; only [`Decision::Allow`] lets the
/// request through. `Err` is a predicate fault: the gate rejects with the
/// factory's default status and a message derived from the error.
#[async_trait]
pub trait Predicate<R>: Send + Sync
where
    R: Sync,
{
    /// # Errors
    ///
    /// Returns an error when the check itself could not be carried out.
    async fn evaluate(&self, request: &R) -> Result<Decision, BoxError>;
}

#[async_trait]
impl<R, P> Predicate<R> for Arc<P>
where
    R: Sync,
    P: Predicate<R> + ?Sized,
{
    async fn evaluate(&self, request: &R) -> Result<Decision, BoxError> {
        (**self).evaluate(request).await
    }
}

/// Predicate backed by a synchronous closure. See [`predicate_fn`].
#[derive(Clone)]
pub struct PredicateFn<F>(F);

/// Wrap a synchronous closure as a [`Predicate`].
///
/// The closure may return anything convertible into a [`Decision`]
/// (`bool`, [`Denial`](crate::Denial), `serde_json::Value`, ...).
#[must_use]
pub fn predicate_fn<F>(f: F) -> PredicateFn<F> {
    PredicateFn(f)
}

#[async_trait]
impl<R, F, D, E> Predicate<R> for PredicateFn<F>
where
    R: Sync,
    F: Fn(&R) -> Result<D, E> + Send + Sync,
    D: Into<Decision>,
    E: Into<BoxError>,
{
    async fn evaluate(&self, request: &R) -> Result<Decision, BoxError> {
        (self.0)(request).map(Into::into).map_err(Into::into)
    }
}

/// Predicate backed by a closure returning a future. See [`async_predicate_fn`].
#[derive(Clone)]
pub struct AsyncPredicateFn<F>(F);

/// Wrap an asynchronous closure as a [`Predicate`].
///
/// The returned future must not borrow the request: copy what the check
/// needs (headers, extensions) before the `async move` block.
#[must_use]
pub fn async_predicate_fn<F>(f: F) -> AsyncPredicateFn<F> {
    AsyncPredicateFn(f)
}

#[async_trait]
impl<R, F, Fut, D, E> Predicate<R> for AsyncPredicateFn<F>
where
    R: Sync,
    F: Fn(&R) -> Fut + Send + Sync,
    Fut: Future<Output = Result<D, E>> + Send,
    D: Into<Decision>,
    E: Into<BoxError>,
{
    async fn evaluate(&self, request: &R) -> Result<Decision, BoxError> {
        (self.0)(request)
            .await
            .map(Into::into)
            .map_err(Into::into)
    }
}

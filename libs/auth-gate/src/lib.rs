#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Auth Gate
//!
//! Builds authentication / authorization gate middlewares around a caller
//! supplied [`Predicate`]:
//!
//! - [`GateFactory`] - holds the default failure message and status code
//! - [`Gate`] - the produced middleware; forwards or rejects a request
//! - [`Decision`] / [`Denial`] - what a predicate returns
//! - [`GateOptions`] - `error_json`, `error_message` and `error_handler` overrides
//! - [`GateSettings`] - the same overrides loaded from configuration
//!
//! ## Usage
//!
//! ```ignore
//! use auth_gate::{GateFactory, GateOptions, gate_middleware, predicate_fn};
//! use axum::middleware::from_fn_with_state;
//! use http::request::Parts;
//!
//! let authn = GateFactory::authentication().create(
//!     predicate_fn(|parts: &Parts| {
//!         Ok::<_, std::convert::Infallible>(parts.extensions.get::<Identity>().is_some())
//!     }),
//!     GateOptions::default(),
//! );
//!
//! let app = axum::Router::new()
//!     .route("/me", axum::routing::get(me))
//!     .layer(from_fn_with_state(authn, gate_middleware));
//! ```

pub mod config;
pub mod decision;
pub mod errors;
pub mod factory;
pub mod gate;
pub mod options;
pub mod predicate;
pub mod rejection;

pub use config::GateSettings;
pub use decision::{Decision, Denial};
pub use errors::GateConfigError;
pub use factory::{
    AUTHENTICATION_FAILED, AUTHORIZATION_FAILED, GateFactory, create_authn_gate, create_authz_gate,
};
pub use gate::{Gate, Verdict, gate_middleware};
pub use options::{
    ErrorHandler, ErrorMessage, FailureKind, FailureReport, GateOptions, async_handler_fn,
    handler_fn,
};
pub use predicate::{Predicate, async_predicate_fn, predicate_fn};
pub use rejection::GateRejection;

/// Opaque failure raised by predicates and error handlers.
pub use tower::BoxError;

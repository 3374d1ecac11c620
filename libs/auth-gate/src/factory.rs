//! Gate factories.
//!
//! Authentication and authorization gates share the same machinery and only
//! differ in their default message and status code.

use std::sync::Arc;

use http::StatusCode;

use crate::gate::Gate;
use crate::options::GateOptions;
use crate::predicate::Predicate;

pub const AUTHENTICATION_FAILED: &str = "Authentication Failed";
pub const AUTHORIZATION_FAILED: &str = "Authorization Failed";

/// Produces [`Gate`]s sharing a default failure message and status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateFactory {
    default_message: String,
    default_status: StatusCode,
}

impl GateFactory {
    #[must_use]
    pub fn new(default_message: impl Into<String>, default_status: StatusCode) -> Self {
        Self {
            default_message: default_message.into(),
            default_status,
        }
    }

    /// Identity could not be established: `401 Unauthorized`.
    #[must_use]
    pub fn authentication() -> Self {
        Self::new(AUTHENTICATION_FAILED, StatusCode::UNAUTHORIZED)
    }

    /// Identity is known but access is refused: `403 Forbidden`.
    #[must_use]
    pub fn authorization() -> Self {
        Self::new(AUTHORIZATION_FAILED, StatusCode::FORBIDDEN)
    }

    #[must_use]
    pub fn default_message(&self) -> &str {
        &self.default_message
    }

    #[must_use]
    pub fn default_status(&self) -> StatusCode {
        self.default_status
    }

    /// Build a gate around `predicate`.
    ///
    /// Nothing runs here; the predicate is only called when the gate is.
    #[must_use]
    pub fn create<R, P>(&self, predicate: P, options: GateOptions) -> Gate<R>
    where
        R: Sync,
        P: Predicate<R> + 'static,
    {
        Gate::new(self.clone(), Arc::new(predicate), options)
    }

    #[must_use]
    pub fn create_default<R, P>(&self, predicate: P) -> Gate<R>
    where
        R: Sync,
        P: Predicate<R> + 'static,
    {
        self.create(predicate, GateOptions::default())
    }
}

/// Authentication gate with the standard defaults.
#[must_use]
pub fn create_authn_gate<R, P>(predicate: P, options: GateOptions) -> Gate<R>
where
    R: Sync,
    P: Predicate<R> + 'static,
{
    GateFactory::authentication().create(predicate, options)
}

/// Authorization gate with the standard defaults.
#[must_use]
pub fn create_authz_gate<R, P>(predicate: P, options: GateOptions) -> Gate<R>
where
    R: Sync,
    P: Predicate<R> + 'static,
{
    GateFactory::authorization().create(predicate, options)
}

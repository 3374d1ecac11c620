//! Bearer token resolution.
//!
//! Runs before the gates and stores the caller's [`Identity`] in request
//! extensions; the gates only inspect what this middleware left there.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::HeaderMap;
use serde::Serialize;

use crate::config::TokenMapping;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub scopes: Vec<String>,
}

impl Identity {
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

/// Token to identity lookup built from configuration.
#[derive(Debug, Default)]
pub struct TokenTable {
    identities: HashMap<String, Identity>,
}

impl TokenTable {
    #[must_use]
    pub fn from_config(tokens: &[TokenMapping]) -> Self {
        let identities = tokens
            .iter()
            .map(|m| {
                (
                    m.token.clone(),
                    Identity {
                        subject: m.subject.clone(),
                        scopes: m.scopes.clone(),
                    },
                )
            })
            .collect();
        Self { identities }
    }

    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&Identity> {
        if token.is_empty() {
            return None;
        }
        self.identities.get(token)
    }
}

/// Resolve the bearer token, if any, into an [`Identity`] extension.
///
/// Unknown or missing tokens are not rejected here; that is the
/// authentication gate's decision.
pub async fn identify(
    State(tokens): State<Arc<TokenTable>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = extract_bearer_token(req.headers()).and_then(|t| tokens.resolve(t)) {
        tracing::debug!(subject = %identity.subject, "Resolved bearer token");
        req.extensions_mut().insert(identity.clone());
    }
    next.run(req).await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

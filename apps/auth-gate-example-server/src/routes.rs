//! HTTP routes and gate wiring.

use std::convert::Infallible;
use std::sync::Arc;

use auth_gate::{
    BoxError, Decision, Denial, ErrorHandler, FailureReport, Gate, GateConfigError, GateFactory,
    gate_middleware, predicate_fn,
};
use async_trait::async_trait;
use axum::extract::Extension;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Json, Router};
use http::request::Parts;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::identity::{Identity, TokenTable, identify};

/// Build the application router from configuration.
///
/// # Errors
///
/// Returns [`GateConfigError`] if either gate's settings are invalid.
pub fn build_router(cfg: &AppConfig) -> Result<Router, GateConfigError> {
    let authn = authn_gate(cfg)?;
    let authz = authz_gate(cfg)?;
    let tokens = Arc::new(TokenTable::from_config(&cfg.tokens));

    let me = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(authn.clone(), gate_middleware));

    // Layers run bottom-up: authentication first, then authorization.
    let admin = Router::new()
        .route("/admin", get(admin))
        .route_layer(from_fn_with_state(authz, gate_middleware))
        .route_layer(from_fn_with_state(authn, gate_middleware));

    Ok(Router::new()
        .route("/health", get(health))
        .merge(me)
        .merge(admin)
        .layer(from_fn_with_state(tokens, identify))
        .layer(TraceLayer::new_for_http()))
}

fn authn_gate(cfg: &AppConfig) -> Result<Gate<Parts>, GateConfigError> {
    let factory = cfg.authn.factory(&GateFactory::authentication())?;
    let options = cfg.authn.options()?.with_error_handler(FailureLogger { gate: "authn" });

    Ok(factory.create(
        predicate_fn(|parts: &Parts| {
            Ok::<_, Infallible>(parts.extensions.get::<Identity>().is_some())
        }),
        options,
    ))
}

fn authz_gate(cfg: &AppConfig) -> Result<Gate<Parts>, GateConfigError> {
    let factory = cfg.authz.factory(&GateFactory::authorization())?;
    let options = cfg.authz.options()?.with_error_handler(FailureLogger { gate: "authz" });
    let scope = cfg.admin_scope.clone();

    Ok(factory.create(
        predicate_fn(move |parts: &Parts| -> Result<Decision, BoxError> {
            let identity = parts
                .extensions
                .get::<Identity>()
                .ok_or("identity missing from request")?;

            if identity.has_scope(&scope) {
                Ok(Decision::Allow)
            } else {
                Ok(Denial::new()
                    .error(format!("Missing required scope: {scope}"))
                    .into())
            }
        }),
        options,
    ))
}

/// Logs every gate failure; stands in for shipping reports to an APM service.
#[derive(Debug, Clone, Copy)]
struct FailureLogger {
    gate: &'static str,
}

#[async_trait]
impl ErrorHandler for FailureLogger {
    async fn handle(&self, report: FailureReport) -> Result<(), BoxError> {
        let body = Value::Object(report.body);
        tracing::info!(
            gate = self.gate,
            kind = ?report.kind,
            status = report.status.as_u16(),
            body = %body,
            "Request rejected by gate"
        );
        Ok(())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

async fn admin(Extension(identity): Extension<Identity>) -> Json<Value> {
    Json(json!({ "subject": identity.subject, "admin": true }))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::TokenMapping;
    use auth_gate::FailureKind;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    fn config() -> AppConfig {
        AppConfig {
            tokens: vec![
                TokenMapping {
                    token: "alice-token".to_owned(),
                    subject: "alice".to_owned(),
                    scopes: vec!["admin".to_owned()],
                },
                TokenMapping {
                    token: "bob-token".to_owned(),
                    subject: "bob".to_owned(),
                    scopes: vec!["read".to_owned()],
                },
            ],
            ..AppConfig::default()
        }
    }

    async fn get_json(router: Router, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match builder.body(Body::empty()) {
            Ok(request) => request,
            Err(e) => panic!("invalid request: {e}"),
        };

        let response = match router.oneshot(request).await {
            Ok(response) => response,
            Err(e) => match e {},
        };
        let status = response.status();
        let bytes = match response.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => panic!("failed to read body: {e}"),
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn router(cfg: &AppConfig) -> Router {
        match build_router(cfg) {
            Ok(router) => router,
            Err(e) => panic!("invalid config: {e}"),
        }
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = get_json(router(&config()), "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn me_requires_a_known_token() {
        let app = router(&config());

        let (status, body) = get_json(app.clone(), "/me", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Authentication Failed", "ok": false }));

        let (status, _) = get_json(app.clone(), "/me", Some("mallory-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = get_json(app, "/me", Some("bob-token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "subject": "bob", "scopes": ["read"] }));
    }

    #[tokio::test]
    async fn admin_requires_authentication_then_scope() {
        let app = router(&config());

        let (status, body) = get_json(app.clone(), "/admin", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Authentication Failed", "ok": false }));

        let (status, body) = get_json(app.clone(), "/admin", Some("bob-token")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({ "error": "Missing required scope: admin", "ok": false })
        );

        let (status, body) = get_json(app, "/admin", Some("alice-token")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "subject": "alice", "admin": true }));
    }

    #[tokio::test]
    async fn configured_overrides_shape_the_response() {
        let mut cfg = config();
        cfg.authz.status = Some(404);
        cfg.authz.error_json = json!({ "ok": false, "success": false });

        let (status, body) = get_json(router(&cfg), "/admin", Some("bob-token")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "error": "Missing required scope: admin", "ok": false, "success": false })
        );

        cfg.admin_scope = "root".to_owned();
        let (status, body) = get_json(router(&cfg), "/admin", Some("alice-token")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "error": "Missing required scope: root", "ok": false, "success": false })
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn failure_logger_records_the_report() {
        let Value::Object(body) = json!({ "error": "Missing required scope: admin", "ok": false })
        else {
            panic!("expected object");
        };
        let report = FailureReport {
            kind: FailureKind::Denied,
            status: StatusCode::FORBIDDEN,
            body,
        };

        let logger = FailureLogger { gate: "authz" };
        assert!(logger.handle(report).await.is_ok());

        assert!(logs_contain("Request rejected by gate"));
        assert!(logs_contain("status=403"));
        assert!(logs_contain("Missing required scope: admin"));
    }

    #[test]
    fn invalid_gate_settings_fail_router_construction() {
        let mut cfg = config();
        cfg.authn.status = Some(1000);
        assert_eq!(
            build_router(&cfg).err(),
            Some(GateConfigError::InvalidStatus(1000))
        );
    }
}

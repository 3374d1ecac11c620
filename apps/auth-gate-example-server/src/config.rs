//! Server configuration: YAML file overlaid with `AUTH_GATE__*` environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use auth_gate::GateSettings;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;

pub const ENV_PREFIX: &str = "AUTH_GATE__";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,

    /// Scope required by the `/admin` route.
    pub admin_scope: String,

    /// Overrides for the authentication gate.
    pub authn: GateSettings,

    /// Overrides for the authorization gate.
    pub authz: GateSettings,

    /// Static bearer tokens accepted by the server.
    pub tokens: Vec<TokenMapping>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8087)),
            admin_scope: "admin".to_owned(),
            authn: GateSettings::default(),
            authz: GateSettings::default(),
            tokens: Vec::new(),
        }
    }
}

/// A bearer token and the identity it maps to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    pub token: String,
    pub subject: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl AppConfig {
    /// Load from an optional YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }
}

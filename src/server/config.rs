use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::authn::config::AuthnConfig;
use crate::authz::config::AuthzConfig;
use crate::client::config::ProviderConfig;
use crate::config::{expandenv, CommonConfig, PathSet};
use crate::handlers::config::{
    CallbackHandlerOptions, LogoutHandlerOptions, RouteResource, SecurityHandlerOptions,
};
use crate::logs::LogsConfig;
use crate::session::config::SessionConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,

    #[serde(default = "ServerConfig::default_ssl")]
    pub ssl: bool,

    #[serde(default = "ServerConfig::default_cert_path")]
    pub cert_path: String,

    #[serde(default = "ServerConfig::default_key_path")]
    pub key_path: String,

    #[serde(default = "ServerConfig::default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    #[serde(default = "ServerConfig::default_workers")]
    pub workers: u64,

    #[serde(default = "LogsConfig::default")]
    pub logs: LogsConfig,

    #[serde(default = "SessionConfig::default")]
    pub session: SessionConfig,

    #[serde(default = "ProviderConfig::default")]
    pub provider: ProviderConfig,

    #[serde(default = "AuthnConfig::default")]
    pub authn: AuthnConfig,

    #[serde(default = "AuthzConfig::default")]
    pub authz: AuthzConfig,

    #[serde(default = "CallbackHandlerOptions::default")]
    pub callback: CallbackHandlerOptions,

    #[serde(default = "LogoutHandlerOptions::default")]
    pub logout: LogoutHandlerOptions,

    #[serde(default = "ServerConfig::default_routes")]
    pub routes: Vec<SecurityHandlerOptions>,
}

impl CommonConfig for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            ssl: Self::default_ssl(),
            cert_path: Self::default_cert_path(),
            key_path: Self::default_key_path(),
            keep_alive_secs: Self::default_keep_alive_secs(),
            workers: Self::default_workers(),
            logs: LogsConfig::default(),
            session: SessionConfig::default(),
            provider: ProviderConfig::default(),
            authn: AuthnConfig::default(),
            authz: AuthzConfig::default(),
            callback: CallbackHandlerOptions::default(),
            logout: LogoutHandlerOptions::default(),
            routes: Self::default_routes(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        self.bind = expandenv("bind", &self.bind)?;
        if self.bind.is_empty() {
            bail!("bind cannot be empty");
        }

        if self.ssl {
            self.cert_path = expandenv("cert_path", &self.cert_path)?;
            if self.cert_path.is_empty() {
                let path = ps.pki_path.join("server.crt");
                self.cert_path = format!("{}", path.display());
            }

            self.key_path = expandenv("key_path", &self.key_path)?;
            if self.key_path.is_empty() {
                let path = ps.pki_path.join("server.key");
                self.key_path = format!("{}", path.display());
            }
        }

        self.logs.complete(ps).context("logs")?;
        self.session.complete(ps).context("session")?;
        self.provider.complete(ps).context("provider")?;
        self.authn.complete(ps).context("authn")?;
        self.authz.complete(ps).context("authz")?;
        self.callback.complete(ps).context("callback")?;
        self.logout.complete(ps).context("logout")?;

        for route in self.routes.iter_mut() {
            route
                .complete()
                .with_context(|| format!("route '{}'", route.prefix))?;
        }
        if self.needs_token_generator() && !self.authn.stateless {
            // The token config is only completed by authn when bearer tokens
            // are accepted.
            self.authn.token.complete(ps).context("authn token")?;
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn default_bind() -> String {
        String::from("127.0.0.1:8080")
    }

    pub fn default_ssl() -> bool {
        false
    }

    pub fn default_cert_path() -> String {
        String::new()
    }

    pub fn default_key_path() -> String {
        String::new()
    }

    pub fn default_keep_alive_secs() -> u64 {
        0
    }

    pub fn default_workers() -> u64 {
        0
    }

    pub fn default_routes() -> Vec<SecurityHandlerOptions> {
        vec![]
    }

    /// Whether keys for signing tokens have to be loaded.
    pub fn needs_token_generator(&self) -> bool {
        self.routes
            .iter()
            .any(|route| route.resource == RouteResource::Token)
    }
}

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::client::CLIENT_NAME_PARAM;
use crate::config::{expandenv, CommonConfig, PathSet};

/// One protected route: requests whose path starts with `prefix` must be
/// authenticated through one of `clients` and pass every authorizer in
/// `authorizers`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SecurityHandlerOptions {
    pub prefix: String,

    /// Clients offered to unauthenticated users, the first one is used for
    /// the redirect.
    pub clients: Vec<String>,

    #[serde(default = "SecurityHandlerOptions::default_authorizers")]
    pub authorizers: Vec<String>,

    /// Pass every profile of the session to the authorizers, not only the
    /// primary one.
    #[serde(default = "SecurityHandlerOptions::default_multi_profile")]
    pub multi_profile: bool,

    #[serde(default = "SecurityHandlerOptions::default_resource")]
    pub resource: RouteResource,
}

/// What serves a protected route once access is granted.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RouteResource {
    /// A handler registered by the host application.
    #[serde(rename = "host")]
    Host,

    /// JSON list of the authenticated profiles.
    #[serde(rename = "profiles")]
    Profiles,

    /// Mints a bearer token for the primary profile.
    #[serde(rename = "token")]
    Token,
}

impl SecurityHandlerOptions {
    pub fn new(prefix: impl Into<String>, clients: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            clients,
            authorizers: Self::default_authorizers(),
            multi_profile: Self::default_multi_profile(),
            resource: Self::default_resource(),
        }
    }

    pub fn complete(&mut self) -> Result<()> {
        if !self.prefix.starts_with('/') {
            bail!("route prefix '{}' must start with '/'", self.prefix);
        }
        Ok(())
    }

    pub fn default_authorizers() -> Vec<String> {
        vec![]
    }

    pub fn default_multi_profile() -> bool {
        false
    }

    pub fn default_resource() -> RouteResource {
        RouteResource::Host
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CallbackHandlerOptions {
    #[serde(default = "CallbackHandlerOptions::default_path")]
    pub path: String,

    /// Where to go after login when the gate did not record a requested URL.
    #[serde(default = "CallbackHandlerOptions::default_default_url")]
    pub default_url: String,

    #[serde(default = "CallbackHandlerOptions::default_multi_profile")]
    pub multi_profile: bool,

    /// Rotate the session id once the profile is saved.
    #[serde(default = "CallbackHandlerOptions::default_renew_session")]
    pub renew_session: bool,

    /// Always complete the login with this client, ignoring the query.
    #[serde(default)]
    pub client_name: Option<String>,

    #[serde(default = "CallbackHandlerOptions::default_client_name_param")]
    pub client_name_param: String,
}

impl CommonConfig for CallbackHandlerOptions {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            default_url: Self::default_default_url(),
            multi_profile: Self::default_multi_profile(),
            renew_session: Self::default_renew_session(),
            client_name: None,
            client_name_param: Self::default_client_name_param(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.default_url = expandenv("default_url", &self.default_url)?;
        if !self.path.starts_with('/') {
            bail!("callback path '{}' must start with '/'", self.path);
        }
        if self.default_url.is_empty() {
            bail!("callback default_url cannot be empty");
        }
        if self.client_name_param.is_empty() {
            bail!("callback client_name_param cannot be empty");
        }
        Ok(())
    }
}

impl CallbackHandlerOptions {
    fn default_path() -> String {
        String::from("/callback")
    }

    fn default_default_url() -> String {
        String::from("/")
    }

    fn default_multi_profile() -> bool {
        false
    }

    fn default_renew_session() -> bool {
        true
    }

    fn default_client_name_param() -> String {
        String::from(CLIENT_NAME_PARAM)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogoutHandlerOptions {
    #[serde(default = "LogoutHandlerOptions::default_path")]
    pub path: String,

    #[serde(default = "LogoutHandlerOptions::default_default_url")]
    pub default_url: String,

    /// The `url` query parameter is only followed when it matches this
    /// regex. The default accepts relative paths and nothing else.
    #[serde(default = "LogoutHandlerOptions::default_url_pattern")]
    pub url_pattern: String,

    #[serde(default = "LogoutHandlerOptions::default_destroy_session")]
    pub destroy_session: bool,
}

impl CommonConfig for LogoutHandlerOptions {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            default_url: Self::default_default_url(),
            url_pattern: Self::default_url_pattern(),
            destroy_session: Self::default_destroy_session(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.default_url = expandenv("default_url", &self.default_url)?;
        if !self.path.starts_with('/') {
            bail!("logout path '{}' must start with '/'", self.path);
        }
        if self.default_url.is_empty() {
            bail!("logout default_url cannot be empty");
        }
        Ok(())
    }
}

impl LogoutHandlerOptions {
    fn default_path() -> String {
        String::from("/logout")
    }

    fn default_default_url() -> String {
        String::from("/")
    }

    fn default_url_pattern() -> String {
        String::from(r"^/([^/\\\s]\S*)?$")
    }

    fn default_destroy_session() -> bool {
        false
    }
}

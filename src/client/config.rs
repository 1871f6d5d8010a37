use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

/// Settings shared by every call into an identity provider.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "ProviderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CommonConfig for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than 0");
        }
        if self.timeout_secs > Self::MAX_TIMEOUT_SECS {
            bail!(
                "timeout_secs must be less than or equal to {}",
                Self::MAX_TIMEOUT_SECS
            );
        }
        Ok(())
    }
}

impl ProviderConfig {
    const MAX_TIMEOUT_SECS: u64 = 300;

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn default_timeout_secs() -> u64 {
        10
    }
}

/// A redirect-based client. `authorization_url` is a template with the
/// `{client_id}`, `{redirect_uri}` and `{state}` placeholders, each replaced
/// by its url-encoded value.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndirectClientConfig {
    pub name: String,

    pub client_id: String,

    pub authorization_url: String,

    pub callback_url: String,

    #[serde(default = "IndirectClientConfig::default_include_client_name")]
    pub include_client_name: bool,
}

impl IndirectClientConfig {
    pub fn new(
        name: impl Into<String>,
        client_id: impl Into<String>,
        authorization_url: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client_id: client_id.into(),
            authorization_url: authorization_url.into(),
            callback_url: callback_url.into(),
            include_client_name: Self::default_include_client_name(),
        }
    }

    pub fn complete(&mut self) -> Result<()> {
        self.client_id = expandenv("client_id", &self.client_id)?;
        self.authorization_url = expandenv("authorization_url", &self.authorization_url)?;
        self.callback_url = expandenv("callback_url", &self.callback_url)?;

        if self.name.is_empty() {
            bail!("client name cannot be empty");
        }
        if self.authorization_url.is_empty() {
            bail!("authorization_url for client '{}' cannot be empty", self.name);
        }
        if !self.authorization_url.contains("{state}") {
            bail!(
                "authorization_url for client '{}' must carry the {{state}} placeholder",
                self.name
            );
        }
        if self.callback_url.is_empty() {
            bail!("callback_url for client '{}' cannot be empty", self.name);
        }
        Ok(())
    }

    fn default_include_client_name() -> bool {
        true
    }
}

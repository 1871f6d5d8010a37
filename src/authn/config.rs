use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

use super::token::config::TokenConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthnConfig {
    /// Accept `Authorization: Bearer` tokens carrying the profile.
    #[serde(default = "AuthnConfig::default_stateless")]
    pub stateless: bool,

    /// Accept profiles stored in the session by the callback.
    #[serde(default = "AuthnConfig::default_stateful")]
    pub stateful: bool,

    #[serde(default = "TokenConfig::default")]
    pub token: TokenConfig,
}

impl CommonConfig for AuthnConfig {
    fn default() -> Self {
        Self {
            stateless: Self::default_stateless(),
            stateful: Self::default_stateful(),
            token: TokenConfig::default(),
        }
    }

    fn complete(&mut self, ps: &PathSet) -> Result<()> {
        if !self.stateless && !self.stateful {
            bail!("at least one of stateless and stateful authentication must be enabled");
        }
        if self.stateless {
            self.token.complete(ps)?;
        }
        Ok(())
    }
}

impl AuthnConfig {
    pub fn default_stateless() -> bool {
        false
    }

    pub fn default_stateful() -> bool {
        true
    }
}

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{expandenv, CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "SessionConfig::default_name")]
    pub name: SessionStoreType,

    #[serde(default = "SessionConfig::default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "SessionConfig::default_secure_cookie")]
    pub secure_cookie: bool,

    #[serde(default = "SessionConfig::default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "SessionConfig::default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreType {
    #[serde(rename = "memory")]
    Memory,
}

impl CommonConfig for SessionConfig {
    fn default() -> Self {
        Self {
            name: Self::default_name(),
            cookie_name: Self::default_cookie_name(),
            secure_cookie: Self::default_secure_cookie(),
            ttl_secs: Self::default_ttl_secs(),
            purge_interval_secs: Self::default_purge_interval_secs(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        self.cookie_name = expandenv("cookie_name", &self.cookie_name)?;
        if self.cookie_name.is_empty() {
            bail!("cookie_name cannot be empty");
        }
        if self.ttl_secs == 0 {
            bail!("ttl_secs must be greater than 0");
        }
        if self.purge_interval_secs == 0 {
            bail!("purge_interval_secs must be greater than 0");
        }
        Ok(())
    }
}

impl SessionConfig {
    fn default_name() -> SessionStoreType {
        SessionStoreType::Memory
    }

    fn default_cookie_name() -> String {
        String::from("authgate.session")
    }

    fn default_secure_cookie() -> bool {
        false
    }

    fn default_ttl_secs() -> u64 {
        60 * 30
    }

    fn default_purge_interval_secs() -> u64 {
        60
    }
}

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

/// Named authorizers that routes can refer to, e.g.
///
/// ```toml
/// [authz.authorizers.require_permission1]
/// kind = "require_all_permissions"
/// permissions = ["permission1"]
/// ```
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthzConfig {
    #[serde(default = "AuthzConfig::default_authorizers")]
    pub authorizers: BTreeMap<String, AuthorizerConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum AuthorizerConfig {
    #[serde(rename = "require_all_permissions")]
    RequireAllPermissions { permissions: Vec<String> },

    #[serde(rename = "require_any_permission")]
    RequireAnyPermission { permissions: Vec<String> },

    #[serde(rename = "client_name")]
    ClientName { clients: Vec<String> },

    #[serde(rename = "is_authenticated")]
    IsAuthenticated,
}

impl CommonConfig for AuthzConfig {
    fn default() -> Self {
        Self {
            authorizers: Self::default_authorizers(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        for (name, cfg) in self.authorizers.iter() {
            if name.is_empty() {
                bail!("authorizer name cannot be empty");
            }
            match cfg {
                AuthorizerConfig::RequireAnyPermission { permissions } if permissions.is_empty() => {
                    bail!("authorizer '{name}' requires at least one permission")
                }
                AuthorizerConfig::ClientName { clients } if clients.is_empty() => {
                    bail!("authorizer '{name}' requires at least one client")
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl AuthzConfig {
    pub fn default_authorizers() -> BTreeMap<String, AuthorizerConfig> {
        BTreeMap::new()
    }
}

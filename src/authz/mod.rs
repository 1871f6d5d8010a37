mod authenticated;
mod client;
mod permission;

pub mod chain;
pub mod config;
pub mod factory;
pub mod union;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConfigurationError;
use crate::context::WebContext;
use crate::profile::Profile;

pub use authenticated::IsAuthenticatedAuthorizer;
pub use client::ClientNameAuthorizer;
pub use permission::{RequireAllPermissionsAuthorizer, RequireAnyPermissionAuthorizer};

use chain::ChainAuthorizer;
use union::UnionAuthorizer;

/// A pure predicate over the authenticated profiles of a request.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, profiles: &[Profile], ctx: &WebContext) -> AuthzResponse;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzResponse {
    /// Access is granted
    Ok,
    /// Access is denied, with a short reason code for the logs
    Unauthorized(String),
}

impl AuthzResponse {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized(reason.into())
    }
}

/// Authorizers addressable by name from route options.
pub struct Authorizers {
    authorizers: HashMap<String, Arc<UnionAuthorizer>>,
}

impl Authorizers {
    pub fn new() -> Self {
        Self {
            authorizers: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        authorizer: UnionAuthorizer,
    ) -> Result<(), ConfigurationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigurationError::EmptyAuthorizerName);
        }
        if self.authorizers.contains_key(&name) {
            return Err(ConfigurationError::DuplicateAuthorizer(name));
        }
        self.authorizers.insert(name, Arc::new(authorizer));
        Ok(())
    }

    pub fn register_custom(
        &mut self,
        name: impl Into<String>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<(), ConfigurationError> {
        self.register(name, UnionAuthorizer::Custom(authorizer))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.authorizers.contains_key(name)
    }

    /// Resolves `names`, in order, into a chain evaluated with AND semantics.
    pub fn build_chain(&self, names: &[String]) -> Result<ChainAuthorizer, ConfigurationError> {
        let mut authorizers = Vec::with_capacity(names.len());
        for name in names {
            match self.authorizers.get(name) {
                Some(authorizer) => authorizers.push((name.clone(), authorizer.clone())),
                None => return Err(ConfigurationError::UnknownAuthorizer(name.clone())),
            }
        }
        Ok(ChainAuthorizer::new(authorizers))
    }
}

impl Default for Authorizers {
    fn default() -> Self {
        Self::new()
    }
}

use log::info;

use crate::config::ConfigurationError;

use super::config::{AuthorizerConfig, AuthzConfig};
use super::union::UnionAuthorizer;
use super::{
    Authorizers, ClientNameAuthorizer, IsAuthenticatedAuthorizer,
    RequireAllPermissionsAuthorizer, RequireAnyPermissionAuthorizer,
};

/// Name under which [`IsAuthenticatedAuthorizer`] is always registered.
pub const IS_AUTHENTICATED: &str = "is_authenticated";

pub struct AuthzFactory;

impl AuthzFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_authorizers(&self, cfg: &AuthzConfig) -> Result<Authorizers, ConfigurationError> {
        let mut authorizers = Authorizers::new();
        authorizers.register(
            IS_AUTHENTICATED,
            UnionAuthorizer::IsAuthenticated(IsAuthenticatedAuthorizer::new()),
        )?;

        for (name, cfg) in cfg.authorizers.iter() {
            let authorizer = match cfg {
                AuthorizerConfig::RequireAllPermissions { permissions } => {
                    UnionAuthorizer::RequireAllPermissions(RequireAllPermissionsAuthorizer::new(
                        permissions.iter().cloned(),
                    ))
                }
                AuthorizerConfig::RequireAnyPermission { permissions } => {
                    UnionAuthorizer::RequireAnyPermission(RequireAnyPermissionAuthorizer::new(
                        permissions.iter().cloned(),
                    ))
                }
                AuthorizerConfig::ClientName { clients } => UnionAuthorizer::ClientName(
                    ClientNameAuthorizer::new(clients.iter().cloned()),
                ),
                AuthorizerConfig::IsAuthenticated => {
                    UnionAuthorizer::IsAuthenticated(IsAuthenticatedAuthorizer::new())
                }
            };
            authorizers.register(name.clone(), authorizer)?;
            info!("Register authorizer '{name}'");
        }

        Ok(authorizers)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::authz::{Authorizer, AuthzResponse};
    use crate::context::WebContext;
    use crate::profile::Profile;
    use crate::session::{MemorySessionStore, UnionSessionStore};

    use super::*;

    #[test]
    fn test_factory() {
        let cfg: AuthzConfig = toml::from_str(
            r#"
            [authorizers.require_all]
            kind = "require_all_permissions"
            permissions = ["permission1", "permission2"]

            [authorizers.oauth2_only]
            kind = "client_name"
            clients = ["oauth2"]

            [authorizers.logged_in]
            kind = "is_authenticated"
            "#,
        )
        .unwrap();
        assert_eq!(
            cfg.authorizers["oauth2_only"],
            AuthorizerConfig::ClientName {
                clients: vec!["oauth2".to_string()]
            }
        );

        let authorizers = AuthzFactory::new().build_authorizers(&cfg).unwrap();
        assert!(authorizers.contains(IS_AUTHENTICATED));
        assert!(authorizers.contains("logged_in"));

        let chain = authorizers
            .build_chain(&["oauth2_only".to_string(), "require_all".to_string()])
            .unwrap();
        let store = Arc::new(UnionSessionStore::Memory(MemorySessionStore::new(
            Duration::from_secs(60),
        )));
        let ctx = WebContext::new("GET", "/", store, None);
        let profile = Profile::new("u", "oauth2").with_roles(["permission2", "permission1"]);
        assert_eq!(chain.authorize(&[profile], &ctx), AuthzResponse::Ok);

        let mut cfg = cfg;
        cfg.authorizers
            .insert(IS_AUTHENTICATED.to_string(), AuthorizerConfig::IsAuthenticated);
        assert_eq!(
            AuthzFactory::new().build_authorizers(&cfg).err(),
            Some(ConfigurationError::DuplicateAuthorizer(
                IS_AUTHENTICATED.to_string()
            ))
        );
    }
}

use anyhow::{bail, Result};
use log::info;

use super::bearer_token::BearerTokenProvider;
use super::chain::ChainAuthProvider;
use super::config::AuthnConfig;
use super::session::SessionProvider;
use super::token::factory::TokenFactory;
use super::token::jwt::JwtTokenValidator;
use super::union::UnionAuthProvider;

/// Builds the provider chain. Bearer tokens come first so that a request
/// presenting one is judged by it, the session is consulted after.
pub struct AuthnFactory;

impl AuthnFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_provider(
        &self,
        cfg: &AuthnConfig,
        token_factory: Option<&TokenFactory>,
    ) -> Result<ChainAuthProvider<JwtTokenValidator>> {
        let mut providers = Vec::new();

        if cfg.stateless {
            let token_factory = match token_factory {
                Some(factory) => factory,
                None => bail!("stateless authentication requires a token factory"),
            };
            let jwt = token_factory.build_token_validator()?;
            providers.push(UnionAuthProvider::BearerToken(BearerTokenProvider::new(jwt)));
            info!("Stateless bearer token authentication is enabled");
        }

        if cfg.stateful {
            providers.push(UnionAuthProvider::Session(SessionProvider::new()));
            info!("Stateful session authentication is enabled");
        }

        if providers.is_empty() {
            bail!("no authentication provider enabled");
        }

        Ok(ChainAuthProvider::new(providers))
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use crate::config::{CommonConfig, PathSet};
    use crate::session::generate_id;

    use super::*;

    #[test]
    fn test_factory() {
        let factory = AuthnFactory::new();

        let cfg = AuthnConfig::default();
        let chain = factory.build_provider(&cfg, None).unwrap();
        assert_eq!(chain.len(), 1);
        assert!(matches!(chain.providers()[0], UnionAuthProvider::Session(_)));

        let mut cfg = AuthnConfig::default();
        cfg.stateless = true;
        assert!(factory.build_provider(&cfg, None).is_err());

        let dir = env::temp_dir().join(format!("authgate-authn-{}", generate_id()));
        let ps = PathSet::new(Some(dir)).unwrap();
        cfg.complete(&ps).unwrap();
        let token_factory = TokenFactory::new(&cfg.token).unwrap();
        let chain = factory.build_provider(&cfg, Some(&token_factory)).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(matches!(chain.providers()[0], UnionAuthProvider::BearerToken(_)));
        assert!(matches!(chain.providers()[1], UnionAuthProvider::Session(_)));

        cfg.stateful = false;
        let chain = factory.build_provider(&cfg, Some(&token_factory)).unwrap();
        assert_eq!(chain.len(), 1);

        cfg.stateless = false;
        assert!(factory.build_provider(&cfg, Some(&token_factory)).is_err());
        assert!(cfg.complete(&ps).is_err());
    }
}

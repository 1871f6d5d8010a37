use log::debug;

use crate::context::WebContext;
use crate::profile::manager::ProfileManager;

use super::token::TokenValidator;
use super::{AuthProvider, AuthnError, AuthnResponse};

/// Stateless authentication: the profile travels in an
/// `Authorization: Bearer <token>` header and is kept in request scope only.
pub struct BearerTokenProvider<T: TokenValidator> {
    validator: T,
}

impl<T: TokenValidator> BearerTokenProvider<T> {
    pub fn new(validator: T) -> Self {
        Self { validator }
    }
}

impl<T: TokenValidator + Sync + Send> AuthProvider for BearerTokenProvider<T> {
    fn authenticate(&self, ctx: &mut WebContext) -> Result<AuthnResponse, AuthnError> {
        let auth = match ctx.header("authorization") {
            Some(auth) => auth.trim().to_string(),
            None => return Ok(AuthnResponse::Continue),
        };
        if auth.is_empty() {
            return Ok(AuthnResponse::Continue);
        }

        let mut iter = auth.split_whitespace();
        match iter.next() {
            Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {}
            // Some other scheme, not ours to judge.
            _ => return Ok(AuthnResponse::Continue),
        }

        let token = match iter.next() {
            Some(token) => token,
            None => return Ok(AuthnResponse::Unauthenticated),
        };

        let profile = match self.validator.validate_token(token) {
            Ok(profile) => profile,
            Err(e) => {
                debug!("Reject bearer token: {e:#}");
                return Ok(AuthnResponse::Unauthenticated);
            }
        };

        ProfileManager::new(ctx).save(false, profile.clone(), false)?;
        Ok(AuthnResponse::Ok(vec![profile]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::authn::token::simple::SimpleToken;
    use crate::session::{MemorySessionStore, UnionSessionStore};

    use super::*;

    fn new_ctx(auth: Option<&str>) -> WebContext {
        let store = Arc::new(UnionSessionStore::Memory(MemorySessionStore::new(
            Duration::from_secs(60),
        )));
        let ctx = WebContext::new("GET", "/api", store, None);
        match auth {
            Some(auth) => ctx.with_header("Authorization", auth),
            None => ctx,
        }
    }

    #[test]
    fn test_bearer_token() {
        let provider = BearerTokenProvider::new(SimpleToken::new());

        let mut ctx = new_ctx(Some("Bearer simple-token-oauth2:Alice"));
        match provider.authenticate(&mut ctx).unwrap() {
            AuthnResponse::Ok(profiles) => {
                assert_eq!(profiles.len(), 1);
                assert_eq!(profiles[0].id(), "Alice");
                assert_eq!(profiles[0].client_name(), "oauth2");
            }
            _ => panic!("expect authenticated"),
        }
        let mut manager = ProfileManager::new(&mut ctx);
        assert_eq!(manager.get(false).unwrap().unwrap().id(), "Alice");
        // Stateless, nothing written into the session.
        assert_eq!(ctx.session_id(), None);

        let cases = [
            (None, "continue"),
            (Some(""), "continue"),
            (Some("Basic YWxpY2U6cGFzcw=="), "continue"),
            (Some("Bearer"), "unauthenticated"),
            (Some("Bearer invalid-token"), "unauthenticated"),
            (Some("bearer simple-token-oauth2:"), "unauthenticated"),
        ];
        for (auth, expect) in cases {
            let mut ctx = new_ctx(auth);
            let resp = provider.authenticate(&mut ctx).unwrap();
            match expect {
                "continue" => assert!(matches!(resp, AuthnResponse::Continue)),
                "unauthenticated" => assert!(matches!(resp, AuthnResponse::Unauthenticated)),
                _ => unreachable!(),
            }
        }
    }
}

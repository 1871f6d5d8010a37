use crate::context::WebContext;

use super::token::TokenValidator;
use super::union::UnionAuthProvider;
use super::{AuthProvider, AuthnError, AuthnResponse};

/// Tries each provider in order. The first one that finds profiles, or that
/// rejects the request, decides.
pub struct ChainAuthProvider<T: TokenValidator> {
    providers: Vec<UnionAuthProvider<T>>,
}

impl<T: TokenValidator> ChainAuthProvider<T> {
    pub fn new(providers: Vec<UnionAuthProvider<T>>) -> Self {
        Self { providers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn providers(&self) -> &[UnionAuthProvider<T>] {
        &self.providers
    }
}

impl<T: TokenValidator + Sync + Send> AuthProvider for ChainAuthProvider<T> {
    fn authenticate(&self, ctx: &mut WebContext) -> Result<AuthnResponse, AuthnError> {
        for provider in self.providers.iter() {
            match provider.authenticate(ctx)? {
                AuthnResponse::Ok(profiles) if !profiles.is_empty() => {
                    return Ok(AuthnResponse::Ok(profiles))
                }
                AuthnResponse::Ok(_) | AuthnResponse::Continue => continue,
                AuthnResponse::Unauthenticated => return Ok(AuthnResponse::Unauthenticated),
            }
        }
        Ok(AuthnResponse::Continue)
    }
}

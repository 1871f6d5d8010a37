use crate::context::WebContext;

use super::bearer_token::BearerTokenProvider;
use super::session::SessionProvider;
use super::token::TokenValidator;
use super::{AuthProvider, AuthnError, AuthnResponse};

pub enum UnionAuthProvider<T: TokenValidator> {
    BearerToken(BearerTokenProvider<T>),
    Session(SessionProvider),
}

impl<T: TokenValidator + Sync + Send> AuthProvider for UnionAuthProvider<T> {
    fn authenticate(&self, ctx: &mut WebContext) -> Result<AuthnResponse, AuthnError> {
        match self {
            UnionAuthProvider::BearerToken(provider) => provider.authenticate(ctx),
            UnionAuthProvider::Session(provider) => provider.authenticate(ctx),
        }
    }
}

use std::sync::Arc;

use crate::context::WebContext;
use crate::profile::Profile;

use super::union::UnionAuthorizer;
use super::{Authorizer, AuthzResponse};

/// Named authorizers combined with AND. The first denial wins and its reason
/// is prefixed with the authorizer's name.
pub struct ChainAuthorizer {
    authorizers: Vec<(String, Arc<UnionAuthorizer>)>,
}

impl ChainAuthorizer {
    pub fn new(authorizers: Vec<(String, Arc<UnionAuthorizer>)>) -> Self {
        Self { authorizers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.authorizers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.authorizers.is_empty()
    }
}

impl Authorizer for ChainAuthorizer {
    fn authorize(&self, profiles: &[Profile], ctx: &WebContext) -> AuthzResponse {
        for (name, authorizer) in self.authorizers.iter() {
            match authorizer.authorize(profiles, ctx) {
                AuthzResponse::Ok => continue,
                AuthzResponse::Unauthorized(reason) => {
                    return AuthzResponse::Unauthorized(format!("{name}: {reason}"))
                }
            }
        }
        AuthzResponse::Ok
    }
}

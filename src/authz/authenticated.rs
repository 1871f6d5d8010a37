use crate::context::WebContext;
use crate::profile::Profile;

use super::{Authorizer, AuthzResponse};

pub struct IsAuthenticatedAuthorizer;

impl IsAuthenticatedAuthorizer {
    pub fn new() -> Self {
        Self
    }
}

impl Authorizer for IsAuthenticatedAuthorizer {
    fn authorize(&self, profiles: &[Profile], _ctx: &WebContext) -> AuthzResponse {
        if profiles.is_empty() {
            return AuthzResponse::unauthorized("not authenticated");
        }
        AuthzResponse::Ok
    }
}

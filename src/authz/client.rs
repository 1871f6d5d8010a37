use std::collections::HashSet;

use crate::context::WebContext;
use crate::profile::Profile;

use super::{Authorizer, AuthzResponse};

/// Grants access when at least one profile was produced by an allowed client.
pub struct ClientNameAuthorizer {
    clients: HashSet<String>,
}

impl ClientNameAuthorizer {
    pub fn new<I, S>(clients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            clients: clients.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for ClientNameAuthorizer {
    fn authorize(&self, profiles: &[Profile], _ctx: &WebContext) -> AuthzResponse {
        if profiles
            .iter()
            .any(|p| self.clients.contains(p.client_name()))
        {
            return AuthzResponse::Ok;
        }
        AuthzResponse::unauthorized("no profile from an allowed client")
    }
}

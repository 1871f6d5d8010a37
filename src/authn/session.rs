use crate::context::WebContext;
use crate::profile::manager::ProfileManager;

use super::{AuthProvider, AuthnError, AuthnResponse};

/// Stateful authentication: profiles saved in the session by the callback.
pub struct SessionProvider;

impl SessionProvider {
    pub fn new() -> Self {
        Self
    }
}

impl AuthProvider for SessionProvider {
    fn authenticate(&self, ctx: &mut WebContext) -> Result<AuthnResponse, AuthnError> {
        let profiles = ProfileManager::new(ctx).get_all(true)?;
        if profiles.is_empty() {
            return Ok(AuthnResponse::Continue);
        }
        Ok(AuthnResponse::Ok(profiles))
    }
}

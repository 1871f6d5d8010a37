use std::collections::BTreeSet;

use crate::context::WebContext;
use crate::profile::Profile;

use super::{Authorizer, AuthzResponse};

/// Grants access when every profile holds all of the permissions. Order and
/// duplicates in the configured list do not matter.
pub struct RequireAllPermissionsAuthorizer {
    permissions: BTreeSet<String>,
}

impl RequireAllPermissionsAuthorizer {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for RequireAllPermissionsAuthorizer {
    fn authorize(&self, profiles: &[Profile], _ctx: &WebContext) -> AuthzResponse {
        if profiles.is_empty() {
            return AuthzResponse::unauthorized("no profile");
        }
        for profile in profiles {
            if let Some(missing) = self.permissions.iter().find(|p| !profile.has_role(p)) {
                return AuthzResponse::unauthorized(format!(
                    "'{}' lacks permission '{missing}'",
                    profile.id()
                ));
            }
        }
        AuthzResponse::Ok
    }
}

/// Grants access when every profile holds at least one of the permissions.
pub struct RequireAnyPermissionAuthorizer {
    permissions: BTreeSet<String>,
}

impl RequireAnyPermissionAuthorizer {
    pub fn new<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authorizer for RequireAnyPermissionAuthorizer {
    fn authorize(&self, profiles: &[Profile], _ctx: &WebContext) -> AuthzResponse {
        if profiles.is_empty() {
            return AuthzResponse::unauthorized("no profile");
        }
        for profile in profiles {
            if !self.permissions.iter().any(|p| profile.has_role(p)) {
                return AuthzResponse::unauthorized(format!(
                    "'{}' has none of the permissions",
                    profile.id()
                ));
            }
        }
        AuthzResponse::Ok
    }
}

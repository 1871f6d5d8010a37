use std::sync::Arc;

use crate::context::WebContext;
use crate::profile::Profile;

use super::authenticated::IsAuthenticatedAuthorizer;
use super::client::ClientNameAuthorizer;
use super::permission::{RequireAllPermissionsAuthorizer, RequireAnyPermissionAuthorizer};
use super::{Authorizer, AuthzResponse};

pub enum UnionAuthorizer {
    RequireAllPermissions(RequireAllPermissionsAuthorizer),
    RequireAnyPermission(RequireAnyPermissionAuthorizer),
    ClientName(ClientNameAuthorizer),
    IsAuthenticated(IsAuthenticatedAuthorizer),
    Custom(Arc<dyn Authorizer>),
}

impl Authorizer for UnionAuthorizer {
    fn authorize(&self, profiles: &[Profile], ctx: &WebContext) -> AuthzResponse {
        match self {
            UnionAuthorizer::RequireAllPermissions(authz) => authz.authorize(profiles, ctx),
            UnionAuthorizer::RequireAnyPermission(authz) => authz.authorize(profiles, ctx),
            UnionAuthorizer::ClientName(authz) => authz.authorize(profiles, ctx),
            UnionAuthorizer::IsAuthenticated(authz) => authz.authorize(profiles, ctx),
            UnionAuthorizer::Custom(authz) => authz.authorize(profiles, ctx),
        }
    }
}

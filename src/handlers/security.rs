use std::sync::Arc;

use log::{debug, error, warn};
use serde_json::Value;

use crate::authn::{AuthProvider, AuthnError, AuthnResponse};
use crate::authz::chain::ChainAuthorizer;
use crate::authz::{Authorizer, Authorizers, AuthzResponse};
use crate::client::Clients;
use crate::config::ConfigurationError;
use crate::context::WebContext;
use crate::profile::Profile;
use crate::response::Response;

use super::config::SecurityHandlerOptions;
use super::{add_offered_client, REQUESTED_URL_KEY};

pub enum SecurityOutcome {
    /// Forward the request to the protected resource.
    Granted(Vec<Profile>),
    /// Answer the request directly: a redirect, 401 or 403.
    Respond(Response),
}

enum SecurityState {
    CheckingAuth,
    Authenticated(Vec<Profile>),
    Redirecting,
    Rejected(String),
}

/// The gate in front of one protected route.
pub struct SecurityHandler {
    options: SecurityHandlerOptions,
    provider: Arc<dyn AuthProvider>,
    clients: Arc<Clients>,
    authorizer: ChainAuthorizer,
}

impl SecurityHandler {
    pub fn new(
        options: SecurityHandlerOptions,
        provider: Arc<dyn AuthProvider>,
        clients: Arc<Clients>,
        authorizers: &Authorizers,
    ) -> Result<Self, ConfigurationError> {
        if options.clients.is_empty() {
            return Err(ConfigurationError::NoClients(options.prefix.clone()));
        }
        for name in options.clients.iter() {
            if clients.find(name).is_none() {
                return Err(ConfigurationError::UnknownClient(name.clone()));
            }
        }
        let authorizer = authorizers.build_chain(&options.authorizers)?;

        Ok(Self {
            options,
            provider,
            clients,
            authorizer,
        })
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.options.prefix
    }

    /// Whether `path` falls under this route. `/private` covers `/private`
    /// and `/private/...` but not `/privateer`.
    pub fn matches(&self, path: &str) -> bool {
        let prefix = self.options.prefix.as_str();
        match path.strip_prefix(prefix) {
            Some(rest) => prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    pub async fn check(&self, ctx: &mut WebContext) -> SecurityOutcome {
        let mut state = SecurityState::CheckingAuth;
        loop {
            state = match state {
                SecurityState::CheckingAuth => match self.provider.authenticate(ctx) {
                    Ok(AuthnResponse::Ok(profiles)) => SecurityState::Authenticated(profiles),
                    Ok(AuthnResponse::Continue) => SecurityState::Redirecting,
                    Ok(AuthnResponse::Unauthenticated) => {
                        debug!("Invalid credentials presented for '{}'", ctx.path());
                        return SecurityOutcome::Respond(Response::unauthenticated());
                    }
                    Err(AuthnError::SessionDecode(e)) => {
                        warn!("Ignore corrupt profile in session: {e}");
                        SecurityState::Redirecting
                    }
                    Err(AuthnError::Store(e)) => {
                        error!("Failed to read session: {e:#}");
                        return SecurityOutcome::Respond(Response::error("session store"));
                    }
                },

                SecurityState::Authenticated(mut profiles) => {
                    if !self.options.multi_profile {
                        profiles.truncate(1);
                    }
                    match self.authorizer.authorize(&profiles, ctx) {
                        AuthzResponse::Ok => return SecurityOutcome::Granted(profiles),
                        AuthzResponse::Unauthorized(reason) => SecurityState::Rejected(reason),
                    }
                }

                SecurityState::Redirecting => {
                    return SecurityOutcome::Respond(self.redirect(ctx).await)
                }

                SecurityState::Rejected(reason) => {
                    debug!("Access to '{}' denied, {reason}", ctx.path());
                    return SecurityOutcome::Respond(Response::forbidden());
                }
            }
        }
    }

    async fn redirect(&self, ctx: &mut WebContext) -> Response {
        if ctx.is_ajax() {
            debug!("AJAX request to '{}' without profile", ctx.path());
            return Response::unauthenticated();
        }

        let name = &self.options.clients[0];
        let client = match self.clients.find(name) {
            Some(client) => client.clone(),
            None => {
                error!("Client '{name}' disappeared from the registry");
                return Response::error("client registry");
            }
        };

        let requested_url = Value::String(ctx.full_url().to_string());
        let saved = ctx
            .session_put(REQUESTED_URL_KEY, requested_url)
            .and_then(|_| add_offered_client(ctx, name));
        if let Err(e) = saved {
            error!("Failed to save login state into session: {e:#}");
            return Response::error("session store");
        }

        match self.clients.redirection_url(client.as_ref(), ctx).await {
            Ok(url) => {
                debug!("Redirect '{}' to client '{name}'", ctx.path());
                Response::redirect(url)
            }
            Err(e) => {
                warn!("Client '{name}' failed to build redirection url: {e}");
                Response::unauthenticated()
            }
        }
    }
}

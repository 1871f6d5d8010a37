use std::sync::Arc;

use log::{info, warn};
use serde_json::Value;

use crate::client::{AuthenticationError, Clients};
use crate::config::ConfigurationError;
use crate::context::WebContext;
use crate::profile::manager::ProfileManager;
use crate::response::Response;

use super::config::CallbackHandlerOptions;
use super::{take_offered_clients, REQUESTED_URL_KEY};

/// Completes the login handshake when the provider sends the browser back.
pub struct CallbackHandler {
    options: CallbackHandlerOptions,
    clients: Arc<Clients>,
}

impl CallbackHandler {
    pub fn new(
        options: CallbackHandlerOptions,
        clients: Arc<Clients>,
    ) -> Result<Self, ConfigurationError> {
        if let Some(name) = options.client_name.as_ref() {
            if clients.find(name).is_none() {
                return Err(ConfigurationError::UnknownClient(name.clone()));
            }
        }
        Ok(Self { options, clients })
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.options.path
    }

    /// Like [`perform`](Self::perform), failures become a 401 with a fixed
    /// body.
    pub async fn handle(&self, ctx: &mut WebContext) -> Response {
        match self.perform(ctx).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Login callback failed: {e}");
                Response::unauthenticated()
            }
        }
    }

    pub async fn perform(&self, ctx: &mut WebContext) -> Result<Response, AuthenticationError> {
        let result = self.login(ctx).await;
        if result.is_err() {
            // The next login starts from its own requested url.
            if let Err(e) = ctx.session_remove(REQUESTED_URL_KEY) {
                warn!("Drop requested url after failed callback: {e:#}");
            }
        }
        result
    }

    async fn login(&self, ctx: &mut WebContext) -> Result<Response, AuthenticationError> {
        // Consumed up front so that a failed or replayed callback cannot use
        // the same offer twice.
        let offered = take_offered_clients(ctx).map_err(AuthenticationError::Session)?;

        let name = match self.options.client_name.as_ref() {
            Some(name) => name.clone(),
            None => match ctx.query_param(&self.options.client_name_param) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => {
                    return Err(AuthenticationError::MalformedCallback(format!(
                        "missing '{}' parameter",
                        self.options.client_name_param
                    )))
                }
            },
        };

        let client = match self.clients.find(&name) {
            Some(client) => client.clone(),
            None => return Err(AuthenticationError::UnknownClient(name)),
        };
        if !offered.iter().any(|n| n == &name) {
            return Err(AuthenticationError::ClientNotOffered(name));
        }

        let profile = self.clients.complete_login(client.as_ref(), ctx).await?;
        let id = profile.id().to_string();
        ProfileManager::new(ctx)
            .save(true, profile, self.options.multi_profile)
            .map_err(|e| AuthenticationError::Session(e.into()))?;

        if self.options.renew_session {
            ctx.renew_session().map_err(AuthenticationError::Session)?;
        }

        let target = match ctx
            .session_remove(REQUESTED_URL_KEY)
            .map_err(AuthenticationError::Session)?
        {
            Some(Value::String(url)) if !url.is_empty() => url,
            _ => self.options.default_url.clone(),
        };

        info!("User '{id}' logged in through client '{name}'");
        Ok(Response::redirect(target))
    }
}

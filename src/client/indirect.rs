use anyhow::anyhow;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::form_urlencoded;

use crate::context::WebContext;
use crate::profile::Profile;
use crate::session::generate_id;

use super::config::IndirectClientConfig;
use super::{AuthenticationError, Client, CLIENT_NAME_PARAM};

/// What the provider sent back on the callback, after the state check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub code: String,
    pub callback_url: String,
}

/// The protocol-specific half of an [`IndirectClient`]: exchange a verified
/// authorization code for a profile.
#[async_trait]
pub trait ProfileCreator: Send + Sync {
    async fn create_profile(
        &self,
        client_name: &str,
        credentials: Credentials,
    ) -> Result<Profile, AuthenticationError>;
}

/// A redirect-based client. It builds the authorization URL, keeps a one-shot
/// CSRF state in the session and validates the callback parameters before
/// handing the code to its [`ProfileCreator`].
pub struct IndirectClient<P: ProfileCreator> {
    cfg: IndirectClientConfig,
    callback_url: String,
    creator: P,
}

impl<P: ProfileCreator> IndirectClient<P> {
    pub fn new(cfg: IndirectClientConfig, creator: P) -> Self {
        let callback_url = if cfg.include_client_name {
            let sep = if cfg.callback_url.contains('?') { '&' } else { '?' };
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair(CLIENT_NAME_PARAM, &cfg.name)
                .finish();
            format!("{}{sep}{query}", cfg.callback_url)
        } else {
            cfg.callback_url.clone()
        };

        Self {
            cfg,
            callback_url,
            creator,
        }
    }

    /// The absolute callback URL the provider is told to redirect to.
    #[inline]
    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    fn state_key(&self) -> String {
        format!("authgate.state.{}", self.cfg.name)
    }

    fn hash_state(state: &str) -> String {
        format!("{:x}", Sha256::digest(state.as_bytes()))
    }

    fn build_url(&self, state: &str) -> String {
        let encode = |s: &str| form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
        self.cfg
            .authorization_url
            .replace("{client_id}", &encode(&self.cfg.client_id))
            .replace("{redirect_uri}", &encode(&self.callback_url))
            .replace("{state}", &encode(state))
    }

    fn required_param(ctx: &WebContext, name: &str) -> Result<String, AuthenticationError> {
        match ctx.query_param(name) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(AuthenticationError::MalformedCallback(format!(
                "missing '{name}' parameter"
            ))),
        }
    }
}

#[async_trait]
impl<P: ProfileCreator> Client for IndirectClient<P> {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    async fn redirection_url(&self, ctx: &mut WebContext) -> Result<String, AuthenticationError> {
        let state = generate_id();
        ctx.session_put(&self.state_key(), Value::String(Self::hash_state(&state)))
            .map_err(AuthenticationError::Session)?;

        let url = self.build_url(&state);
        debug!("Client '{}' redirects to provider", self.cfg.name);
        Ok(url)
    }

    async fn complete_login(&self, ctx: &mut WebContext) -> Result<Profile, AuthenticationError> {
        // The stored state is single use, whatever the outcome.
        let expect = ctx
            .session_remove(&self.state_key())
            .map_err(AuthenticationError::Session)?;

        if let Some(error) = ctx.query_param("error") {
            let reason = match ctx.query_param("error_description") {
                Some(desc) => format!("{error}: {desc}"),
                None => error.to_string(),
            };
            warn!("Provider for client '{}' denied login: {reason}", self.cfg.name);
            return Err(AuthenticationError::Rejected(reason));
        }

        let code = Self::required_param(ctx, "code")?;
        let state = Self::required_param(ctx, "state")?;

        match expect {
            Some(Value::String(expect)) if expect == Self::hash_state(&state) => {}
            Some(Value::String(_)) | None => return Err(AuthenticationError::StateMismatch),
            Some(_) => {
                return Err(AuthenticationError::Session(anyhow!(
                    "stored state is not a string"
                )))
            }
        }

        let credentials = Credentials {
            code,
            callback_url: self.callback_url.clone(),
        };
        self.creator
            .create_profile(&self.cfg.name, credentials)
            .await
    }
}

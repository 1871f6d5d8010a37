pub mod bearer_token;
pub mod chain;
pub mod config;
pub mod factory;
pub mod session;
pub mod token;
pub mod union;

use thiserror::Error;

use crate::context::WebContext;
use crate::profile::manager::ProfileError;
use crate::profile::{Profile, SessionDecodeError};

pub enum AuthnResponse {
    /// The request carries these profiles, never empty.
    Ok(Vec<Profile>),

    /// Nothing found, ask the next provider.
    Continue,

    /// Credentials were presented but are invalid.
    Unauthenticated,
}

#[derive(Debug, Error)]
pub enum AuthnError {
    #[error("session holds an undecodable profile: {0}")]
    SessionDecode(#[from] SessionDecodeError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<ProfileError> for AuthnError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Decode(e) => Self::SessionDecode(e),
            ProfileError::Store(e) => Self::Store(e),
        }
    }
}

/// Looks for an authenticated identity on the request.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, ctx: &mut WebContext) -> Result<AuthnResponse, AuthnError>;
}

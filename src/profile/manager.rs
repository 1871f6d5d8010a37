use anyhow::Context;
use chrono::Utc;
use log::{debug, warn};
use thiserror::Error;

use crate::context::WebContext;

use super::{Profile, SessionDecodeError};

/// Session and request-scope key holding the JSON list of profiles.
pub const PROFILES_KEY: &str = "authgate.profiles";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Decode(#[from] SessionDecodeError),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Reads and writes the profiles attached to one request.
///
/// Profiles live either in the session (surviving across requests) or in the
/// request-scoped attributes (stateless authentication). In single-profile
/// mode a save replaces everything; in multi-profile mode profiles are keyed
/// by the name of the client that produced them.
pub struct ProfileManager<'a> {
    ctx: &'a mut WebContext,
}

impl<'a> ProfileManager<'a> {
    pub fn new(ctx: &'a mut WebContext) -> Self {
        Self { ctx }
    }

    pub fn save(
        &mut self,
        save_in_session: bool,
        profile: Profile,
        multi_profile: bool,
    ) -> Result<(), ProfileError> {
        let mut profiles = if multi_profile {
            match self.load(save_in_session) {
                Ok(profiles) => profiles,
                Err(ProfileError::Decode(e)) => {
                    warn!("Discard undecodable profiles while saving: {e}");
                    Vec::new()
                }
                Err(e) => return Err(e),
            }
        } else {
            Vec::new()
        };

        match profiles
            .iter()
            .position(|p| p.client_name() == profile.client_name())
        {
            Some(idx) => profiles[idx] = profile,
            None => profiles.push(profile),
        }

        debug!(
            "Save {} profile(s) into {}",
            profiles.len(),
            if save_in_session { "session" } else { "request" }
        );
        self.store(save_in_session, &profiles)
    }

    /// The primary (first) profile, if any.
    pub fn get(&mut self, force_reload: bool) -> Result<Option<Profile>, ProfileError> {
        let profiles = self.get_all(force_reload)?;
        Ok(profiles.into_iter().next())
    }

    /// All profiles in insertion order. Request-scoped profiles win unless
    /// `force_reload` is set; a forced reload also prunes expired profiles
    /// from the session.
    pub fn get_all(&mut self, force_reload: bool) -> Result<Vec<Profile>, ProfileError> {
        if !force_reload {
            let profiles = self.load(false)?;
            if !profiles.is_empty() {
                return Ok(profiles);
            }
            return self.load(true);
        }

        let profiles = self.load(true)?;
        let now = Utc::now().timestamp().max(0) as u64;
        let total = profiles.len();
        let profiles: Vec<_> = profiles
            .into_iter()
            .filter(|p| !p.is_expired(now))
            .collect();
        if profiles.len() != total {
            debug!("Prune {} expired profile(s)", total - profiles.len());
            if profiles.is_empty() {
                self.ctx
                    .session_remove(PROFILES_KEY)
                    .context("remove expired profiles")?;
            } else {
                self.store(true, &profiles)?;
            }
        }
        Ok(profiles)
    }

    /// Drops every profile from the request scope and the session. Other
    /// session keys are left untouched.
    pub fn remove_all(&mut self) -> Result<(), ProfileError> {
        self.ctx.remove_request_attribute(PROFILES_KEY);
        self.ctx
            .session_remove(PROFILES_KEY)
            .context("remove profiles from session")?;
        Ok(())
    }

    fn load(&self, from_session: bool) -> Result<Vec<Profile>, ProfileError> {
        let value = if from_session {
            self.ctx
                .session_get(PROFILES_KEY)
                .context("read profiles from session")?
        } else {
            self.ctx.request_attribute(PROFILES_KEY).cloned()
        };

        match value {
            Some(value) => Ok(Profile::list_from_json(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn store(&mut self, in_session: bool, profiles: &[Profile]) -> Result<(), ProfileError> {
        let value = Profile::list_to_json(profiles);
        if in_session {
            self.ctx
                .session_put(PROFILES_KEY, value)
                .context("write profiles into session")?;
        } else {
            self.ctx.set_request_attribute(PROFILES_KEY, value);
        }
        Ok(())
    }
}

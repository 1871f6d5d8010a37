use anyhow::{bail, Result};

use crate::profile::Profile;

use super::{TokenGenerator, TokenResponse, TokenValidator};

/// Token of the form `simple-token-<client>:<id>`, for tests only.
#[derive(Debug, Clone)]
pub struct SimpleToken;

impl SimpleToken {
    pub fn new() -> Self {
        Self
    }
}

impl TokenGenerator for SimpleToken {
    fn generate_token(&self, profile: &Profile) -> Result<TokenResponse> {
        if profile.id().is_empty() {
            bail!("empty profile id");
        }
        Ok(TokenResponse {
            user: profile.id().to_string(),
            token: format!("simple-token-{}:{}", profile.client_name(), profile.id()),
            expire_in: 0,
        })
    }
}

impl TokenValidator for SimpleToken {
    fn validate_token(&self, token: &str) -> Result<Profile> {
        let rest = match token.strip_prefix("simple-token-") {
            Some(rest) => rest,
            None => bail!("invalid simple token"),
        };
        match rest.split_once(':') {
            Some((client, id)) if !id.is_empty() => Ok(Profile::new(id, client)),
            _ => bail!("invalid simple token"),
        }
    }
}

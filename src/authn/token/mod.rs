pub mod config;
pub mod factory;
pub mod jwt;

#[cfg(test)]
pub(crate) mod simple;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::profile::Profile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user: String,
    pub token: String,
    pub expire_in: usize,
}

/// Mints a bearer token that carries the whole profile.
pub trait TokenGenerator {
    fn generate_token(&self, profile: &Profile) -> Result<TokenResponse>;
}

/// Turns a bearer token back into the profile it carries. Any failure means
/// the token must be rejected.
pub trait TokenValidator {
    fn validate_token(&self, token: &str) -> Result<Profile>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn run_token_tests<TG, TV>(generator: &TG, validator: &TV)
    where
        TG: TokenGenerator,
        TV: TokenValidator,
    {
        let profiles = [
            Profile::new("Alice", "oauth2"),
            Profile::new("Bob", "oauth2").with_roles(["permission1", "permission2"]),
            Profile::new("Carol", "facebook")
                .with_attribute("email", "carol@example.com")
                .with_role("admin"),
        ];
        for profile in profiles.iter() {
            let token = generator.generate_token(profile).unwrap();
            assert_eq!(token.user, profile.id());

            let result = validator.validate_token(&token.token).unwrap();
            assert_eq!(result.id(), profile.id());
            assert_eq!(result.client_name(), profile.client_name());
            assert_eq!(result.roles(), profile.roles());
            assert_eq!(result.attributes(), profile.attributes());
        }

        assert!(generator.generate_token(&Profile::new("", "oauth2")).is_err());
        assert!(validator.validate_token("").is_err());
    }
}

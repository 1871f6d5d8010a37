use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Result};
use chrono::Local;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::Profile;

use super::{TokenGenerator, TokenResponse, TokenValidator};

const ISSUER: &str = "authgate/jwt-tokenizer";

/// Registered claims (RFC 7519) plus the profile carried by the token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    exp: usize,
    iat: usize,
    iss: String,
    nbf: usize,
    sub: String,

    client: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attrs: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    roles: BTreeSet<String>,
}

pub struct JwtTokenGenerator {
    key: EncodingKey,
    expiry: usize,
}

impl JwtTokenGenerator {
    pub fn new(private_key: &[u8], expiry: u64) -> Result<Self> {
        let key = match EncodingKey::from_rsa_pem(private_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA private key for jwt token generation failed: {e}"),
        };
        Ok(Self {
            key,
            expiry: expiry as usize,
        })
    }
}

impl TokenGenerator for JwtTokenGenerator {
    fn generate_token(&self, profile: &Profile) -> Result<TokenResponse> {
        if profile.id().is_empty() {
            bail!("generate jwt token failed: empty profile id");
        }

        let now = Local::now().timestamp() as usize;
        let mut exp = now + self.expiry;
        if let Some(expires_at) = profile.expires_at() {
            exp = exp.min(expires_at as usize);
        }

        let claims = Claims {
            exp,
            iat: now,
            iss: String::from(ISSUER),
            nbf: now,
            sub: profile.id().to_string(),
            client: profile.client_name().to_string(),
            attrs: profile.attributes().clone(),
            roles: profile.roles().clone(),
        };

        match encode(&Header::new(Algorithm::RS256), &claims, &self.key) {
            Ok(token) => Ok(TokenResponse {
                user: claims.sub,
                token,
                expire_in: claims.exp,
            }),
            Err(e) => bail!("generate jwt token failed: {e}"),
        }
    }
}

pub struct JwtTokenValidator {
    key: DecodingKey,
}

impl JwtTokenValidator {
    pub fn new(public_key: &[u8]) -> Result<Self> {
        let key = match DecodingKey::from_rsa_pem(public_key) {
            Ok(key) => key,
            Err(e) => bail!("parse RSA public key for jwt token validation failed: {e}"),
        };
        Ok(Self { key })
    }
}

impl TokenValidator for JwtTokenValidator {
    fn validate_token(&self, token: &str) -> Result<Profile> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "nbf", "sub"]);

        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => bail!("validate jwt token failed: {e}"),
        };

        if claims.sub.is_empty() {
            bail!("validate jwt token failed: empty subject");
        }
        if claims.client.is_empty() {
            bail!("validate jwt token failed: empty client");
        }

        let now = Local::now().timestamp() as usize;
        if now >= claims.exp {
            bail!("validate jwt token failed: token expired");
        }
        if now < claims.nbf {
            bail!("validate jwt token failed: token not yet valid");
        }

        let profile = claims.attrs.into_iter().fold(
            Profile::new(claims.sub, claims.client)
                .with_roles(claims.roles)
                .with_expires_at(claims.exp as u64),
            |profile, (name, value)| profile.with_attribute(name, value),
        );
        Ok(profile)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use once_cell::sync::Lazy;

    use crate::authn::token::tests::run_token_tests;
    use crate::rsa::generate_rsa_keys;

    use super::*;

    /// One key pair for the whole test binary, generating RSA keys is slow.
    pub static TEST_KEYS: Lazy<(Vec<u8>, Vec<u8>)> =
        Lazy::new(|| generate_rsa_keys().unwrap());

    pub fn test_generator(expiry: u64) -> JwtTokenGenerator {
        JwtTokenGenerator::new(&TEST_KEYS.1, expiry).unwrap()
    }

    pub fn test_validator() -> JwtTokenValidator {
        JwtTokenValidator::new(&TEST_KEYS.0).unwrap()
    }

    #[test]
    fn test_jwt() {
        run_token_tests(&test_generator(3600), &test_validator());
    }

    #[test]
    fn test_jwt_expiry() {
        let generator = test_generator(3600);
        let validator = test_validator();

        let profile = Profile::new("Alice", "oauth2").with_expires_at(1);
        let token = generator.generate_token(&profile).unwrap();
        assert_eq!(token.expire_in, 1);
        assert!(validator.validate_token(&token.token).is_err());

        let token = generator
            .generate_token(&Profile::new("Alice", "oauth2"))
            .unwrap();
        let profile = validator.validate_token(&token.token).unwrap();
        assert_eq!(profile.expires_at(), Some(token.expire_in as u64));
    }

    #[test]
    fn test_jwt_wrong_key() {
        let (other_public, _) = generate_rsa_keys().unwrap();
        let validator = JwtTokenValidator::new(&other_public).unwrap();

        let token = test_generator(3600)
            .generate_token(&Profile::new("Alice", "oauth2"))
            .unwrap();
        assert!(validator.validate_token(&token.token).is_err());
        assert!(validator.validate_token("not-a-jwt").is_err());
    }
}

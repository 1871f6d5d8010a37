pub mod manager;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The stored profile list could not be turned back into profiles.
#[derive(Debug, Error)]
pub enum SessionDecodeError {
    #[error("decode profile json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stored profile has an empty id")]
    EmptyId,
}

/// An authenticated identity as produced by a [`Client`](crate::client::Client).
///
/// Profiles are immutable: re-authentication replaces the whole value. The
/// JSON projection (see [`Profile::to_json`]) is provider-neutral and is what
/// gets written into the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    id: String,

    client_name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    roles: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<u64>,
}

impl Profile {
    pub fn new(id: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            client_name: client_name.into(),
            attributes: BTreeMap::new(),
            roles: BTreeSet::new(),
            expires_at: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }

    pub fn with_expires_at(mut self, expires_at: u64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    #[inline]
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    #[inline]
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    #[inline]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    #[inline]
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }

    pub fn to_json(&self) -> Value {
        // A struct of strings, maps and sets always serializes.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_json(value: Value) -> Result<Self, SessionDecodeError> {
        let profile: Self = serde_json::from_value(value)?;
        if profile.id.is_empty() {
            return Err(SessionDecodeError::EmptyId);
        }
        Ok(profile)
    }

    pub(crate) fn list_to_json(profiles: &[Profile]) -> Value {
        Value::Array(profiles.iter().map(Profile::to_json).collect())
    }

    pub(crate) fn list_from_json(value: Value) -> Result<Vec<Profile>, SessionDecodeError> {
        let values: Vec<Value> = serde_json::from_value(value)?;
        values.into_iter().map(Profile::from_json).collect()
    }
}

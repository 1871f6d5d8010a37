mod memory;

pub mod config;
pub mod factory;

use anyhow::Result;
use base64::Engine;
use rand::RngCore;
use serde_json::Value;

pub use memory::MemorySessionStore;

/// Key/value storage for browser sessions. A session is addressed by an
/// opaque id that travels in a cookie.
///
/// Unknown and expired ids behave the same: reads return nothing and writes
/// fail, so the caller must [`create`](SessionStore::create) a fresh session
/// first.
pub trait SessionStore {
    fn create(&self) -> Result<String>;
    fn exists(&self, id: &str) -> Result<bool>;

    fn get(&self, id: &str, key: &str) -> Result<Option<Value>>;
    fn put(&self, id: &str, key: &str, value: Value) -> Result<()>;
    fn remove(&self, id: &str, key: &str) -> Result<Option<Value>>;

    /// Moves all data to a newly generated id and invalidates the old one.
    fn renew(&self, id: &str) -> Result<String>;
    fn destroy(&self, id: &str) -> Result<()>;

    /// Drops every session whose idle time exceeded the ttl, returns how many
    /// were removed.
    fn purge_expired(&self) -> Result<usize>;
}

pub enum UnionSessionStore {
    Memory(MemorySessionStore),
}

impl SessionStore for UnionSessionStore {
    fn create(&self) -> Result<String> {
        match self {
            Self::Memory(store) => store.create(),
        }
    }

    fn exists(&self, id: &str) -> Result<bool> {
        match self {
            Self::Memory(store) => store.exists(id),
        }
    }

    fn get(&self, id: &str, key: &str) -> Result<Option<Value>> {
        match self {
            Self::Memory(store) => store.get(id, key),
        }
    }

    fn put(&self, id: &str, key: &str, value: Value) -> Result<()> {
        match self {
            Self::Memory(store) => store.put(id, key, value),
        }
    }

    fn remove(&self, id: &str, key: &str) -> Result<Option<Value>> {
        match self {
            Self::Memory(store) => store.remove(id, key),
        }
    }

    fn renew(&self, id: &str) -> Result<String> {
        match self {
            Self::Memory(store) => store.renew(id),
        }
    }

    fn destroy(&self, id: &str) -> Result<()> {
        match self {
            Self::Memory(store) => store.destroy(id),
        }
    }

    fn purge_expired(&self) -> Result<usize> {
        match self {
            Self::Memory(store) => store.purge_expired(),
        }
    }
}

/// Generates a 256-bit random identifier, base64url encoded without padding.
/// Used for session ids and CSRF state values.
pub fn generate_id() -> String {
    let mut buf = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut buf);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf)
}

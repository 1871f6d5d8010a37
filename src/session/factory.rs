use std::time::Duration;

use anyhow::Result;

use super::config::{SessionConfig, SessionStoreType};
use super::memory::MemorySessionStore;
use super::UnionSessionStore;

pub struct SessionFactory;

impl SessionFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_store(&self, cfg: &SessionConfig) -> Result<UnionSessionStore> {
        let store = match cfg.name {
            SessionStoreType::Memory => {
                UnionSessionStore::Memory(MemorySessionStore::new(Duration::from_secs(cfg.ttl_secs)))
            }
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CommonConfig;
    use crate::session::SessionStore;

    use super::*;

    #[test]
    fn test_build_store() {
        let cfg: SessionConfig = toml::from_str("ttl_secs = 5").unwrap();
        assert_eq!(cfg.cookie_name, "authgate.session");

        let store = SessionFactory::new().build_store(&cfg).unwrap();
        let id = store.create().unwrap();
        assert!(store.exists(&id).unwrap());

        let cfg = SessionConfig::default();
        assert_eq!(cfg.ttl_secs, 1800);
    }
}

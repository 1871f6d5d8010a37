use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use log::debug;
use serde_json::Value;

use super::{generate_id, SessionStore};

struct SessionEntry {
    data: HashMap<String, Value>,
    last_access: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            data: HashMap::new(),
            last_access: Instant::now(),
        }
    }

    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.last_access) >= ttl
    }
}

/// A memory-based session store. Sessions expire once they have been idle
/// for longer than the ttl; every successful access refreshes the idle timer.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<HashMap<String, SessionEntry>>> {
        match self.sessions.lock() {
            Ok(sessions) => Ok(sessions),
            Err(_) => bail!("session store lock poisoned"),
        }
    }

    /// Looks up a live session, dropping it if it has expired.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<String, SessionEntry>,
        id: &str,
    ) -> Option<&'a mut SessionEntry> {
        let now = Instant::now();
        let expired = match sessions.get(id) {
            Some(entry) => entry.is_expired(self.ttl, now),
            None => return None,
        };
        if expired {
            debug!("Session expired, drop it");
            sessions.remove(id);
            return None;
        }

        let entry = sessions.get_mut(id)?;
        entry.last_access = now;
        Some(entry)
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self) -> Result<String> {
        let mut sessions = self.lock()?;
        let mut id = generate_id();
        while sessions.contains_key(&id) {
            id = generate_id();
        }
        sessions.insert(id.clone(), SessionEntry::new());
        Ok(id)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let mut sessions = self.lock()?;
        Ok(self.touch(&mut sessions, id).is_some())
    }

    fn get(&self, id: &str, key: &str) -> Result<Option<Value>> {
        let mut sessions = self.lock()?;
        Ok(self
            .touch(&mut sessions, id)
            .and_then(|entry| entry.data.get(key).cloned()))
    }

    fn put(&self, id: &str, key: &str, value: Value) -> Result<()> {
        let mut sessions = self.lock()?;
        match self.touch(&mut sessions, id) {
            Some(entry) => {
                entry.data.insert(key.to_string(), value);
                Ok(())
            }
            None => bail!("session not found"),
        }
    }

    fn remove(&self, id: &str, key: &str) -> Result<Option<Value>> {
        let mut sessions = self.lock()?;
        Ok(self
            .touch(&mut sessions, id)
            .and_then(|entry| entry.data.remove(key)))
    }

    fn renew(&self, id: &str) -> Result<String> {
        let mut sessions = self.lock()?;
        if self.touch(&mut sessions, id).is_none() {
            bail!("session not found");
        }

        let mut entry = match sessions.remove(id) {
            Some(entry) => entry,
            None => bail!("session not found"),
        };
        entry.last_access = Instant::now();

        let mut new_id = generate_id();
        while sessions.contains_key(&new_id) {
            new_id = generate_id();
        }
        sessions.insert(new_id.clone(), entry);
        Ok(new_id)
    }

    fn destroy(&self, id: &str) -> Result<()> {
        self.lock()?.remove(id);
        Ok(())
    }

    fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.lock()?;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(self.ttl, now));
        Ok(before - sessions.len())
    }
}

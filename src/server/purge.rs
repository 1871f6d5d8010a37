use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};

use crate::session::{SessionStore, UnionSessionStore};

/// Periodically drops sessions that stayed idle past their ttl. Runs until
/// the task is aborted.
pub async fn start_purge(store: Arc<UnionSessionStore>, interval: Duration) {
    info!("Session purge loop starting, interval: {}s", interval.as_secs());
    let mut tk = tokio::time::interval(interval);
    loop {
        let _ = tk.tick().await;

        match store.purge_expired() {
            Ok(0) => {}
            Ok(count) => debug!("Purged {count} expired session(s)"),
            Err(e) => error!("Failed to purge expired sessions: {e:#}"),
        }
    }
}

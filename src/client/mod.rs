mod indirect;

pub mod config;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use crate::config::ConfigurationError;
use crate::context::WebContext;
use crate::profile::Profile;

pub use indirect::{Credentials, IndirectClient, ProfileCreator};

/// Query parameter carrying the client name on callback URLs.
pub const CLIENT_NAME_PARAM: &str = "client_name";

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("provider rejected the login: {0}")]
    Rejected(String),

    #[error("callback state does not match the one issued for this session")]
    StateMismatch,

    #[error("malformed callback: {0}")]
    MalformedCallback(String),

    #[error("provider error: {0:#}")]
    Provider(anyhow::Error),

    #[error("provider did not answer within {0:?}")]
    Timeout(Duration),

    #[error("unknown client '{0}'")]
    UnknownClient(String),

    #[error("client '{0}' was not offered to this session")]
    ClientNotOffered(String),

    #[error("session error: {0:#}")]
    Session(anyhow::Error),
}

/// An identity provider integration. The protocol details stay behind these
/// two calls: where to send the browser, and how to turn the provider's
/// callback into a profile.
#[async_trait]
pub trait Client: Send + Sync {
    fn name(&self) -> &str;

    async fn redirection_url(&self, ctx: &mut WebContext) -> Result<String, AuthenticationError>;

    async fn complete_login(&self, ctx: &mut WebContext) -> Result<Profile, AuthenticationError>;
}

/// The fixed set of clients known to the gate, addressed by name.
pub struct Clients {
    clients: Vec<Arc<dyn Client>>,
    index: HashMap<String, usize>,
    timeout: Duration,
}

impl Clients {
    pub fn new(
        clients: Vec<Arc<dyn Client>>,
        timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        let mut index = HashMap::with_capacity(clients.len());
        for (idx, client) in clients.iter().enumerate() {
            let name = client.name();
            if name.is_empty() {
                return Err(ConfigurationError::EmptyClientName);
            }
            if index.insert(name.to_string(), idx).is_some() {
                return Err(ConfigurationError::DuplicateClient(name.to_string()));
            }
        }

        Ok(Self {
            clients,
            index,
            timeout,
        })
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Client>> {
        self.index.get(name).map(|idx| &self.clients[*idx])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.iter().map(|c| c.name())
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn redirection_url(
        &self,
        client: &dyn Client,
        ctx: &mut WebContext,
    ) -> Result<String, AuthenticationError> {
        match tokio::time::timeout(self.timeout, client.redirection_url(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(AuthenticationError::Timeout(self.timeout)),
        }
    }

    /// Runs the client's login completion under the provider timeout and
    /// checks that the resulting profile belongs to that client.
    pub async fn complete_login(
        &self,
        client: &dyn Client,
        ctx: &mut WebContext,
    ) -> Result<Profile, AuthenticationError> {
        let profile = match tokio::time::timeout(self.timeout, client.complete_login(ctx)).await {
            Ok(result) => result?,
            Err(_) => return Err(AuthenticationError::Timeout(self.timeout)),
        };

        if profile.id().is_empty() {
            return Err(AuthenticationError::Rejected(String::from(
                "provider returned a profile without id",
            )));
        }
        if profile.client_name() != client.name() {
            return Err(AuthenticationError::Rejected(format!(
                "profile was issued by '{}', expect '{}'",
                profile.client_name(),
                client.name()
            )));
        }

        debug!(
            "Client '{}' completed login for '{}'",
            client.name(),
            profile.id()
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::session::{MemorySessionStore, UnionSessionStore};

    use super::*;

    struct StaticClient {
        name: String,
        profile_client: String,
        delay: Duration,
    }

    impl StaticClient {
        fn new(name: &str) -> Arc<dyn Client> {
            Arc::new(Self {
                name: name.to_string(),
                profile_client: name.to_string(),
                delay: Duration::ZERO,
            })
        }
    }

    #[async_trait]
    impl Client for StaticClient {
        fn name(&self) -> &str {
            &self.name
        }

        async fn redirection_url(
            &self,
            _ctx: &mut WebContext,
        ) -> Result<String, AuthenticationError> {
            tokio::time::sleep(self.delay).await;
            Ok(format!("https://provider.example.com/{}", self.name))
        }

        async fn complete_login(
            &self,
            _ctx: &mut WebContext,
        ) -> Result<Profile, AuthenticationError> {
            tokio::time::sleep(self.delay).await;
            Ok(Profile::new("user1", &self.profile_client))
        }
    }

    fn new_ctx() -> WebContext {
        let store = Arc::new(UnionSessionStore::Memory(MemorySessionStore::new(
            Duration::from_secs(60),
        )));
        WebContext::new("GET", "/callback", store, None)
    }

    #[test]
    fn test_registry() {
        let clients = Clients::new(
            vec![StaticClient::new("oauth2"), StaticClient::new("facebook")],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(clients.names().collect::<Vec<_>>(), vec!["oauth2", "facebook"]);
        assert_eq!(clients.find("facebook").unwrap().name(), "facebook");
        assert!(clients.find("twitter").is_none());

        let err = Clients::new(
            vec![StaticClient::new("oauth2"), StaticClient::new("oauth2")],
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert_eq!(err, ConfigurationError::DuplicateClient("oauth2".to_string()));

        let err = Clients::new(vec![StaticClient::new("")], Duration::from_secs(1))
            .err()
            .unwrap();
        assert_eq!(err, ConfigurationError::EmptyClientName);
    }

    #[tokio::test]
    async fn test_timeout() {
        let slow: Arc<dyn Client> = Arc::new(StaticClient {
            name: "slow".to_string(),
            profile_client: "slow".to_string(),
            delay: Duration::from_millis(200),
        });
        let clients = Clients::new(vec![slow.clone()], Duration::from_millis(20)).unwrap();

        let mut ctx = new_ctx();
        let err = clients
            .redirection_url(slow.as_ref(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticationError::Timeout(_)));

        let err = clients
            .complete_login(slow.as_ref(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticationError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_profile_client_mismatch() {
        let client: Arc<dyn Client> = Arc::new(StaticClient {
            name: "oauth2".to_string(),
            profile_client: "facebook".to_string(),
            delay: Duration::ZERO,
        });
        let clients = Clients::new(vec![client.clone()], Duration::from_secs(1)).unwrap();

        let mut ctx = new_ctx();
        let err = clients
            .complete_login(client.as_ref(), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthenticationError::Rejected(_)));

        let good = StaticClient::new("oauth2");
        let clients = Clients::new(vec![good.clone()], Duration::from_secs(1)).unwrap();
        let profile = clients
            .complete_login(good.as_ref(), &mut ctx)
            .await
            .unwrap();
        assert_eq!(profile.client_name(), "oauth2");
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{info, warn};
use openssl::ssl::{SslAcceptor, SslAcceptorBuilder, SslFiletype, SslMethod};

use crate::authn::factory::AuthnFactory;
use crate::authn::token::factory::TokenFactory;
use crate::authn::AuthProvider;
use crate::authz::factory::AuthzFactory;
use crate::authz::Authorizer;
use crate::client::config::IndirectClientConfig;
use crate::client::{Client, Clients, IndirectClient, ProfileCreator};
use crate::config::ConfigurationError;
use crate::handlers::callback::CallbackHandler;
use crate::handlers::config::RouteResource;
use crate::handlers::logout::LogoutHandler;
use crate::handlers::resources::{HealthzHandler, ProfilesHandler, TokenHandler};
use crate::handlers::security::SecurityHandler;
use crate::handlers::Handler;
use crate::session::factory::SessionFactory;

use super::config::ServerConfig;
use super::restful::{ProtectedRoute, RestfulContext, RestfulServer};

/// Assembles the gate from its configuration plus the pieces only the host
/// application can provide: the clients, the resources of `host` routes and
/// custom authorizers.
pub struct ServerFactory {
    cfg: ServerConfig,

    clients: Vec<Arc<dyn Client>>,
    invalid_clients: Vec<ConfigurationError>,
    resources: HashMap<String, Arc<dyn Handler>>,
    authorizers: Vec<(String, Arc<dyn Authorizer>)>,
}

impl ServerFactory {
    pub fn new(cfg: ServerConfig) -> Self {
        Self {
            cfg,
            clients: Vec::new(),
            invalid_clients: Vec::new(),
            resources: HashMap::new(),
            authorizers: Vec::new(),
        }
    }

    pub fn with_client(mut self, client: Arc<dyn Client>) -> Self {
        self.clients.push(client);
        self
    }

    /// The config is completed here; a failure is reported by `build_context`.
    pub fn with_indirect_client<P>(mut self, mut cfg: IndirectClientConfig, creator: P) -> Self
    where
        P: ProfileCreator + 'static,
    {
        if let Err(err) = cfg.complete() {
            let name = format!("client '{}'", cfg.name);
            self.invalid_clients
                .push(ConfigurationError::invalid(name, format!("{err:#}")));
            return self;
        }
        self.with_client(Arc::new(IndirectClient::new(cfg, creator)))
    }

    /// Serves the route with this prefix once access is granted.
    pub fn with_resource(mut self, prefix: impl Into<String>, handler: Arc<dyn Handler>) -> Self {
        self.resources.insert(prefix.into(), handler);
        self
    }

    pub fn with_authorizer(
        mut self,
        name: impl Into<String>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        self.authorizers.push((name.into(), authorizer));
        self
    }

    pub fn build_server(&self) -> Result<RestfulServer> {
        let ssl = self.build_ssl()?;
        let ctx = self.build_context()?;

        let purge_interval = Duration::from_secs(self.cfg.session.purge_interval_secs);
        let mut srv = RestfulServer::new(self.cfg.bind.clone(), ssl, ctx, purge_interval);
        if self.cfg.keep_alive_secs > 0 {
            srv.set_keep_alive_secs(self.cfg.keep_alive_secs);
        }
        if self.cfg.workers > 0 {
            srv.set_workers(self.cfg.workers);
        }

        Ok(srv)
    }

    pub fn build_ssl(&self) -> Result<Option<SslAcceptorBuilder>> {
        if !self.cfg.ssl {
            return Ok(None);
        }

        let mut builder =
            SslAcceptor::mozilla_intermediate(SslMethod::tls()).context("init ssl acceptor")?;

        builder
            .set_private_key_file(&self.cfg.key_path, SslFiletype::PEM)
            .context("load ssl key file")?;
        builder
            .set_certificate_chain_file(&self.cfg.cert_path)
            .context("load ssl cert file")?;

        Ok(Some(builder))
    }

    pub fn build_context(&self) -> Result<Arc<RestfulContext>> {
        if let Some(err) = self.invalid_clients.first() {
            return Err(err.clone()).context("init clients");
        }

        let session_factory = SessionFactory::new();
        let store = session_factory
            .build_store(&self.cfg.session)
            .context("init session store")?;

        let clients = Clients::new(self.clients.clone(), self.cfg.provider.timeout())
            .context("init clients")?;
        let clients = Arc::new(clients);
        info!("Registered clients: {:?}", clients.names().collect::<Vec<_>>());

        let token_factory = if self.cfg.authn.stateless || self.cfg.needs_token_generator() {
            Some(TokenFactory::new(&self.cfg.authn.token).context("init token")?)
        } else {
            None
        };

        let authn_factory = AuthnFactory::new();
        let provider: Arc<dyn AuthProvider> = Arc::new(
            authn_factory
                .build_provider(&self.cfg.authn, token_factory.as_ref())
                .context("init auth provider")?,
        );

        let authz_factory = AuthzFactory::new();
        let mut authorizers = authz_factory
            .build_authorizers(&self.cfg.authz)
            .context("init authorizers")?;
        for (name, authorizer) in self.authorizers.iter() {
            authorizers
                .register_custom(name.clone(), authorizer.clone())
                .context("register custom authorizer")?;
        }

        let mut routes = Vec::with_capacity(self.cfg.routes.len());
        for options in self.cfg.routes.iter() {
            if routes
                .iter()
                .any(|r: &ProtectedRoute| r.security.prefix() == options.prefix)
            {
                return Err(ConfigurationError::invalid(
                    "routes",
                    format!("duplicate prefix '{}'", options.prefix),
                )
                .into());
            }

            let resource: Arc<dyn Handler> = match options.resource {
                RouteResource::Host => match self.resources.get(&options.prefix) {
                    Some(handler) => handler.clone(),
                    None => bail!("no resource registered for route '{}'", options.prefix),
                },
                RouteResource::Profiles => Arc::new(ProfilesHandler::new()),
                RouteResource::Token => {
                    let generator = match token_factory.as_ref() {
                        Some(factory) => factory.build_token_generator()?,
                        None => bail!("token route '{}' without token keys", options.prefix),
                    };
                    Arc::new(TokenHandler::new(generator))
                }
            };

            let security =
                SecurityHandler::new(options.clone(), provider.clone(), clients.clone(), &authorizers)
                    .with_context(|| format!("init route '{}'", options.prefix))?;
            info!(
                "Protect route '{}' with clients {:?}",
                options.prefix, options.clients
            );
            routes.push(ProtectedRoute { security, resource });
        }
        for prefix in self.resources.keys() {
            if !routes.iter().any(|r| r.security.prefix() == prefix) {
                warn!("Resource registered for '{prefix}' but no route protects it, ignored");
            }
        }
        // Longest prefix first, so that nested routes win over their parent.
        routes.sort_by(|a, b| b.security.prefix().len().cmp(&a.security.prefix().len()));

        let callback = CallbackHandler::new(self.cfg.callback.clone(), clients.clone())
            .context("init callback")?;
        let logout = LogoutHandler::new(self.cfg.logout.clone()).context("init logout")?;

        let ctx = RestfulContext {
            store: Arc::new(store),
            cookie_name: self.cfg.session.cookie_name.clone(),
            secure_cookie: self.cfg.session.secure_cookie,
            routes,
            callback,
            logout,
            healthz: HealthzHandler::new(),
        };
        Ok(Arc::new(ctx))
    }
}

mod purge;

pub mod config;
pub mod factory;
pub mod restful;

use anyhow::{Context, Result};

use crate::config::{CommonConfig, PathSet};
use crate::logs;

use config::ServerConfig;
use factory::ServerFactory;

/// Loads `server.toml` from the config directory, installs the logger and
/// runs the gate until it is stopped. `setup` registers what only the host
/// application knows: clients, resources and custom authorizers.
pub async fn serve<F>(ps: &PathSet, setup: F) -> Result<()>
where
    F: FnOnce(ServerFactory) -> ServerFactory,
{
    let cfg: ServerConfig = ps.load_config("server", ServerConfig::default)?;
    logs::init(&cfg.logs).context("init logs")?;

    let factory = setup(ServerFactory::new(cfg));
    let srv = factory.build_server()?;
    srv.run().await
}

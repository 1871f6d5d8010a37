use std::path::{Path, PathBuf};
use std::{env, fs, io};

use anyhow::{bail, Context, Result};
use log::warn;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors raised while turning configuration into runtime objects. These are
/// always startup failures, a running gate never produces one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("client name cannot be empty")]
    EmptyClientName,

    #[error("duplicate client '{0}'")]
    DuplicateClient(String),

    #[error("unknown client '{0}'")]
    UnknownClient(String),

    #[error("route '{0}' requires at least one client")]
    NoClients(String),

    #[error("authorizer name cannot be empty")]
    EmptyAuthorizerName,

    #[error("duplicate authorizer '{0}'")]
    DuplicateAuthorizer(String),

    #[error("unknown authorizer '{0}'")]
    UnknownAuthorizer(String),

    #[error("invalid value for '{name}': {reason}")]
    Invalid { name: String, reason: String },
}

impl ConfigurationError {
    pub fn invalid(name: impl ToString, reason: impl ToString) -> Self {
        Self::Invalid {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub struct PathSet {
    pub config_path: PathBuf,
    pub pki_path: PathBuf,
}

impl PathSet {
    pub fn new(config_path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(path) = config_path {
            path
        } else if let Ok(path) = env::var("AUTHGATE_CONFIG") {
            PathBuf::from(path)
        } else {
            Self::home_dir()?.join(".config").join("authgate")
        };

        let pki_path = config_path.join("pki");

        ensure_dir_exists(&config_path)
            .with_context(|| format!("ensure config directory: {}", config_path.display()))?;
        ensure_dir_exists(&pki_path)
            .with_context(|| format!("ensure pki directory: {}", pki_path.display()))?;

        Ok(Self {
            config_path,
            pki_path,
        })
    }

    pub fn load_config<T, F>(&self, name: &str, default_func: F) -> Result<T>
    where
        T: CommonConfig + DeserializeOwned,
        F: FnOnce() -> T,
    {
        let path = self.config_path.join(format!("{name}.toml"));
        let mut cfg: T = match fs::read_to_string(&path) {
            Ok(s) => toml::from_str(&s).context("parse config toml")?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!("Config file for {name} not found, using defaults");
                default_func()
            }
            Err(err) => {
                return Err(err).context(format!("read config file: {}", path.display()));
            }
        };

        cfg.complete(self).context("validate config")?;
        Ok(cfg)
    }

    fn home_dir() -> Result<PathBuf> {
        let dir = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .map(PathBuf::from);
        match dir {
            Some(dir) => Ok(dir),
            None => {
                bail!("could not determine home directory, please specify config path manually")
            }
        }
    }
}

pub trait CommonConfig {
    fn default() -> Self;
    fn complete(&mut self, ps: &PathSet) -> Result<()>;
}

/// See: [`shellexpand::full`].
pub fn expandenv(name: &str, s: impl AsRef<str>) -> Result<String> {
    let s =
        shellexpand::full(s.as_ref()).with_context(|| format!("expand env value for '{name}'"))?;
    Ok(s.to_string())
}

fn ensure_dir_exists(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => bail!("'{}' is not a directory", path.display()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).with_context(|| format!("create dir '{}'", path.display()))
        }
        Err(err) => Err(err).with_context(|| format!("stat '{}'", path.display())),
    }
}

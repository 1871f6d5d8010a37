use std::io::{self, IsTerminal};
use std::time::SystemTime;

use anyhow::{Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::{CommonConfig, PathSet};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogsConfig {
    #[serde(default = "LogsConfig::default_level")]
    pub level: LogLevel,

    #[serde(default = "LogsConfig::default_target")]
    pub target: LogTarget,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "error")]
    Error,
    #[serde(rename = "warning")]
    Warning,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "debug")]
    Debug,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    #[serde(rename = "stdout")]
    Stdout,
    #[serde(rename = "stderr")]
    Stderr,
}

impl CommonConfig for LogsConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            target: Self::default_target(),
        }
    }

    fn complete(&mut self, _ps: &PathSet) -> Result<()> {
        Ok(())
    }
}

impl LogsConfig {
    fn default_level() -> LogLevel {
        LogLevel::Info
    }

    fn default_target() -> LogTarget {
        LogTarget::Stdout
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

/// Installs the global logger. Must be called at most once per process.
pub fn init(cfg: &LogsConfig) -> Result<()> {
    let is_terminal = match cfg.target {
        LogTarget::Stdout => io::stdout().is_terminal(),
        LogTarget::Stderr => io::stderr().is_terminal(),
    };

    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .debug(Color::Magenta);

    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = humantime::format_rfc3339_millis(SystemTime::now());
            if is_terminal {
                out.finish(format_args!(
                    "{} [{}] {}",
                    now,
                    colors.color(record.level()),
                    message
                ))
            } else {
                out.finish(format_args!("{} [{}] {}", now, record.level(), message))
            }
        })
        .level(cfg.level.into());

    let dispatch = match cfg.target {
        LogTarget::Stdout => dispatch.chain(io::stdout()),
        LogTarget::Stderr => dispatch.chain(io::stderr()),
    };

    dispatch.apply().context("init logger")?;
    Ok(())
}

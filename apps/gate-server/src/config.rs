//! Layered server configuration.
//!
//! Sources, lowest to highest precedence:
//! 1. built-in defaults
//! 2. YAML file given with `--config`
//! 3. environment variables prefixed `GATE__`, `__` separating nesting levels
//!    (`GATE__SERVER__BIND_ADDR`, `GATE__GATE__REALM`)
//! 4. CLI overrides (`--port`, `-v`)

use std::net::SocketAddr;
use std::path::Path;

use access_gate::GateConfig;
use anyhow::Context as _;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use static_authn_plugin::StaticAuthNPluginConfig;

pub const ENV_PREFIX: &str = "GATE__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub gate: GateConfig,
    /// Users accepted by the static credential verifier
    pub authn: StaticAuthNPluginConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Parse bind address from configuration string.
    ///
    /// # Errors
    /// Returns an error if `bind_addr` is not a `host:port` socket address.
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {e}", self.bind_addr))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `access_gate=debug,info`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load defaults, then the optional YAML file, then `GATE__*` environment variables.
    ///
    /// # Errors
    /// Returns an error if a source cannot be read or the merged result does not
    /// match the configuration schema.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment
            .extract()
            .context("failed to load gate server configuration")
    }

    /// Apply `--port` and `-v` on top of the loaded configuration.
    ///
    /// # Errors
    /// Returns an error if a port override is given and the configured bind
    /// address cannot be parsed.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) -> anyhow::Result<()> {
        if let Some(port) = port {
            let mut addr = self.server.socket_addr()?;
            addr.set_port(port);
            self.server.bind_addr = addr.to_string();
        }

        // -v info, -vv debug, -vvv trace
        let level = match verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            level.clone_into(&mut self.logging.level);
        }
        Ok(())
    }
}

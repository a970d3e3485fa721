//! Configuration loading and validation.
//!
//! Environment variables supply the port, log level and socket path; flags
//! supply the origin allow-list and can override the address and socket. The
//! process exits with a clear error message if the result is invalid.

use std::fmt;
use std::net::{Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::Args;
use crate::cors::AllowedOrigins;

/// Values read from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// TCP port to listen on when `--address` is not given.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path of the tailscaled local API socket.
    #[serde(default = "default_tailscaled_socket")]
    pub tailscaled_socket: String,
}

fn default_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}
fn default_tailscaled_socket() -> String {
    localapi::DEFAULT_SOCKET_PATH.into()
}

impl EnvConfig {
    /// Read `PORT`, `LOG_LEVEL` and `TAILSCALED_SOCKET`. A variable set to
    /// the empty string counts as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env.ignore_empty(true))
            .build()
            .context("failed to build configuration from environment")?;

        cfg.try_deserialize()
            .context("failed to deserialise configuration")
    }
}

/// Address the HTTPS server binds to, remembering how it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenAddr {
    /// Address as configured, e.g. `":8080"`.
    pub display: String,
    /// Resolved socket address.
    pub addr: SocketAddr,
}

impl ListenAddr {
    /// Parse `host:port` or `:port`. A bare `:port` binds every interface.
    ///
    /// # Errors
    ///
    /// Returns an error if the port or address is not valid.
    pub fn parse(s: &str) -> Result<Self> {
        let addr = match s.strip_prefix(':') {
            Some(port) => {
                let port: u16 = port
                    .parse()
                    .with_context(|| format!("invalid port in listen address {s:?}"))?;
                SocketAddr::from((Ipv6Addr::UNSPECIFIED, port))
            }
            None => s
                .parse()
                .with_context(|| format!("invalid listen address {s:?}"))?,
        };
        Ok(Self {
            display: s.to_owned(),
            addr,
        })
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Validated service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Where the HTTPS server listens.
    pub listen: ListenAddr,
    /// Origins allowed to call `/whoami`.
    pub allowed_origins: AllowedOrigins,
    /// tailscaled local API socket.
    pub socket: PathBuf,
    /// Tracing log level.
    pub log_level: String,
}

impl Config {
    /// Combine the environment with parsed flags and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment cannot be read or any value is
    /// invalid.
    pub fn load(args: Args) -> Result<Self> {
        Self::resolve(args, EnvConfig::from_env()?)
    }

    /// An explicit `--address` wins over `PORT`; `--socket` wins over
    /// `TAILSCALED_SOCKET`.
    fn resolve(args: Args, env: EnvConfig) -> Result<Self> {
        let listen = match args.address.as_deref() {
            Some(address) if !address.trim().is_empty() => ListenAddr::parse(address.trim())?,
            _ => ListenAddr::parse(&format!(":{}", env.port))?,
        };

        let cfg = Self {
            listen,
            allowed_origins: AllowedOrigins::parse(&args.allowed_origins),
            socket: args
                .socket
                .unwrap_or_else(|| PathBuf::from(env.tailscaled_socket)),
            log_level: env.log_level,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.allowed_origins.has_empty_entry() {
            anyhow::bail!(
                "--allowed-origins must not contain empty entries (got {:?})",
                self.allowed_origins.to_string()
            );
        }
        if self.socket.as_os_str().is_empty() {
            anyhow::bail!("TAILSCALED_SOCKET is required and must not be empty");
        }
        Ok(())
    }
}

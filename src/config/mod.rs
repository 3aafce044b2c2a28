//! Connection configuration.
//!
//! Everything the client needs is passed explicitly; nothing is read
//! from disk unless the caller asks for it. Supports:
//! - TOML files (for the CLI)
//! - Environment variables
//! - Plain struct literals (for embedding)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{DbHostError, Result};
use crate::wire::{DATABASE_PORT, DATABASE_TLS_PORT, SIGNON_PORT, SIGNON_TLS_PORT};

/// Options governing how connections are made.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Port overrides; well-known ports are used when unset.
    #[serde(default)]
    pub ports: PortOptions,

    /// TLS trust settings, consulted only when TLS is requested.
    #[serde(default)]
    pub tls: TlsOptions,

    /// How to treat an unrecognized nonzero start-server return code.
    #[serde(default)]
    pub unknown_return_code: UnknownCodePolicy,
}

impl ConnectOptions {
    /// Load options from a TOML file.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| DbHostError::Config(format!("failed to read config file: {e}")))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load options from `DBHOST_*` environment variables.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(port) = std::env::var("DBHOST_DATABASE_PORT") {
            if let Ok(port) = port.parse() {
                options.ports.database = Some(port);
            }
        }
        if let Ok(port) = std::env::var("DBHOST_SIGNON_PORT") {
            if let Ok(port) = port.parse() {
                options.ports.signon = Some(port);
            }
        }
        if let Ok(path) = std::env::var("DBHOST_CA_FILE") {
            options.tls.ca_file = Some(PathBuf::from(path));
        }
        if let Ok(policy) = std::env::var("DBHOST_UNKNOWN_RETURN_CODE") {
            if policy.eq_ignore_ascii_case("fail") {
                options.unknown_return_code = UnknownCodePolicy::Fail;
            }
        }

        options
    }

    /// The database host server port for this TLS mode.
    pub fn database_port(&self, use_tls: bool) -> u16 {
        self.ports.database.unwrap_or(if use_tls {
            DATABASE_TLS_PORT
        } else {
            DATABASE_PORT
        })
    }

    /// The signon host server port for this TLS mode.
    pub fn signon_port(&self, use_tls: bool) -> u16 {
        self.ports.signon.unwrap_or(if use_tls {
            SIGNON_TLS_PORT
        } else {
            SIGNON_PORT
        })
    }
}

/// Port overrides for nonstandard deployments and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortOptions {
    /// Database host server port.
    pub database: Option<u16>,
    /// Signon host server port.
    pub signon: Option<u16>,
}

/// TLS trust settings for the client side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsOptions {
    /// PEM bundle of trusted root certificates.
    pub ca_file: Option<PathBuf>,

    /// Skip certificate verification entirely. Only for lab systems
    /// with self-signed certificates.
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

/// Handling of an unrecognized nonzero start-server return code.
///
/// The servers in the field occasionally return codes outside the
/// documented set while still starting the job, so `Warn` is the
/// default: log and keep parsing the reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCodePolicy {
    /// Log the code at WARN and continue parsing the reply trailer.
    #[default]
    Warn,
    /// Fail the handshake with
    /// [`DbHostError::UnknownReturnCode`](crate::DbHostError::UnknownReturnCode).
    Fail,
}

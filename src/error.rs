//! Error types for the database host server client.
//!
//! Failure kinds mirror the protocol's fault lines:
//!
//! - **Framing** — a reply shorter than the fixed 20-byte header; the
//!   stream can no longer be trusted and the handshake is aborted.
//! - **SeedExchange** — a nonzero return code from the seed exchange
//!   round; always fatal.
//! - **Authentication** — a nonzero start-server return code with a
//!   cataloged reason; the catalog message is surfaced verbatim.
//! - **UnknownReturnCode** — a nonzero start-server code the catalog
//!   does not know; fatal only under [`UnknownCodePolicy::Fail`].
//! - **Io** — socket failures propagate unchanged; no retries happen at
//!   this layer.
//!
//! Plaintext passwords never appear in any variant or `Display` output;
//! diagnostics only ever reference encoded or encrypted forms.
//!
//! [`UnknownCodePolicy::Fail`]: crate::config::UnknownCodePolicy

use thiserror::Error;

/// Errors produced while talking to a host server.
#[derive(Error, Debug)]
pub enum DbHostError {
    /// Reply shorter than the fixed 20-byte header.
    #[error("{context}: reply length {length} is below the 20-byte header minimum")]
    Framing {
        /// Which exchange produced the short reply.
        context: &'static str,
        /// The length field the server sent.
        length: u32,
    },

    /// Seed exchange rejected by the server.
    #[error("seed exchange failed: return code {code:#010X}")]
    SeedExchange {
        /// The 32-bit return code from the reply.
        code: u32,
    },

    /// Start-server rejected with a cataloged reason.
    #[error("{0}")]
    Authentication(&'static str),

    /// Start-server returned a code the catalog does not know.
    #[error("start server returned unrecognized code {code:#010X}")]
    UnknownReturnCode {
        /// The 32-bit return code from the reply.
        code: u32,
    },

    /// The start-server reply carried no job name field.
    #[error("start server reply did not include a job name")]
    MissingJobName,

    /// Signon host server rejected a request.
    #[error("signon failed: {0}")]
    Signon(String),

    /// Text cannot be represented in the target code page.
    #[error("text conversion error: {0}")]
    Encoding(String),

    /// Malformed field stream or request construction failure.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// TLS setup or handshake error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error from the underlying socket.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for host server operations.
pub type Result<T> = std::result::Result<T, DbHostError>;

impl From<rustls::Error> for DbHostError {
    fn from(err: rustls::Error) -> Self {
        DbHostError::Tls(err.to_string())
    }
}

impl From<toml::de::Error> for DbHostError {
    fn from(err: toml::de::Error) -> Self {
        DbHostError::Config(err.to_string())
    }
}

//! # dbhost - Database Host Server Client
//!
//! Client for the wire protocol used to authenticate to and configure a
//! remote midrange system's database host server — the dedicated-port
//! service that spawns a server job to host a client's database work.
//!
//! ## Features
//!
//! - **Seed-exchange authentication**: random seed exchange, DES or
//!   SHA-1 password substitutes keyed by the negotiated password level
//! - **Signon bootstrap**: system metadata discovery (password level,
//!   server version) via the signon host server
//! - **Attribute negotiation**: sparse, typed server-attribute set with
//!   length-prefixed field encoding
//! - **TLS**: optional rustls-wrapped connections on the TLS ports
//!
//! ## Connection Flow
//!
//! ```text
//! Client                 Signon server          Database server
//!    |                        |                        |
//!    |---- seeds + info ----->|                        |
//!    |<--- password level ----|                        |
//!    |      (discarded)       x                        |
//!    |                                                 |
//!    |---- exchange random seeds (0x7001) ------------>|
//!    |<--- server seed --------------------------------|
//!    |---- start server (0x7002) --------------------->|
//!    |<--- job name -----------------------------------|
//!    |                                                 |
//!    |==== set server attributes (8064) ==============>|
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dbhost::{ConnectOptions, DatabaseSession, ServerAttributes};
//!
//! let options = ConnectOptions::default();
//! let mut session =
//!     DatabaseSession::connect(false, "prod.system", "QUSER", password, &options).await?;
//!
//! println!("job: {}", session.job_name());
//!
//! let attributes = ServerAttributes {
//!     client_application_name: Some("PAYROLL".to_string()),
//!     naming_convention: Some(1),
//!     ..ServerAttributes::default()
//! };
//! session.set_server_attributes(&attributes).await?;
//! ```
//!
//! ## Concurrency Model
//!
//! A session is a single logical thread of control: one in-flight
//! request at a time, write-flush-await for every round trip. The
//! protocol embeds correlation ids but does not verify them on replies,
//! so sharing a session between tasks is unsafe — give each concurrent
//! unit of work its own session, or serialize access externally.
//! Timeouts and cancellation belong to the caller.
//!
//! ## Modules
//!
//! - [`protocol`]: handshake, attribute negotiation, sessions
//! - [`signon`]: signon host server collaborator
//! - [`transport`]: buffered TCP/TLS connections
//! - [`wire`]: framing primitives shared by every exchange
//! - [`auth`]: credential encodings and password substitutes
//! - [`ebcdic`]: CCSID 37 text conversion
//! - [`config`]: connect options
//! - [`error`]: error types and result alias

pub mod auth;
pub mod config;
pub mod ebcdic;
pub mod error;
pub mod protocol;
pub mod signon;
pub mod transport;
pub mod wire;

// Re-exports for convenience
pub use config::{ConnectOptions, TlsOptions, UnknownCodePolicy};
pub use error::{DbHostError, Result};
pub use protocol::{
    AttributeId, DatabaseSession, DecimalPrecision, NlssIdentifier, ServerAttributes,
};
pub use signon::{SignonConnection, SystemInfo};
pub use transport::HostServerConnection;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Database host server protocol: handshake, attributes, sessions.
//!
//! The protocol is a strict request/reply sequence over one connection:
//!
//! ```text
//! Client                                   Database server (0xE004)
//!    |                                        |
//!    |---- exchange random seeds (0x7001) --->|
//!    |<--- server seed -----------------------|
//!    |---- start server (0x7002) ------------>|
//!    |<--- job name trailer ------------------|
//!    |                                        |
//!    |==== set server attributes (8064) =====>|   correlated requests
//!    |<=== acknowledgement ===================|
//! ```
//!
//! The two handshake rounds run before correlation tracking starts and
//! use fixed frames; everything after them goes through the common
//! 20-byte envelope with a fresh correlation id per message.
//!
//! ## Failure handling
//!
//! | Condition                              | Outcome                      |
//! |----------------------------------------|------------------------------|
//! | Reply shorter than 20 bytes            | [`DbHostError::Framing`]     |
//! | Seed exchange return code ≠ 0          | [`DbHostError::SeedExchange`]|
//! | Start-server code known to the catalog | [`DbHostError::Authentication`] |
//! | Start-server code unknown              | warn or fail, per [`UnknownCodePolicy`] |
//! | Job name absent from the trailer       | [`DbHostError::MissingJobName`] |
//!
//! [`DbHostError::Framing`]: crate::DbHostError::Framing
//! [`DbHostError::SeedExchange`]: crate::DbHostError::SeedExchange
//! [`DbHostError::Authentication`]: crate::DbHostError::Authentication
//! [`DbHostError::MissingJobName`]: crate::DbHostError::MissingJobName
//! [`UnknownCodePolicy`]: crate::config::UnknownCodePolicy

pub mod attrs;
pub mod handshake;
pub mod return_code;
pub mod session;

pub use attrs::{AttributeId, DecimalPrecision, NlssIdentifier, ServerAttributes};
pub use session::DatabaseSession;

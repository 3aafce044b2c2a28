//! Two-round authentication handshake against a host server.
//!
//! ```text
//! Client                                  Host server
//!    |                                        |
//!    |---- exchange random seeds (0x7001) --->|  28-byte fixed request
//!    |<--- return code + server seed ---------|
//!    |                                        |
//!    |     derive credential encodings,       |
//!    |     encrypt password, drop plaintext   |
//!    |                                        |
//!    |---- start server (0x7002) ------------>|  substitute + user id
//!    |<--- return code + LL/CP trailer -------|  job name in field 0x111F
//! ```
//!
//! Both rounds precede correlation tracking, so their correlation ids
//! are zero. The handshake runs once per connection, immediately after
//! the socket opens, and yields the name of the server job that will
//! host the session.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth;
use crate::config::UnknownCodePolicy;
use crate::error::{DbHostError, Result};
use crate::transport::HostServerConnection;
use crate::wire::trailer::extract_job_name;
use crate::wire::{
    RequestBuffer, CP_PASSWORD, CP_USER_ID, REQ_EXCHANGE_SEEDS, REQ_START_SERVER,
};

use super::return_code;

/// Run the full handshake and return the server job name.
///
/// `server_id` identifies the host server being started; the database
/// server uses [`DATABASE_SERVER_ID`](crate::wire::DATABASE_SERVER_ID).
/// The plaintext `password` is consumed by the substitute computation
/// and is never retained or logged.
pub async fn initial_connect(
    connection: &mut HostServerConnection,
    server_id: u16,
    password_level: u8,
    user: &str,
    password: &str,
    policy: UnknownCodePolicy,
) -> Result<String> {
    let client_seed = clock_seed();
    send_exchange_seeds_request(connection, server_id, &client_seed).await?;
    let server_seed = read_exchange_seeds_reply(connection).await?;

    // Credential derivation between the rounds. The plaintext leaves
    // scope as soon as the substitute exists.
    let user_bytes = auth::user_bytes(user, password_level)?;
    let password_bytes = auth::password_bytes(password, password_level)?;
    let encrypted =
        auth::encrypted_password(&user_bytes, &password_bytes, &client_seed, &server_seed, password_level)?;
    drop(password_bytes);

    // The start-server user id field is always the EBCDIC form; reuse
    // the password-derivation encoding below the SHA level, recompute
    // with level-0 semantics otherwise.
    let user_ebcdic = if password_level < auth::SHA_PASSWORD_LEVEL {
        user_bytes
    } else {
        auth::user_bytes(user, 0)?
    };

    send_start_server_request(connection, server_id, &user_ebcdic, &encrypted).await?;
    read_start_server_reply(connection, policy).await
}

/// Client seed: a high-resolution clock reading. The seed is sent
/// before any secret material exists, so it only needs uniqueness.
pub(crate) fn clock_seed() -> [u8; 8] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    nanos.to_be_bytes()
}

/// Round 1 request: 28 fixed bytes carrying capability flags and the
/// client seed. This round has its own header shape, not the common
/// envelope.
async fn send_exchange_seeds_request(
    connection: &mut HostServerConnection,
    server_id: u16,
    client_seed: &[u8; 8],
) -> Result<()> {
    let mut buf = RequestBuffer::with_capacity(28);
    buf.write_u32(28); // Length
    buf.write_u8(1); // Client attributes, 1 means capable of SHA-1
    buf.write_u8(0); // Server attributes
    buf.write_u16(server_id);
    buf.write_u32(0); // CS instance
    buf.write_u32(0); // Correlation ID
    buf.write_u16(8); // Template length
    buf.write_u16(REQ_EXCHANGE_SEEDS);
    buf.write_bytes(client_seed);

    connection.write_all(&buf.freeze()).await?;
    connection.flush().await
}

async fn read_exchange_seeds_reply(connection: &mut HostServerConnection) -> Result<[u8; 8]> {
    let length = connection.read_u32().await?;
    if length < 20 {
        return Err(DbHostError::Framing {
            context: "exchange random seeds",
            length,
        });
    }
    connection.skip(16).await?;

    let code = connection.read_u32().await?;
    if code != 0 {
        return Err(DbHostError::SeedExchange { code });
    }

    let mut server_seed = [0u8; 8];
    connection.read_exact(&mut server_seed).await?;
    Ok(server_seed)
}

/// Round 2 request: the encrypted password and the EBCDIC user id,
/// framed as LL/CP fields behind a fixed template.
async fn send_start_server_request(
    connection: &mut HostServerConnection,
    server_id: u16,
    user_ebcdic: &[u8],
    encrypted_password: &[u8],
) -> Result<()> {
    if user_ebcdic.len() != 10 {
        return Err(DbHostError::Protocol(format!(
            "start server user id must be 10 EBCDIC bytes, got {}",
            user_ebcdic.len()
        )));
    }
    let password_len = encrypted_password.len() as u32;

    let mut buf = RequestBuffer::with_capacity(44 + encrypted_password.len());
    buf.write_u32(44 + password_len); // Length
    buf.write_u8(2); // Client attributes, 2 means return job info
    buf.write_u8(0); // Server attributes
    buf.write_u16(server_id);
    buf.write_u32(0); // CS instance
    buf.write_u32(0); // Correlation ID
    buf.write_u16(2); // Template length
    buf.write_u16(REQ_START_SERVER);
    buf.write_u8(auth::encryption_type(encrypted_password.len()));
    buf.write_u8(1); // Send reply
    buf.write_u32(6 + password_len); // Password LL
    buf.write_u16(CP_PASSWORD);
    buf.write_bytes(encrypted_password);
    buf.write_u32(16); // User ID LL
    buf.write_u16(CP_USER_ID);
    buf.write_bytes(user_ebcdic);

    connection.write_all(&buf.freeze()).await?;
    connection.flush().await
}

async fn read_start_server_reply(
    connection: &mut HostServerConnection,
    policy: UnknownCodePolicy,
) -> Result<String> {
    let length = connection.read_u32().await?;
    if length < 20 {
        return Err(DbHostError::Framing {
            context: "start server",
            length,
        });
    }
    connection.skip(16).await?;

    let code = connection.read_u32().await?;
    if code != 0 {
        if let Some(message) = return_code::describe(code) {
            return Err(DbHostError::Authentication(message));
        }
        match policy {
            UnknownCodePolicy::Fail => return Err(DbHostError::UnknownReturnCode { code }),
            UnknownCodePolicy::Warn => {
                tracing::warn!("start server returned unrecognized code {code:#010X}; continuing");
            }
        }
    }

    let trailer = connection.read_vec((length as usize).saturating_sub(24)).await?;
    extract_job_name(&trailer)?.ok_or(DbHostError::MissingJobName)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_seed_is_nonzero_and_moves() {
        let a = clock_seed();
        let b = clock_seed();
        assert_ne!(a, [0u8; 8]);
        // Monotonic clock reads taken back to back may collide at
        // coarse resolutions, but never run backwards.
        assert!(u64::from_be_bytes(b) >= u64::from_be_bytes(a));
    }
}

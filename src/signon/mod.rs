//! Signon host server collaborator.
//!
//! Before the database connection opens, the client asks the signon
//! server for system metadata — most importantly the password level,
//! which decides the credential encodings used everywhere else. The
//! signon connection is short-lived: connect, exchange, discard.
//!
//! The exchange uses the signon server's own request pair:
//!
//! ```text
//! Client                                 Signon server (0xE009)
//!    |                                        |
//!    |-- exchange attributes (0x7003) ------->|  version, level, seed
//!    |<-- version, level, seed, pw level -----|
//!    |                                        |
//!    |-- signon info (0x7004) --------------->|  substitute + user id
//!    |<-- return code, server CCSID, ... -----|
//! ```

use crate::auth;
use crate::config::ConnectOptions;
use crate::error::{DbHostError, Result};
use crate::protocol::handshake::clock_seed;
use crate::protocol::return_code;
use crate::transport::HostServerConnection;
use crate::wire::{
    FieldReader, RequestBuffer, CP_PASSWORD, CP_PASSWORD_LEVEL, CP_SEED, CP_SERVER_CCSID,
    CP_SERVER_LEVEL, CP_SERVER_VERSION, CP_USER_ID, REQ_SIGNON_EXCHANGE, REQ_SIGNON_INFO,
    SIGNON_SERVER_ID,
};

/// System metadata discovered during signon.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Host name or address the metadata belongs to.
    pub system: String,
    /// Host server version.
    pub server_version: u32,
    /// Host server datastream level.
    pub server_level: u16,
    /// Negotiated password level; decides the credential encodings.
    pub password_level: u8,
    /// CCSID the server uses for textual replies.
    pub server_ccsid: u32,
}

/// An authenticated connection to the signon host server.
pub struct SignonConnection {
    connection: HostServerConnection,
    system_info: SystemInfo,
}

impl SignonConnection {
    /// Connect, authenticate, and collect system metadata.
    pub async fn connect(
        use_tls: bool,
        system: &str,
        user: &str,
        password: &str,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let port = options.signon_port(use_tls);
        let tls = if use_tls { Some(&options.tls) } else { None };
        let mut connection = HostServerConnection::connect(system, port, tls).await?;

        let client_seed = clock_seed();
        send_exchange_request(&mut connection, &client_seed).await?;
        let exchange = read_exchange_reply(&mut connection).await?;

        tracing::debug!(
            version = exchange.server_version,
            level = exchange.server_level,
            password_level = exchange.password_level,
            "signon attributes exchanged"
        );

        let user_bytes = auth::user_bytes(user, exchange.password_level)?;
        let password_bytes = auth::password_bytes(password, exchange.password_level)?;
        let encrypted = auth::encrypted_password(
            &user_bytes,
            &password_bytes,
            &client_seed,
            &exchange.server_seed,
            exchange.password_level,
        )?;
        drop(password_bytes);

        let user_ebcdic = if exchange.password_level < auth::SHA_PASSWORD_LEVEL {
            user_bytes
        } else {
            auth::user_bytes(user, 0)?
        };

        send_info_request(&mut connection, &user_ebcdic, &encrypted).await?;
        let server_ccsid = read_info_reply(&mut connection).await?;

        Ok(Self {
            connection,
            system_info: SystemInfo {
                system: system.to_string(),
                server_version: exchange.server_version,
                server_level: exchange.server_level,
                password_level: exchange.password_level,
                server_ccsid,
            },
        })
    }

    /// The metadata collected during the exchange.
    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    /// Close the connection and keep the metadata.
    pub async fn close(mut self) -> Result<SystemInfo> {
        self.connection.shutdown().await?;
        Ok(self.system_info)
    }
}

/// 52-byte exchange request: client version, datastream level, seed.
async fn send_exchange_request(
    connection: &mut HostServerConnection,
    client_seed: &[u8; 8],
) -> Result<()> {
    let mut buf = RequestBuffer::with_capacity(52);
    buf.write_u32(52); // Length
    buf.write_u32(u32::from(SIGNON_SERVER_ID));
    buf.write_u32(0); // CS instance
    buf.write_u32(0); // Correlation ID
    buf.write_u16(0); // Template length
    buf.write_u16(REQ_SIGNON_EXCHANGE);
    // Version and level code points are shared between the request and
    // reply directions.
    buf.write_u32(10);
    buf.write_u16(CP_SERVER_VERSION);
    buf.write_u32(1); // Client version
    buf.write_u32(8);
    buf.write_u16(CP_SERVER_LEVEL);
    buf.write_u16(2); // Client datastream level
    buf.write_u32(14);
    buf.write_u16(CP_SEED);
    buf.write_bytes(client_seed);

    connection.write_all(&buf.freeze()).await?;
    connection.flush().await
}

#[derive(Debug)]
struct ExchangeReply {
    server_version: u32,
    server_level: u16,
    server_seed: [u8; 8],
    password_level: u8,
}

async fn read_exchange_reply(connection: &mut HostServerConnection) -> Result<ExchangeReply> {
    let length = connection.read_u32().await?;
    if length < 20 {
        return Err(DbHostError::Framing {
            context: "signon exchange",
            length,
        });
    }
    connection.skip(16).await?;

    let code = connection.read_u32().await?;
    if code != 0 {
        return Err(signon_error(code));
    }

    let fields = connection.read_vec((length as usize).saturating_sub(24)).await?;
    parse_exchange_fields(&fields)
}

fn parse_exchange_fields(fields: &[u8]) -> Result<ExchangeReply> {
    let mut server_version = 0u32;
    let mut server_level = 0u16;
    let mut server_seed = None;
    let mut password_level = 0u8;

    for field in FieldReader::new(fields) {
        let field = field?;
        match field.code_point {
            CP_SERVER_VERSION if field.payload.len() >= 4 => {
                server_version = u32::from_be_bytes(field.payload[..4].try_into().unwrap());
            }
            CP_SERVER_LEVEL if field.payload.len() >= 2 => {
                server_level = u16::from_be_bytes(field.payload[..2].try_into().unwrap());
            }
            CP_SEED if field.payload.len() == 8 => {
                server_seed = Some(field.payload.try_into().unwrap());
            }
            CP_PASSWORD_LEVEL if !field.payload.is_empty() => {
                password_level = field.payload[0];
            }
            _ => {} // unknown fields are fine
        }
    }

    let server_seed = server_seed
        .ok_or_else(|| DbHostError::Signon("exchange reply carried no server seed".to_string()))?;
    Ok(ExchangeReply {
        server_version,
        server_level,
        server_seed,
        password_level,
    })
}

/// Signon info request: proves the credentials against the seeds.
async fn send_info_request(
    connection: &mut HostServerConnection,
    user_ebcdic: &[u8],
    encrypted_password: &[u8],
) -> Result<()> {
    let password_len = encrypted_password.len() as u32;

    let mut buf = RequestBuffer::with_capacity(43 + encrypted_password.len());
    buf.write_u32(43 + password_len); // Length
    buf.write_u32(u32::from(SIGNON_SERVER_ID));
    buf.write_u32(0); // CS instance
    buf.write_u32(0); // Correlation ID
    buf.write_u16(1); // Template length: the encryption-type byte
    buf.write_u16(REQ_SIGNON_INFO);
    buf.write_u8(auth::encryption_type(encrypted_password.len()));
    buf.write_u32(6 + password_len); // Password LL
    buf.write_u16(CP_PASSWORD);
    buf.write_bytes(encrypted_password);
    buf.write_u32(16); // User ID LL
    buf.write_u16(CP_USER_ID);
    buf.write_bytes(user_ebcdic);

    connection.write_all(&buf.freeze()).await?;
    connection.flush().await
}

async fn read_info_reply(connection: &mut HostServerConnection) -> Result<u32> {
    let length = connection.read_u32().await?;
    if length < 20 {
        return Err(DbHostError::Framing {
            context: "signon info",
            length,
        });
    }
    connection.skip(16).await?;

    let code = connection.read_u32().await?;
    if code != 0 {
        return Err(signon_error(code));
    }

    let fields = connection.read_vec((length as usize).saturating_sub(24)).await?;
    Ok(parse_server_ccsid(&fields).unwrap_or(u32::from(crate::ebcdic::CCSID)))
}

fn parse_server_ccsid(fields: &[u8]) -> Option<u32> {
    for field in FieldReader::new(fields).flatten() {
        if field.code_point == CP_SERVER_CCSID && field.payload.len() >= 4 {
            return Some(u32::from_be_bytes(field.payload[..4].try_into().unwrap()));
        }
    }
    None
}

fn signon_error(code: u32) -> DbHostError {
    match return_code::describe(code) {
        Some(message) => DbHostError::Signon(message.to_string()),
        None => DbHostError::Signon(format!("return code {code:#010X}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::RequestBuffer;

    fn exchange_fields(seed: [u8; 8], password_level: u8) -> Vec<u8> {
        let mut buf = RequestBuffer::new();
        buf.write_u32(10);
        buf.write_u16(CP_SERVER_VERSION);
        buf.write_u32(0x0007_0500);
        buf.write_u32(8);
        buf.write_u16(CP_SERVER_LEVEL);
        buf.write_u16(10);
        buf.write_u32(14);
        buf.write_u16(CP_SEED);
        buf.write_bytes(&seed);
        buf.write_u32(7);
        buf.write_u16(CP_PASSWORD_LEVEL);
        buf.write_u8(password_level);
        buf.freeze().to_vec()
    }

    #[test]
    fn test_parse_exchange_fields() {
        let fields = exchange_fields([9; 8], 2);
        let reply = parse_exchange_fields(&fields).unwrap();
        assert_eq!(reply.server_version, 0x0007_0500);
        assert_eq!(reply.server_level, 10);
        assert_eq!(reply.server_seed, [9; 8]);
        assert_eq!(reply.password_level, 2);
    }

    #[test]
    fn test_exchange_reply_requires_seed() {
        let mut buf = RequestBuffer::new();
        buf.write_u32(7);
        buf.write_u16(CP_PASSWORD_LEVEL);
        buf.write_u8(0);
        let err = parse_exchange_fields(buf.as_slice()).unwrap_err();
        assert!(matches!(err, DbHostError::Signon(_)));
    }

    #[test]
    fn test_parse_server_ccsid_with_unknown_fields() {
        let mut buf = RequestBuffer::new();
        buf.write_u32(8); // an unrelated field first
        buf.write_u16(0x1106);
        buf.write_u16(0);
        buf.write_u32(10);
        buf.write_u16(CP_SERVER_CCSID);
        buf.write_u32(37);
        assert_eq!(parse_server_ccsid(buf.as_slice()), Some(37));
    }

    #[test]
    fn test_signon_error_uses_catalog() {
        let err = signon_error(0x0002_0001);
        assert!(err.to_string().contains("User Id unknown"));
    }
}

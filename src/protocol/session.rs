//! Database session lifecycle.
//!
//! A [`DatabaseSession`] owns one authenticated connection to the
//! database host server. It is created only by the bootstrap path
//! ([`DatabaseSession::connect`]), which chains the signon exchange,
//! socket setup, and the start-server handshake. Afterwards the session
//! drives attribute negotiation and any further correlated requests.
//!
//! Sessions are strictly one-request-at-a-time: every operation writes,
//! flushes, and then waits for the complete reply before parsing. The
//! client does not verify that a reply's correlation id matches the
//! request, so callers must never share a session between concurrent
//! tasks — use one session per unit of work or serialize externally.

use std::net::IpAddr;

use crate::config::ConnectOptions;
use crate::error::{DbHostError, Result};
use crate::signon::{SignonConnection, SystemInfo};
use crate::transport::HostServerConnection;
use crate::wire::{
    write_envelope, CorrelationCounter, RequestBuffer, DATABASE_SERVER_ID, HEADER_SIZE,
    REQ_SET_ATTRIBUTES,
};

use super::attrs::ServerAttributes;
use super::handshake;

/// Byte length of the set-attributes fixed template: ORS bitmap,
/// reserved word, five handles, parameter count.
const ATTRIBUTE_TEMPLATE_SIZE: u32 = 20;

/// An authenticated session with the database host server.
#[derive(Debug)]
pub struct DatabaseSession {
    connection: HostServerConnection,
    system_info: SystemInfo,
    job_name: String,
    user: String,
    correlation: CorrelationCounter,
    compress: bool,
}

impl DatabaseSession {
    /// Connect to `system` as `user`, running the full bootstrap:
    /// signon for system metadata, then the database server handshake.
    ///
    /// The signon connection is discarded as soon as the metadata is in
    /// hand; only the database connection lives on in the session.
    pub async fn connect(
        use_tls: bool,
        system: &str,
        user: &str,
        password: &str,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let signon = SignonConnection::connect(use_tls, system, user, password, options).await?;
        let system_info = signon.close().await?;

        Self::create_connection(use_tls, system_info, user, password, options).await
    }

    /// Open the database server connection and run the handshake,
    /// using already-discovered system metadata.
    pub async fn create_connection(
        use_tls: bool,
        system_info: SystemInfo,
        user: &str,
        password: &str,
        options: &ConnectOptions,
    ) -> Result<Self> {
        let port = options.database_port(use_tls);
        let tls = if use_tls { Some(&options.tls) } else { None };
        let mut connection =
            HostServerConnection::connect(&system_info.system, port, tls).await?;

        let job_name = handshake::initial_connect(
            &mut connection,
            DATABASE_SERVER_ID,
            system_info.password_level,
            user,
            password,
            options.unknown_return_code,
        )
        .await?;

        let compress = !is_loopback(&system_info.system);
        tracing::info!(job = %job_name, system = %system_info.system, "database server job started");

        Ok(Self {
            connection,
            system_info,
            job_name,
            user: user.to_string(),
            correlation: CorrelationCounter::new(),
            compress,
        })
    }

    /// Negotiate server attributes for the session's job.
    ///
    /// Only attributes present in `attributes` are sent; the reply is
    /// validated and drained.
    pub async fn set_server_attributes(&mut self, attributes: &ServerAttributes) -> Result<()> {
        let (entries, count) = attributes.encode()?;
        let total = HEADER_SIZE + ATTRIBUTE_TEMPLATE_SIZE + entries.len() as u32;

        let mut buf = RequestBuffer::with_capacity(total as usize);
        write_envelope(&mut buf, total, REQ_SET_ATTRIBUTES, &mut self.correlation);
        // Operational result (ORS) bitmap - return data + server attributes (no RLE compression).
        buf.write_i32(-2130706432);
        buf.write_u32(0); // Reserved.
        buf.write_u16(0); // Return ORS handle - after operation completes.
        buf.write_u16(0); // Fill ORS handle.
        buf.write_u16(0); // Based on ORS handle.
        buf.write_u16(0); // Request parameter block (RPB) handle.
        buf.write_u16(0); // Parameter marker descriptor handle.
        buf.write_u16(count); // Parameter count.
        buf.write_bytes(&entries);

        self.connection.write_all(&buf.freeze()).await?;
        self.connection.flush().await?;

        let length = self.connection.read_u32().await?;
        if length < 20 {
            return Err(DbHostError::Framing {
                context: "set server attributes",
                length,
            });
        }
        self.connection.skip(16).await?;
        let code = self.connection.read_u32().await?;
        if code != 0 {
            tracing::warn!("set server attributes returned nonzero code {code:#010X}");
        }
        self.connection.skip((length as usize).saturating_sub(24)).await?;

        tracing::debug!(count, "server attributes negotiated");
        Ok(())
    }

    /// The name of the server job hosting this session.
    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    /// The user this session authenticated as.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Metadata discovered during signon.
    pub fn system_info(&self) -> &SystemInfo {
        &self.system_info
    }

    /// Whether reply compression may be negotiated for this session.
    /// Loopback connections never compress.
    pub fn compression_eligible(&self) -> bool {
        self.compress
    }

    /// Close the session's connection.
    pub async fn close(mut self) -> Result<()> {
        self.connection.shutdown().await
    }
}

fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

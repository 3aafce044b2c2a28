//! Socket transport for host server connections.
//!
//! A [`HostServerConnection`] exclusively owns one TCP connection to a
//! host server, optionally wrapped in TLS, and exposes the big-endian
//! primitives the protocol layer parses with. Requests are buffered and
//! pushed out by an explicit [`flush`](HostServerConnection::flush), so
//! each round trip is a single write-flush-await sequence.
//!
//! Timeouts and cancellation are the caller's concern; this layer
//! performs no retries and propagates I/O errors unchanged.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufStream, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::config::TlsOptions;
use crate::error::{DbHostError, Result};

/// An owned, buffered connection to a host server.
#[derive(Debug)]
pub struct HostServerConnection {
    stream: HostStream,
    peer: String,
}

impl HostServerConnection {
    /// Open a connection to `host:port`, wrapping it in TLS when `tls`
    /// is given.
    pub async fn connect(host: &str, port: u16, tls: Option<&TlsOptions>) -> Result<Self> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;

        let stream = match tls {
            None => HostStream::Plain(BufStream::new(tcp)),
            Some(options) => {
                let connector = tls_connector(options)?;
                let name = rustls::ServerName::try_from(host)
                    .map_err(|e| DbHostError::Tls(format!("invalid server name {host:?}: {e}")))?;
                let tls_stream = connector.connect(name, tcp).await?;
                HostStream::Tls(Box::new(BufStream::new(tls_stream)))
            }
        };

        tracing::debug!(host, port, tls = tls.is_some(), "connected to host server");
        Ok(Self {
            stream,
            peer: format!("{host}:{port}"),
        })
    }

    /// Queue bytes for sending.
    pub async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Push queued bytes to the socket.
    pub async fn flush(&mut self) -> Result<()> {
        self.stream.flush().await?;
        Ok(())
    }

    /// Read a big-endian 32-bit value.
    pub async fn read_u32(&mut self) -> Result<u32> {
        Ok(self.stream.read_u32().await?)
    }

    /// Read a big-endian 16-bit value.
    pub async fn read_u16(&mut self) -> Result<u16> {
        Ok(self.stream.read_u16().await?)
    }

    /// Fill `buf` completely from the stream.
    pub async fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        self.stream.read_exact(buf).await?;
        Ok(())
    }

    /// Read exactly `n` bytes into a fresh buffer.
    pub async fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.stream.read_exact(&mut buf).await?;
        Ok(buf)
    }

    /// Discard exactly `n` bytes from the stream.
    pub async fn skip(&mut self, mut n: usize) -> Result<()> {
        let mut scratch = [0u8; 256];
        while n > 0 {
            let take = n.min(scratch.len());
            self.stream.read_exact(&mut scratch[..take]).await?;
            n -= take;
        }
        Ok(())
    }

    /// Close the connection.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// The `host:port` this connection was opened against.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

#[derive(Debug)]
enum HostStream {
    Plain(BufStream<TcpStream>),
    Tls(Box<BufStream<TlsStream<TcpStream>>>),
}

impl AsyncRead for HostStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HostStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HostStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HostStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            HostStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HostStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HostStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HostStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            HostStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HostStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

fn tls_connector(options: &TlsOptions) -> Result<TlsConnector> {
    let config = if options.accept_invalid_certs {
        rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(danger::NoVerification))
            .with_no_client_auth()
    } else {
        let path = options.ca_file.as_ref().ok_or_else(|| {
            DbHostError::Config(
                "TLS requires tls.ca_file, or tls.accept_invalid_certs for lab systems"
                    .to_string(),
            )
        })?;
        let pem = std::fs::read(path)?;
        let mut roots = rustls::RootCertStore::empty();
        let certs = rustls_pemfile::certs(&mut pem.as_slice())
            .map_err(|e| DbHostError::Tls(format!("failed to parse CA bundle: {e}")))?;
        for der in certs {
            roots.add(&rustls::Certificate(der))?;
        }
        rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    Ok(TlsConnector::from(Arc::new(config)))
}

mod danger {
    use std::time::SystemTime;

    use rustls::client::{ServerCertVerified, ServerCertVerifier};
    use rustls::{Certificate, ServerName};

    /// Certificate verifier that accepts anything. Lab systems only.
    pub(super) struct NoVerification;

    impl ServerCertVerifier for NoVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &Certificate,
            _intermediates: &[Certificate],
            _server_name: &ServerName,
            _scts: &mut dyn Iterator<Item = &[u8]>,
            _ocsp_response: &[u8],
            _now: SystemTime,
        ) -> std::result::Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_primitives_against_scripted_peer() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4];
            socket.read_exact(&mut request).await.unwrap();
            assert_eq!(request, 28u32.to_be_bytes());

            socket
                .write_all(&[0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02, 0x00, 0x10])
                .await
                .unwrap();
            socket.flush().await.unwrap();
        });

        let mut connection = HostServerConnection::connect("127.0.0.1", port, None)
            .await
            .unwrap();
        connection.write_all(&28u32.to_be_bytes()).await.unwrap();
        connection.flush().await.unwrap();

        connection.skip(4).await.unwrap();
        assert_eq!(connection.read_u16().await.unwrap(), 0x0102);
        assert_eq!(connection.read_u16().await.unwrap(), 0x0010);

        server.await.unwrap();
    }

    #[test]
    fn test_tls_requires_trust_configuration() {
        let options = TlsOptions::default();
        assert!(matches!(
            tls_connector(&options),
            Err(DbHostError::Config(_))
        ));
    }
}

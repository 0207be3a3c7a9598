//! Byte stream under an SMTP session.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Reads one line, without its line ending.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] at end of stream, or the I/O error.
    pub async fn read_line(&mut self) -> Result<String> {
        match self {
            Self::Tcp(reader) => read_trimmed_line(reader).await,
            Self::Tls(reader) => read_trimmed_line(reader.as_mut()).await,
        }
    }

    /// Writes and flushes `data`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                let inner = reader.get_mut();
                inner.write_all(data).await?;
                inner.flush().await?;
            }
            Self::Tls(reader) => {
                let inner = reader.get_mut();
                inner.write_all(data).await?;
                inner.flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a TCP stream to TLS after a successful STARTTLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("already using TLS".into())),
        };
        handshake(hostname, tcp).await
    }
}

async fn read_trimmed_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Err(Error::ConnectionClosed);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Connects to an SMTP server over plain TCP (port 25, or 587 before STARTTLS).
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let tcp = TcpStream::connect((hostname, port)).await?;
    Ok(SmtpStream::Tcp(BufReader::new(tcp)))
}

/// Connects to an SMTP server over implicit TLS (port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpStream> {
    let tcp = TcpStream::connect((hostname, port)).await?;
    handshake(hostname, tcp).await
}

async fn handshake(hostname: &str, tcp: TcpStream) -> Result<SmtpStream> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("invalid hostname: {hostname}")))?;
    let tls = tls_connector().connect(server_name, tcp).await?;
    Ok(SmtpStream::Tls(Box::new(BufReader::new(tls))))
}

/// TLS connector trusting the Mozilla root set.
fn tls_connector() -> TlsConnector {
    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn strips_line_endings() {
        let mock = Builder::new().read(b"250-mail.example.com\r\n250 OK\n").build();
        let mut reader = BufReader::new(mock);

        assert_eq!(read_trimmed_line(&mut reader).await.unwrap(), "250-mail.example.com");
        assert_eq!(read_trimmed_line(&mut reader).await.unwrap(), "250 OK");
    }

    #[tokio::test]
    async fn joins_split_reads() {
        let mock = Builder::new().read(b"220 mail.exa").read(b"mple.com ESMTP\r\n").build();
        let mut reader = BufReader::new(mock);

        assert_eq!(
            read_trimmed_line(&mut reader).await.unwrap(),
            "220 mail.example.com ESMTP"
        );
    }

    #[tokio::test]
    async fn end_of_stream_is_connection_closed() {
        let mock = Builder::new().build();
        let mut reader = BufReader::new(mock);

        assert!(matches!(
            read_trimmed_line(&mut reader).await,
            Err(Error::ConnectionClosed)
        ));
    }
}

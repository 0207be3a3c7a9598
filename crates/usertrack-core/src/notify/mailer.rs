//! Message delivery.

use std::fmt::Write;
use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use tracing::debug;
use usertrack_smtp::connection::{connect, connect_tls};
use usertrack_smtp::{Address, Client};

use super::settings::{Credentials, Relay, Security};
use crate::store::NewUser;

/// UTF-8 bytes per encoded word, keeping each word within 75 characters.
const ENCODED_WORD_BYTES: usize = 45;

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// Connection or TLS setup failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Send failed.
    #[error("Send failed: {0}")]
    Send(String),

    /// Invalid address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// The relay did not finish within the configured bound.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// A single plain-text message to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Sender address.
    pub from: String,
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl Notification {
    /// The "new user added" message.
    #[must_use]
    pub fn new_user(user: &NewUser, from: impl Into<String>, to: impl Into<String>) -> Self {
        let who = match &user.email {
            Some(email) => format!("{} <{email}>", user.name),
            None => user.name.clone(),
        };
        Self {
            from: from.into(),
            to: to.into(),
            subject: format!("New user added: {}", user.name),
            body: format!("{who} was added to the database."),
        }
    }

    /// Builds the RFC 5322 formatted message.
    ///
    /// Header values are flattened to one logical line and non-ASCII text is
    /// RFC 2047 encoded; the body is sent as 8-bit UTF-8.
    #[must_use]
    pub fn to_rfc5322(&self) -> String {
        let mut message = String::new();

        let _ = write!(message, "From: {}\r\n", header_value(&self.from));
        let _ = write!(message, "To: {}\r\n", header_value(&self.to));
        let _ = write!(message, "Subject: {}\r\n", header_value(&self.subject));
        let _ = write!(message, "Date: {}\r\n", Utc::now().to_rfc2822());
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("Content-Transfer-Encoding: 8bit\r\n");
        message.push_str("\r\n");
        message.push_str(&self.body);
        message.push_str("\r\n");

        message
    }
}

/// Replaces control characters (CR and LF included) with spaces and encodes
/// non-ASCII text as folded `=?utf-8?B?...?=` words.
fn header_value(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.is_ascii() {
        return flat;
    }

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in flat.chars() {
        if chunk.len() + c.len_utf8() > ENCODED_WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

fn encoded_word(text: &str) -> String {
    format!("=?utf-8?B?{}?=", BASE64.encode(text))
}

/// Something that can deliver a [`Notification`].
pub trait Mailer {
    /// Delivers one message, authenticating with `credentials`.
    fn send(
        &self,
        credentials: &Credentials,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Delivers through an SMTP relay.
#[derive(Debug, Clone, Default)]
pub struct SmtpMailer {
    relay: Relay,
}

impl SmtpMailer {
    /// Creates a mailer for `relay`.
    #[must_use]
    pub const fn new(relay: Relay) -> Self {
        Self { relay }
    }

    async fn deliver(
        &self,
        credentials: &Credentials,
        notification: &Notification,
    ) -> Result<(), MailError> {
        let relay = &self.relay;
        let from =
            Address::new(&notification.from).map_err(|e| MailError::InvalidAddress(e.to_string()))?;
        let to =
            Address::new(&notification.to).map_err(|e| MailError::InvalidAddress(e.to_string()))?;

        let stream = match relay.security {
            Security::Tls => connect_tls(&relay.host, relay.port).await,
            Security::StartTls | Security::None => connect(&relay.host, relay.port).await,
        }
        .map_err(|e| MailError::Connection(e.to_string()))?;
        debug!(host = %relay.host, port = relay.port, "connected to relay");

        let client = Client::from_stream(stream)
            .await
            .map_err(|e| MailError::Connection(e.to_string()))?;
        let client = client
            .ehlo("localhost")
            .await
            .map_err(|e| MailError::Connection(e.to_string()))?;
        let client = if relay.security == Security::StartTls {
            client
                .starttls(&relay.host)
                .await
                .map_err(|e| MailError::Connection(e.to_string()))?
        } else {
            client
        };

        let client = client
            .authenticate(credentials.username(), credentials.password())
            .await
            .map_err(|e| MailError::Authentication(e.to_string()))?;

        let message = notification.to_rfc5322();
        if let Some(max) = client.server_info().max_message_size()
            && message.len() > max
        {
            return Err(MailError::Send(format!(
                "message is {} bytes, relay accepts at most {max}",
                message.len()
            )));
        }

        let client = client
            .mail_from(from)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;
        let client = client
            .rcpt_to(to)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;
        let client = client
            .data()
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;
        let client = client
            .send_message(message.as_bytes())
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        // The message is accepted at this point; a failed QUIT changes nothing.
        if let Err(e) = client.quit().await {
            debug!(error = %e, "QUIT after delivery failed");
        }
        Ok(())
    }
}

impl Mailer for SmtpMailer {
    async fn send(
        &self,
        credentials: &Credentials,
        notification: &Notification,
    ) -> Result<(), MailError> {
        tokio::time::timeout(self.relay.timeout, self.deliver(credentials, notification))
            .await
            .map_err(|_| MailError::Timeout(self.relay.timeout))?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_user_message_mentions_name() {
        let user = NewUser::new("Ada Lovelace");
        let n = Notification::new_user(&user, "alerts@example.com", "ops@example.com");
        assert_eq!(n.subject, "New user added: Ada Lovelace");
        assert_eq!(n.body, "Ada Lovelace was added to the database.");
    }

    #[test]
    fn new_user_message_includes_email_when_known() {
        let user = NewUser::new("Jane Doe").with_email(Some("jane@example.com"));
        let n = Notification::new_user(&user, "alerts@example.com", "ops@example.com");
        assert_eq!(n.body, "Jane Doe <jane@example.com> was added to the database.");
    }

    #[test]
    fn rfc5322_has_headers_then_body() {
        let user = NewUser::new("Ada Lovelace");
        let text = Notification::new_user(&user, "alerts@example.com", "ops@example.com")
            .to_rfc5322();
        let (headers, body) = text.split_once("\r\n\r\n").unwrap();
        assert!(headers.starts_with("From: alerts@example.com\r\nTo: ops@example.com\r\n"));
        assert!(headers.contains("Subject: New user added: Ada Lovelace"));
        assert!(headers.contains("Date: "));
        assert_eq!(body, "Ada Lovelace was added to the database.\r\n");
    }

    #[test]
    fn line_breaks_cannot_add_headers() {
        let n = Notification {
            from: "alerts@example.com".into(),
            to: "ops@example.com".into(),
            subject: "New user added: Eve\r\nBcc: victim@example.com\r\n\r\nforged body".into(),
            body: "Eve was added to the database.".into(),
        };
        let text = n.to_rfc5322();
        let (headers, body) = text.split_once("\r\n\r\n").unwrap();

        assert!(!headers.lines().any(|l| l.starts_with("Bcc:")));
        assert!(headers.contains("Subject: New user added: Eve  Bcc: victim@example.com    forged body\r\n"));
        assert_eq!(body, "Eve was added to the database.\r\n");
    }

    #[test]
    fn non_ascii_subject_is_encoded() {
        let user = NewUser::new("Adé Ọlábísí");
        let text = Notification::new_user(&user, "alerts@example.com", "ops@example.com")
            .to_rfc5322();
        let (headers, body) = text.split_once("\r\n\r\n").unwrap();

        assert!(headers.is_ascii());
        let expected = format!(
            "Subject: =?utf-8?B?{}?=\r\n",
            BASE64.encode("New user added: Adé Ọlábísí")
        );
        assert!(headers.contains(&expected), "{headers}");
        assert_eq!(body, "Adé Ọlábísí was added to the database.\r\n");
    }

    #[test]
    fn long_non_ascii_values_are_split_into_words() {
        let value = header_value(&"é".repeat(60));
        let words: Vec<&str> = value.split("\r\n ").collect();

        assert_eq!(words.len(), 3);
        for word in &words {
            assert!(word.starts_with("=?utf-8?B?") && word.ends_with("?="));
            assert!(word.len() <= 75, "{word}");
        }
        let decoded: String = words
            .iter()
            .map(|w| {
                let inner = &w["=?utf-8?B?".len()..w.len() - 2];
                String::from_utf8(BASE64.decode(inner).unwrap()).unwrap()
            })
            .collect();
        assert_eq!(decoded, "é".repeat(60));
    }

    #[test]
    fn ascii_header_value_is_unchanged() {
        assert_eq!(header_value("New user added: Ada Lovelace"), "New user added: Ada Lovelace");
    }

    #[tokio::test]
    async fn unreachable_relay_is_connection_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mailer = SmtpMailer::new(Relay {
            host: "127.0.0.1".into(),
            port,
            security: Security::None,
            timeout: Duration::from_secs(5),
        });
        let creds = Credentials::new("alerts@example.com", "secret").unwrap();
        let n = Notification::new_user(&NewUser::new("Ada"), "alerts@example.com", "ops@example.com");

        let err = mailer.send(&creds, &n).await.unwrap_err();
        assert!(matches!(err, MailError::Connection(_)), "{err:?}");
    }

    #[tokio::test]
    async fn bad_recipient_fails_before_connecting() {
        let mailer = SmtpMailer::default();
        let creds = Credentials::new("alerts@example.com", "secret").unwrap();
        let n = Notification::new_user(&NewUser::new("Ada"), "alerts@example.com", "not-an-address");

        let err = mailer.send(&creds, &n).await.unwrap_err();
        assert!(matches!(err, MailError::InvalidAddress(_)));
    }
}

//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::address::Address;
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::extension::{AuthMechanism, Extension};
use crate::reply::{Reply, ReplyCode, is_last_line};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Greeted, not yet authenticated.
#[derive(Debug)]
pub struct Connected;

/// Authenticated session.
#[derive(Debug)]
pub struct Authenticated;

/// `MAIL FROM` accepted.
#[derive(Debug)]
pub struct MailTransaction;

/// `RCPT TO` accepted.
#[derive(Debug)]
pub struct RecipientAdded;

/// `DATA` accepted, server waits for the message.
#[derive(Debug)]
pub struct Data;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Connected {}
    impl Sealed for super::Authenticated {}
}

/// States from which a mail transaction may start.
pub trait MailReady: sealed::Sealed {}
impl MailReady for Connected {}
impl MailReady for Authenticated {}

/// SMTP client; `State` tracks where the session is in the protocol.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    helo_name: String,
    _state: PhantomData<State>,
}

impl<S> Client<S> {
    /// Returns what the server advertised.
    #[must_use]
    pub const fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            helo_name: self.helo_name,
            _state: PhantomData,
        }
    }

    async fn command(&mut self, cmd: Command) -> Result<Reply> {
        debug!(command = %cmd.redacted(), "smtp >");
        self.stream.write_all(&cmd.serialize()).await?;
        read_reply(&mut self.stream).await
    }

    /// Sends QUIT and closes the session (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not acknowledge.
    pub async fn quit(mut self) -> Result<()> {
        self.command(Command::Quit).await?.expect_success()?;
        Ok(())
    }
}

async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }
        let last = is_last_line(&line);
        lines.push(line);
        if last {
            break;
        }
    }
    let reply = Reply::parse(&lines)?;
    trace!(code = %reply.code, text = %reply.text(), "smtp <");
    Ok(reply)
}

fn capabilities(reply: &Reply) -> HashSet<Extension> {
    // First line is the server's name; capabilities follow.
    reply
        .lines
        .iter()
        .skip(1)
        .map(|line| Extension::parse(line))
        .collect()
}

impl Client<Connected> {
    /// Wraps a fresh stream and consumes the 220 greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting is missing or is not 220.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream)
            .await?
            .expect(ReplyCode::SERVICE_READY)?;

        let hostname = greeting
            .lines
            .first()
            .and_then(|line| line.split_whitespace().next())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
            },
            helo_name: "localhost".to_string(),
            _state: PhantomData,
        })
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects EHLO.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        self.helo_name = client_hostname.to_string();
        let reply = self
            .command(Command::Ehlo {
                hostname: client_hostname.to_string(),
            })
            .await?
            .expect_success()?;
        self.server_info.extensions = capabilities(&reply);
        Ok(self)
    }

    /// Upgrades the session with STARTTLS and repeats EHLO over TLS.
    ///
    /// `hostname` is the server name the certificate must match.
    ///
    /// # Errors
    ///
    /// Returns an error if STARTTLS is not offered, is refused, or the
    /// handshake fails.
    pub async fn starttls(mut self, hostname: &str) -> Result<Self> {
        if !self.server_info.supports_starttls() {
            return Err(Error::NotSupported("STARTTLS".into()));
        }
        self.command(Command::StartTls).await?.expect_success()?;

        self.stream = self.stream.upgrade_to_tls(hostname).await?;
        // Capabilities learned before TLS must be discarded (RFC 3207 §4.2).
        self.server_info.extensions.clear();
        let helo_name = self.helo_name.clone();
        self.ehlo(&helo_name).await
    }

    /// Authenticates with the best mechanism the server offers: PLAIN, then LOGIN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if neither mechanism is advertised, or
    /// the server's rejection.
    pub async fn authenticate(
        self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let offered = self.server_info.auth_mechanisms();
        if offered.contains(&AuthMechanism::Plain) {
            self.auth_plain(username, password).await
        } else if offered.contains(&AuthMechanism::Login) {
            self.auth_login(username, password).await
        } else {
            Err(Error::NotSupported("AUTH PLAIN or LOGIN".into()))
        }
    }

    /// Authenticates using PLAIN with an initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        let token = BASE64.encode(format!("\0{username}\0{password}"));
        self.command(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(token),
        })
        .await?
        .expect_success()?;
        Ok(self.into_state())
    }

    /// Authenticates using LOGIN (two 334 challenges).
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        self.command(Command::Auth {
            mechanism: AuthMechanism::Login,
            initial_response: None,
        })
        .await?
        .expect(ReplyCode::AUTH_CONTINUE)?;
        self.command(Command::AuthResponse(BASE64.encode(username)))
            .await?
            .expect(ReplyCode::AUTH_CONTINUE)?;
        self.command(Command::AuthResponse(BASE64.encode(password)))
            .await?
            .expect_success()?;
        Ok(self.into_state())
    }
}

impl<S: MailReady> Client<S> {
    /// Starts a mail transaction, declaring an 8-bit body when the server
    /// advertises 8BITMIME.
    ///
    /// # Errors
    ///
    /// Returns an error if MAIL FROM is rejected.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        let eight_bit_mime = self.server_info.supports_8bitmime();
        self.command(Command::MailFrom {
            from,
            eight_bit_mime,
        })
        .await?
        .expect_success()?;
        Ok(self.into_state())
    }
}

impl Client<MailTransaction> {
    /// Adds the recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if RCPT TO is rejected.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.command(Command::RcptTo { to }).await?.expect_success()?;
        Ok(self.into_state())
    }
}

impl Client<RecipientAdded> {
    /// Asks to start the message body.
    ///
    /// # Errors
    ///
    /// Returns an error unless the server answers 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.command(Command::Data)
            .await?
            .expect(ReplyCode::START_DATA)?;
        Ok(self.into_state())
    }
}

impl Client<Data> {
    /// Sends an RFC 5322 message and completes the transaction.
    ///
    /// Line endings are normalized and leading dots stuffed; the terminating
    /// `.` line is added here.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let payload = encode_data(message);
        debug!(bytes = payload.len(), "smtp > message body");
        self.stream.write_all(&payload).await?;
        read_reply(&mut self.stream).await?.expect_success()?;
        Ok(self.into_state())
    }
}

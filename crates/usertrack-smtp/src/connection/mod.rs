//! SMTP sessions with type-state transitions.

mod client;
mod stream;

pub use client::{
    Authenticated, Client, Connected, Data, MailReady, MailTransaction, RecipientAdded,
};
pub use stream::{SmtpStream, connect, connect_tls};

use crate::extension::{AuthMechanism, Extension};
use std::collections::HashSet;

/// What the server told us about itself.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Server hostname from the greeting.
    pub hostname: String,
    /// Extensions from the most recent EHLO.
    pub extensions: HashSet<Extension>,
}

impl ServerInfo {
    /// Checks if STARTTLS is offered.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.extensions.contains(&Extension::StartTls)
    }

    /// Checks if 8-bit message bodies are accepted.
    #[must_use]
    pub fn supports_8bitmime(&self) -> bool {
        self.extensions.contains(&Extension::EightBitMime)
    }

    /// Returns the advertised SASL mechanisms this client can use.
    #[must_use]
    pub fn auth_mechanisms(&self) -> Vec<AuthMechanism> {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Returns the maximum message size, if advertised. `SIZE 0` means no
    /// fixed limit (RFC 1870).
    #[must_use]
    pub fn max_message_size(&self) -> Option<usize> {
        self.extensions.iter().find_map(|ext| match ext {
            Extension::Size(size) => size.filter(|&max| max > 0),
            _ => None,
        })
    }
}

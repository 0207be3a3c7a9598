//! Notifier configuration, resolved once at startup.

use std::fmt;
use std::time::Duration;

/// Environment variable holding the sender address.
pub const SMTP_USER_VAR: &str = "SMTP_USER";
/// Environment variable holding the sender secret.
pub const SMTP_PASS_VAR: &str = "SMTP_PASS";
/// Environment variable overriding the recipient.
pub const ALERT_TO_VAR: &str = "ALERT_TO";

/// Default submission relay.
pub const DEFAULT_RELAY_HOST: &str = "smtp.gmail.com";
/// Default submission port (STARTTLS).
pub const DEFAULT_RELAY_PORT: u16 = 587;
/// Default bound on a whole delivery attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Sender address and secret used to authenticate to the relay.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials; `None` unless both values are non-empty.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Option<Self> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return None;
        }
        Some(Self { username, password })
    }

    /// Sender address, also used as the login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Sender secret.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Security/encryption mode for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption. Only meant for a relay on localhost.
    None,
    /// Implicit TLS (connect directly with TLS).
    Tls,
    /// STARTTLS upgrade after plaintext connect.
    #[default]
    StartTls,
}

/// Where notifications are submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Upper bound for connect, handshake and submission together.
    pub timeout: Duration,
}

impl Default for Relay {
    fn default() -> Self {
        Self {
            host: DEFAULT_RELAY_HOST.to_string(),
            port: DEFAULT_RELAY_PORT,
            security: Security::StartTls,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Everything the notifier needs besides the user.
#[derive(Debug, Clone, Default)]
pub struct NotifierSettings {
    /// Sender credentials, if configured.
    pub credentials: Option<Credentials>,
    /// Explicit recipient; defaults to the sender.
    pub recipient: Option<String>,
    /// Relay to submit through.
    pub relay: Relay,
}

impl NotifierSettings {
    /// Reads `SMTP_USER`, `SMTP_PASS` and `ALERT_TO` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let credentials = match (lookup(SMTP_USER_VAR), lookup(SMTP_PASS_VAR)) {
            (Some(user), Some(pass)) => Credentials::new(user, pass),
            _ => None,
        };
        let recipient = lookup(ALERT_TO_VAR)
            .map(|to| to.trim().to_string())
            .filter(|to| !to.is_empty());

        Self {
            credentials,
            recipient,
            relay: Relay::default(),
        }
    }

    /// Replaces the relay.
    #[must_use]
    pub fn with_relay(mut self, relay: Relay) -> Self {
        self.relay = relay;
        self
    }

    /// True when both sender address and secret are set.
    #[must_use]
    pub const fn credentials_present(&self) -> bool {
        self.credentials.is_some()
    }

    /// The address notifications go to: `ALERT_TO`, else the sender.
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        self.recipient
            .as_deref()
            .or_else(|| self.credentials.as_ref().map(Credentials::username))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> NotifierSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        NotifierSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn both_values_make_credentials() {
        let s = settings(&[
            ("SMTP_USER", "alerts@example.com"),
            ("SMTP_PASS", "app-password"),
        ]);
        assert!(s.credentials_present());
        assert_eq!(s.recipient(), Some("alerts@example.com"));
    }

    #[test]
    fn partial_or_empty_values_are_absent() {
        for vars in [
            &[("SMTP_USER", "alerts@example.com")][..],
            &[("SMTP_PASS", "app-password")][..],
            &[("SMTP_USER", ""), ("SMTP_PASS", "app-password")][..],
            &[("SMTP_USER", "alerts@example.com"), ("SMTP_PASS", "")][..],
            &[][..],
        ] {
            let s = settings(vars);
            assert!(!s.credentials_present(), "{vars:?}");
            assert_eq!(s.recipient(), None);
        }
    }

    #[test]
    fn alert_to_overrides_recipient() {
        let s = settings(&[
            ("SMTP_USER", "alerts@example.com"),
            ("SMTP_PASS", "app-password"),
            ("ALERT_TO", "ops@example.com"),
        ]);
        assert_eq!(s.recipient(), Some("ops@example.com"));
    }

    #[test]
    fn default_relay_is_gmail_starttls() {
        let relay = Relay::default();
        assert_eq!(relay.host, "smtp.gmail.com");
        assert_eq!(relay.port, 587);
        assert_eq!(relay.security, Security::StartTls);
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("alerts@example.com", "hunter2").unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("alerts@example.com"));
        assert!(!shown.contains("hunter2"));
    }
}

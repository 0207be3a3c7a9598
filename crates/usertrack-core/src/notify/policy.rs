//! The notify-mode decision.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Whether to email an operator when a user is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyMode {
    /// Send only when credentials are configured.
    #[default]
    Auto,
    /// Always send; missing credentials are a configuration error.
    On,
    /// Never send.
    Off,
}

impl NotifyMode {
    /// Returns the mode as written on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized notify mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid notify mode {0:?} (expected auto, on or off)")]
pub struct ParseNotifyModeError(String);

impl FromStr for NotifyMode {
    type Err = ParseNotifyModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            _ => Err(ParseNotifyModeError(s.to_string())),
        }
    }
}

/// Why no notification was attempted for a new user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The mode was `off`.
    SuppressedByFlag,
    /// The mode was `auto` and the sender address or secret is missing.
    CredentialsNotConfigured,
}

impl SkipReason {
    /// Short explanation for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuppressedByFlag => "suppressed by flag",
            Self::CredentialsNotConfigured => "credentials not configured",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Attempt delivery.
    Send {
        /// Short explanation for logs.
        reason: &'static str,
    },
    /// Do not attempt delivery.
    Skip(SkipReason),
}

impl Decision {
    /// Whether a send should be attempted.
    #[must_use]
    pub const fn should_send(self) -> bool {
        matches!(self, Self::Send { .. })
    }

    /// Short explanation for logs.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Send { reason } => reason,
            Self::Skip(reason) => reason.as_str(),
        }
    }
}

/// Decides whether to send, given the mode and whether both the sender
/// address and secret are configured.
///
/// # Errors
///
/// Returns [`Error::Config`] for [`NotifyMode::On`] without credentials.
pub fn decide(mode: NotifyMode, credentials_present: bool) -> Result<Decision> {
    let decision = match (mode, credentials_present) {
        (NotifyMode::Off, _) => Decision::Skip(SkipReason::SuppressedByFlag),
        (NotifyMode::On, true) => Decision::Send {
            reason: "forced by flag",
        },
        (NotifyMode::On, false) => {
            return Err(Error::Config(
                "SMTP credentials required when notify mode is 'on'".into(),
            ));
        }
        (NotifyMode::Auto, true) => Decision::Send {
            reason: "credentials present",
        },
        (NotifyMode::Auto, false) => Decision::Skip(SkipReason::CredentialsNotConfigured),
    };
    Ok(decision)
}

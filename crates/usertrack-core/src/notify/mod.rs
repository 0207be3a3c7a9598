//! New-user notifications.
//!
//! [`decide`] applies the notify mode, [`Notifier`] turns a decision into a
//! delivery attempt through a [`Mailer`], and [`NotifierSettings`] carries the
//! credentials and relay read once at startup.

mod mailer;
mod notifier;
mod policy;
mod settings;

pub use mailer::{MailError, Mailer, Notification, SmtpMailer};
pub use notifier::{Notifier, NotifyOutcome};
pub use policy::{Decision, NotifyMode, ParseNotifyModeError, SkipReason, decide};
pub use settings::{Credentials, NotifierSettings, Relay, Security};

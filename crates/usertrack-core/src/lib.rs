//! # usertrack-core
//!
//! Core logic for `usertrack`:
//! - **Store** - `SQLite` table of known users, unique by name
//! - **Notify policy** - the `auto` / `on` / `off` decision
//! - **Notifier** - best-effort email to an operator when a user is added
//! - **Registration** - the add-then-maybe-notify flow tying them together

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod notify;
pub mod registration;
pub mod store;

pub use error::{Error, Result};
pub use notify::{
    Credentials, Decision, MailError, Mailer, NotifierSettings, Notification, Notifier,
    NotifyMode, NotifyOutcome, Relay, Security, SkipReason, SmtpMailer, decide,
};
pub use registration::{Registration, register};
pub use store::{NewUser, User, UserStore};

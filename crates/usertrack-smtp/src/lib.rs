//! # usertrack-smtp
//!
//! A small SMTP submission client (RFC 5321) used to deliver usertrack
//! notifications.
//!
//! ## Features
//!
//! - **Type-state sessions**: a message can only be submitted after
//!   `MAIL FROM` and at least one `RCPT TO`
//! - **TLS**: implicit TLS (port 465) and STARTTLS (port 587) via rustls
//! - **Authentication**: PLAIN and LOGIN
//!
//! ## Quick Start
//!
//! ```ignore
//! use usertrack_smtp::{Address, Client};
//! use usertrack_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> usertrack_smtp::Result<()> {
//!     let stream = connect("smtp.example.com", 587).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.ehlo("localhost").await?;
//!     let client = client.starttls("smtp.example.com").await?;
//!     let client = client.authenticate("user@example.com", "secret").await?;
//!
//!     let client = client.mail_from(Address::new("user@example.com")?).await?;
//!     let client = client.rcpt_to(Address::new("ops@example.com")?).await?;
//!     let client = client.data().await?;
//!     let client = client.send_message(b"Subject: Hi\r\n\r\nHello\r\n").await?;
//!     client.quit().await
//! }
//! ```
//!
//! ## Session States
//!
//! ```text
//! Connected ── authenticate() ──→ Authenticated
//!     │                                │
//!     └──────────── mail_from() ───────┴──→ MailTransaction
//!                                              │ rcpt_to()
//!                                              ▼
//!                       Connected ←── send_message() ── Data ←── data() ── RecipientAdded
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
pub mod command;
pub mod connection;
mod error;
mod extension;
pub mod reply;

pub use address::Address;
pub use connection::{
    Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo,
};
pub use error::{Error, Result};
pub use extension::{AuthMechanism, Extension};
pub use reply::{Reply, ReplyCode};

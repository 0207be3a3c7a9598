//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use usertrack_core::{NewUser, NotifyMode};

/// Add a user to the local store and optionally email a notification.
///
/// SMTP credentials come from `SMTP_USER` and `SMTP_PASS` (a `.env` file in
/// the working directory is honoured); `ALERT_TO` overrides the recipient.
#[derive(Debug, Parser)]
#[command(name = "usertrack", version, about)]
pub struct Args {
    /// Full name of user to add
    #[arg(long)]
    pub name: String,

    /// Email notification mode: auto, on or off
    #[arg(long, value_name = "MODE", default_value_t = NotifyMode::Auto)]
    pub notify: NotifyMode,

    /// Path of the `SQLite` store
    #[arg(long, value_name = "PATH", default_value = "users.db")]
    pub db: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    /// Contact email of the user
    #[arg(long)]
    pub email: Option<String>,

    /// City of the user
    #[arg(long)]
    pub city: Option<String>,

    /// Country of the user
    #[arg(long)]
    pub country: Option<String>,

    /// Print every stored user afterwards
    #[arg(long)]
    pub list: bool,

    /// Print the listing as JSON lines
    #[arg(long, requires = "list")]
    pub json: bool,
}

impl Args {
    /// The user described by the arguments.
    pub fn new_user(&self) -> NewUser {
        NewUser::new(&self.name)
            .with_email(self.email.as_deref())
            .with_city(self.city.as_deref())
            .with_country(self.country.as_deref())
    }

    /// Log filter used when `RUST_LOG` is not set.
    pub const fn default_filter(&self) -> &'static str {
        if self.verbose {
            "usertrack=debug,usertrack_core=debug,usertrack_smtp=debug"
        } else {
            "usertrack=info,usertrack_core=info,usertrack_smtp=warn"
        }
    }
}

//! Add a user, then maybe notify.
//!
//! ```text
//! insert ──┬── 0 rows ──→ Duplicate
//!          └── 1 row ───→ policy ──┬── Skipped
//!                                  └── send ──┬── Sent
//!                                             └── Failed
//! ```

use tracing::info;

use crate::Result;
use crate::notify::{Mailer, Notifier, NotifyMode, NotifyOutcome};
use crate::store::{NewUser, UserStore};

/// Terminal state of one registration.
#[derive(Debug)]
pub enum Registration {
    /// A user with this name already existed; nothing was written or sent.
    Duplicate,
    /// The user was written.
    Inserted {
        /// What happened to the notification.
        notification: NotifyOutcome,
    },
}

impl Registration {
    /// Rows written by the insert (0 or 1).
    #[must_use]
    pub const fn rows_written(&self) -> u64 {
        match self {
            Self::Duplicate => 0,
            Self::Inserted { .. } => 1,
        }
    }

    /// True when a notification was delivered.
    #[must_use]
    pub const fn email_sent(&self) -> bool {
        match self {
            Self::Duplicate => false,
            Self::Inserted { notification } => notification.is_sent(),
        }
    }
}

/// Adds `user` to `store` and, for a new row only, runs the notifier.
///
/// The insert is committed before any notification is attempted, so a
/// delivery failure never undoes it.
///
/// # Errors
///
/// Storage errors, an invalid user, and the configuration error for
/// [`NotifyMode::On`] without credentials. Delivery failures are not errors.
pub async fn register<M: Mailer>(
    store: &mut UserStore,
    user: &NewUser,
    mode: NotifyMode,
    notifier: &Notifier<M>,
) -> Result<Registration> {
    let written = store.add_user(user).await?;
    if written == 0 {
        info!(
            name = %user.name,
            rows_written = 0,
            email_sent = false,
            "user already exists"
        );
        return Ok(Registration::Duplicate);
    }

    let notification = notifier.notify(mode, user).await?;
    match &notification {
        NotifyOutcome::Sent => info!(
            name = %user.name,
            rows_written = 1,
            email_sent = true,
            "added user"
        ),
        NotifyOutcome::Skipped(reason) => info!(
            name = %user.name,
            rows_written = 1,
            email_sent = false,
            reason = reason.as_str(),
            "added user"
        ),
        NotifyOutcome::Failed(e) => info!(
            name = %user.name,
            rows_written = 1,
            email_sent = false,
            error = %e,
            "added user"
        ),
    }

    Ok(Registration::Inserted { notification })
}

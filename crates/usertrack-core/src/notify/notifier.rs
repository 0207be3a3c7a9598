//! Policy plus delivery.

use tracing::{error, info};

use super::mailer::{MailError, Mailer, Notification};
use super::policy::{Decision, NotifyMode, SkipReason, decide};
use super::settings::NotifierSettings;
use crate::Result;
use crate::store::NewUser;

/// What happened to the notification for a newly added user.
#[derive(Debug)]
pub enum NotifyOutcome {
    /// The relay accepted the message.
    Sent,
    /// No attempt was made.
    Skipped(SkipReason),
    /// Delivery was attempted and failed. The user row is kept.
    Failed(MailError),
}

impl NotifyOutcome {
    /// True only for [`NotifyOutcome::Sent`].
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Sends "new user" notifications according to a [`NotifyMode`].
#[derive(Debug)]
pub struct Notifier<M> {
    settings: NotifierSettings,
    mailer: M,
}

impl<M: Mailer> Notifier<M> {
    /// Creates a notifier owning its settings and mailer.
    #[must_use]
    pub const fn new(settings: NotifierSettings, mailer: M) -> Self {
        Self { settings, mailer }
    }

    /// Returns the settings.
    #[must_use]
    pub const fn settings(&self) -> &NotifierSettings {
        &self.settings
    }

    /// Returns the mailer.
    #[must_use]
    pub const fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Applies the policy and, if it allows, attempts delivery.
    ///
    /// # Errors
    ///
    /// Only [`crate::Error::Config`] for [`NotifyMode::On`] without
    /// credentials. Delivery failures are reported as
    /// [`NotifyOutcome::Failed`].
    pub async fn notify(&self, mode: NotifyMode, user: &NewUser) -> Result<NotifyOutcome> {
        let reason = match decide(mode, self.settings.credentials_present())? {
            Decision::Send { reason } => reason,
            Decision::Skip(reason) => return Ok(NotifyOutcome::Skipped(reason)),
        };

        let (Some(credentials), Some(recipient)) =
            (self.settings.credentials.as_ref(), self.settings.recipient())
        else {
            return Ok(NotifyOutcome::Skipped(SkipReason::CredentialsNotConfigured));
        };

        let notification = Notification::new_user(user, credentials.username(), recipient);
        match self.mailer.send(credentials, &notification).await {
            Ok(()) => {
                info!(to = recipient, reason, "notification sent");
                Ok(NotifyOutcome::Sent)
            }
            Err(e) => {
                error!(to = recipient, error = %e, "email send failed");
                Ok(NotifyOutcome::Failed(e))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::notify::Credentials;
    use std::sync::Mutex;

    /// Records every send; fails when `fail` is set.
    #[derive(Default)]
    struct StubMailer {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl Mailer for StubMailer {
        async fn send(
            &self,
            _credentials: &Credentials,
            notification: &Notification,
        ) -> std::result::Result<(), MailError> {
            self.sent.lock().unwrap().push(notification.clone());
            if self.fail {
                Err(MailError::Connection("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn with_credentials() -> NotifierSettings {
        NotifierSettings {
            credentials: Credentials::new("alerts@example.com", "secret"),
            ..NotifierSettings::default()
        }
    }

    #[tokio::test]
    async fn sends_to_sender_by_default() {
        let notifier = Notifier::new(with_credentials(), StubMailer::default());

        let outcome = notifier
            .notify(NotifyMode::Auto, &NewUser::new("Ada Lovelace"))
            .await
            .unwrap();

        assert!(outcome.is_sent());
        let sent = notifier.mailer().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alerts@example.com");
    }

    #[tokio::test]
    async fn off_skips_even_with_credentials() {
        let notifier = Notifier::new(with_credentials(), StubMailer::default());

        let outcome = notifier
            .notify(NotifyMode::Off, &NewUser::new("Ada Lovelace"))
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            NotifyOutcome::Skipped(SkipReason::SuppressedByFlag)
        ));
        assert!(notifier.mailer().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_without_credentials_never_reaches_mailer() {
        let notifier = Notifier::new(NotifierSettings::default(), StubMailer::default());

        let err = notifier
            .notify(NotifyMode::On, &NewUser::new("Ada Lovelace"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(notifier.mailer().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_is_an_outcome() {
        let mailer = StubMailer {
            fail: true,
            ..StubMailer::default()
        };
        let notifier = Notifier::new(with_credentials(), mailer);

        let outcome = notifier
            .notify(NotifyMode::On, &NewUser::new("Ada Lovelace"))
            .await
            .unwrap();

        assert!(matches!(outcome, NotifyOutcome::Failed(MailError::Connection(_))));
    }
}

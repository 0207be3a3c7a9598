//! `usertrack` - add a user to the local store and tell an operator about it.
//!
//! Mail delivery problems are reported but never change the exit status;
//! storage and configuration errors do.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use usertrack_core::{
    NotifierSettings, Notifier, NotifyOutcome, Registration, SkipReason, SmtpMailer, User,
    UserStore, register,
};

use cli::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.default_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "ignoring unreadable .env file"),
    }

    let settings = NotifierSettings::from_env();
    let mailer = SmtpMailer::new(settings.relay.clone());
    let notifier = Notifier::new(settings, mailer);

    let mut store = UserStore::open(&args.db)
        .await
        .with_context(|| format!("opening store {}", args.db.display()))?;
    let outcome = run(&args, &mut store, &notifier).await;
    let closed = store.close().await.context("closing store");
    finish(outcome, closed)
}

/// The run's own error wins over a failure to close the store.
fn finish(outcome: Result<()>, closed: Result<()>) -> Result<()> {
    match (outcome, closed) {
        (Err(e), Err(close_err)) => {
            error!(error = %close_err, "failed to close store");
            Err(e)
        }
        (outcome, closed) => outcome.and(closed),
    }
}

async fn run(args: &Args, store: &mut UserStore, notifier: &Notifier<SmtpMailer>) -> Result<()> {
    let registration = register(store, &args.new_user(), args.notify, notifier)
        .await
        .with_context(|| format!("adding user {:?}", args.name))?;
    println!("{}", summary(&registration));

    if args.list {
        let users = store.list_users().await.context("listing users")?;
        for user in &users {
            println!("{}", listing_line(user, args.json)?);
        }
    }
    Ok(())
}

/// One-line, user-facing result.
fn summary(registration: &Registration) -> &'static str {
    match registration {
        Registration::Duplicate => "User already exists.",
        Registration::Inserted { notification } => match notification {
            NotifyOutcome::Sent => "Added user and sent notification.",
            NotifyOutcome::Skipped(SkipReason::CredentialsNotConfigured) => {
                "Skipping email notification; SMTP credentials not configured."
            }
            NotifyOutcome::Skipped(SkipReason::SuppressedByFlag) => {
                "Added user; email notification suppressed."
            }
            NotifyOutcome::Failed(_) => "Added user, but email failed. Check logs.",
        },
    }
}

fn listing_line(user: &User, json: bool) -> Result<String> {
    if json {
        return serde_json::to_string(user).context("encoding user");
    }
    Ok(format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        user.id,
        user.name,
        user.email.as_deref().unwrap_or("-"),
        user.city.as_deref().unwrap_or("-"),
        user.country.as_deref().unwrap_or("-"),
        user.created_at.to_rfc3339(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use usertrack_core::MailError;

    #[test]
    fn summaries() {
        assert_eq!(summary(&Registration::Duplicate), "User already exists.");

        let failed = Registration::Inserted {
            notification: NotifyOutcome::Failed(MailError::Connection("refused".into())),
        };
        assert_eq!(summary(&failed), "Added user, but email failed. Check logs.");

        let skipped = Registration::Inserted {
            notification: NotifyOutcome::Skipped(SkipReason::CredentialsNotConfigured),
        };
        assert_eq!(
            summary(&skipped),
            "Skipping email notification; SMTP credentials not configured."
        );

        let suppressed = Registration::Inserted {
            notification: NotifyOutcome::Skipped(SkipReason::SuppressedByFlag),
        };
        assert_eq!(summary(&suppressed), "Added user; email notification suppressed.");
    }

    #[test]
    fn run_error_is_kept_when_close_also_fails() {
        let err = finish(
            Err(anyhow::anyhow!("adding user")),
            Err(anyhow::anyhow!("closing store")),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "adding user");

        let err = finish(Ok(()), Err(anyhow::anyhow!("closing store"))).unwrap_err();
        assert_eq!(err.to_string(), "closing store");

        assert!(finish(Ok(()), Ok(())).is_ok());
    }

    #[test]
    fn listing_formats() {
        let user = User {
            id: 1,
            name: "Jane Doe".into(),
            email: None,
            city: Some("Lagos".into()),
            country: Some("Nigeria".into()),
            created_at: "2024-05-01T12:00:00Z".parse().unwrap(),
        };

        let plain = listing_line(&user, false).unwrap();
        assert_eq!(plain, "1\tJane Doe\t-\tLagos\tNigeria\t2024-05-01T12:00:00+00:00");

        let json: serde_json::Value = serde_json::from_str(&listing_line(&user, true).unwrap()).unwrap();
        assert_eq!(json["name"], "Jane Doe");
        assert_eq!(json["email"], serde_json::Value::Null);
        assert_eq!(json["city"], "Lagos");
    }
}

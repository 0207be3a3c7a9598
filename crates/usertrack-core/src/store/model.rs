//! User record types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// Row id assigned by the store.
    pub id: i64,
    /// Full name, unique across the store.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// When the row was written.
    pub created_at: DateTime<Utc>,
}

/// A user about to be added.
///
/// Text fields are trimmed; optional fields that end up empty are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Country.
    pub country: Option<String>,
}

impl NewUser {
    /// Creates a user with only a name.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            ..Self::default()
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: Option<impl AsRef<str>>) -> Self {
        self.email = non_empty(email);
        self
    }

    /// Sets the city.
    #[must_use]
    pub fn with_city(mut self, city: Option<impl AsRef<str>>) -> Self {
        self.city = non_empty(city);
        self
    }

    /// Sets the country.
    #[must_use]
    pub fn with_country(mut self, country: Option<impl AsRef<str>>) -> Self {
        self.country = non_empty(country);
        self
    }
}

fn non_empty(value: Option<impl AsRef<str>>) -> Option<String> {
    value
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
}

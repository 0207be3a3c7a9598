//! Envelope address type.

use crate::error::{Error, Result};

/// Email address for the SMTP envelope (`MAIL FROM` / `RCPT TO`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    /// Creates a new address, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is empty, lacks a single `@`, has an
    /// empty local or domain part, or contains characters that would break
    /// the envelope syntax.
    pub fn new(addr: impl AsRef<str>) -> Result<Self> {
        let addr = addr.as_ref().trim();

        let Some((local, domain)) = addr.split_once('@') else {
            return Err(Error::InvalidAddress(format!("missing @ in {addr:?}")));
        };
        if local.is_empty() || domain.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "empty local or domain part in {addr:?}"
            )));
        }
        if domain.contains('@') {
            return Err(Error::InvalidAddress(format!("more than one @ in {addr:?}")));
        }
        if addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
        {
            return Err(Error::InvalidAddress(format!(
                "illegal character in {addr:?}"
            )));
        }

        Ok(Self(addr.to_string()))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_address() {
        let addr = Address::new("ada@example.com").unwrap();
        assert_eq!(addr.as_str(), "ada@example.com");
    }

    #[test]
    fn trims_whitespace() {
        let addr = Address::new("  ada@example.com\n").unwrap();
        assert_eq!(addr.to_string(), "ada@example.com");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "ada", "@example.com", "ada@", "a@b@c", "ada lovelace@example.com", "<ada@example.com>"] {
            assert!(Address::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}

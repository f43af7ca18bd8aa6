//! Email address type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty or only whitespace.
    #[error("email cannot be empty")]
    Empty,
    /// The input does not contain an @ symbol.
    #[error("email must contain an @ symbol")]
    MissingAtSymbol,
    /// No @ has anything before it.
    #[error("email local part cannot be empty")]
    EmptyLocalPart,
    /// No dot after the @ has text on both sides.
    #[error("email domain must look like name.tld")]
    InvalidDomain,
}

/// An email address.
///
/// Accepted when some whitespace-free run of the input has the shape
/// `x@y.z`, each part non-empty. The parts may themselves hold `@` or `.`,
/// so `a@b.c.` passes. This is the same loose check the checkout form has
/// always applied. The address is stored exactly as given (no case
/// folding), because customers are grouped by the literal address on their
/// orders.
///
/// ## Examples
///
/// ```
/// use furnish_core::Email;
///
/// assert!(Email::parse("user@example.com").is_ok());
/// assert!(Email::parse("user.name+tag@domain.co.uk").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@localhost").is_err());
/// assert!(Email::parse("user @example.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

/// `\S+@\S+\.\S+` against one whitespace-free run.
fn has_address_shape(run: &str) -> bool {
    // Earliest @ with something before it, then the last dot with something after it.
    let Some(at) = run.char_indices().skip(1).find_map(|(i, c)| (c == '@').then_some(i)) else {
        return false;
    };
    let before_last = run.len() - run.chars().last().map_or(0, char::len_utf8);
    run.get(..before_last)
        .and_then(|head| head.rfind('.'))
        .is_some_and(|dot| dot > at + 1)
}

impl Email {
    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] describing the closest rule the input breaks.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.trim().is_empty() {
            return Err(EmailError::Empty);
        }

        if s.split_whitespace().any(has_address_shape) {
            return Ok(Self(s.to_owned()));
        }

        if !s.contains('@') {
            Err(EmailError::MissingAtSymbol)
        } else if s.split_whitespace().all(|run| !run.chars().skip(1).any(|c| c == '@')) {
            Err(EmailError::EmptyLocalPart)
        } else {
            Err(EmailError::InvalidDomain)
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the domain part of the email (after the last @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_emails() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user+tag@example.com").is_ok());
        assert!(Email::parse("user@subdomain.example.com").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_parse_loose_shapes() {
        // A trailing dot is fine as long as an earlier dot has text after it.
        assert!(Email::parse("a@b.c.").is_ok());
        assert!(Email::parse("a@b@c.d").is_ok());
        assert!(Email::parse("@a@b.c").is_ok());
        // Any run of the input may carry the address.
        assert!(Email::parse("Jane <jane@example.com>").is_ok());
        let long = format!("{}@example.com", "a".repeat(300));
        assert!(Email::parse(&long).is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
    }

    #[test]
    fn test_parse_whitespace_splits_the_address() {
        assert_eq!(
            Email::parse("jane@ example.com"),
            Err(EmailError::InvalidDomain)
        );
        assert_eq!(
            Email::parse("jane @example.com"),
            Err(EmailError::EmptyLocalPart)
        );
    }

    #[test]
    fn test_parse_missing_at() {
        assert_eq!(
            Email::parse("no-at-symbol.com"),
            Err(EmailError::MissingAtSymbol)
        );
    }

    #[test]
    fn test_parse_empty_local_part() {
        assert_eq!(Email::parse("@domain.com"), Err(EmailError::EmptyLocalPart));
    }

    #[test]
    fn test_parse_domain_without_dot() {
        assert_eq!(Email::parse("user@"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("user@localhost"), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("user@example."), Err(EmailError::InvalidDomain));
        assert_eq!(Email::parse("user@.com"), Err(EmailError::InvalidDomain));
    }

    #[test]
    fn test_case_is_preserved() {
        let email = Email::parse("Jane@Example.com").unwrap();
        assert_eq!(email.as_str(), "Jane@Example.com");
        assert_eq!(email.domain(), "Example.com");
    }

    #[test]
    fn test_serde_roundtrip() {
        let email = Email::parse("user@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"user@example.com\"");
    }
}

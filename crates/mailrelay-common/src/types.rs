//! Common types for MailRelay

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// An address matching rule compiled from a configured regular expression.
///
/// Matching is always against the whole address: the configured expression
/// is anchored, so `example\.org` does not match `bob@example.org`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressPattern {
    source: String,
    regex: Regex,
}

impl AddressPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> crate::Result<Self> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
            crate::Error::Config(format!("Invalid address pattern {:?}: {}", pattern, e))
        })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Whether the whole address matches this pattern
    pub fn is_match(&self, address: &str) -> bool {
        self.regex.is_match(address)
    }

    /// The pattern as it was configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl fmt::Debug for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AddressPattern").field(&self.source).finish()
    }
}

impl fmt::Display for AddressPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl PartialEq for AddressPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for AddressPattern {}

impl FromStr for AddressPattern {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AddressPattern {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<AddressPattern> for String {
    fn from(pattern: AddressPattern) -> Self {
        pattern.source
    }
}

/// One submitted message as handed over by the listener
#[derive(Debug, Clone)]
pub struct Envelope {
    /// Peer that submitted the message
    pub origin: SocketAddr,

    /// Sender (MAIL FROM)
    pub from: String,

    /// Recipients (RCPT TO), in submission order
    pub to: Vec<String>,

    /// Raw message bytes
    pub data: Vec<u8>,
}

impl Envelope {
    /// Create a new envelope
    pub fn new(
        origin: SocketAddr,
        from: impl Into<String>,
        to: Vec<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            origin,
            from: from.into(),
            to,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_full_match() {
        let pattern = AddressPattern::new(r"admin@example\.org").unwrap();
        assert!(pattern.is_match("admin@example.org"));
        assert!(!pattern.is_match("superadmin@example.org"));
        assert!(!pattern.is_match("admin@example.org.evil"));
    }

    #[test]
    fn test_pattern_not_substring() {
        let pattern = AddressPattern::new(r"example\.org").unwrap();
        assert!(!pattern.is_match("bob@example.org"));

        let domain = AddressPattern::new(r".*@example\.org").unwrap();
        assert!(domain.is_match("bob@example.org"));
    }

    #[test]
    fn test_pattern_with_explicit_anchors() {
        let pattern = AddressPattern::new(r"^admin@example\.org$").unwrap();
        assert!(pattern.is_match("admin@example.org"));
        assert!(!pattern.is_match("alice@example.org"));
    }

    #[test]
    fn test_pattern_alternation_is_grouped() {
        let pattern = AddressPattern::new(r"a@x\.org|b@x\.org").unwrap();
        assert!(pattern.is_match("a@x.org"));
        assert!(pattern.is_match("b@x.org"));
        assert!(!pattern.is_match("a@x.org.b@x.org"));
    }

    #[test]
    fn test_pattern_invalid() {
        let err = AddressPattern::new("(unclosed").unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_pattern_display() {
        let pattern: AddressPattern = r".*@example\.org".parse().unwrap();
        assert_eq!(pattern.to_string(), r".*@example\.org");
        assert_eq!(pattern.as_str(), r".*@example\.org");
    }
}

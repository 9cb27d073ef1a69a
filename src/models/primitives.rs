//! Primitive types and newtypes for type-safe API interactions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A strongly-typed account identifier.
///
/// # Example
///
/// ```
/// use ibkr_rs::AccountId;
///
/// let account = AccountId::new("U1234567");
/// assert_eq!(account.as_str(), "U1234567");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier from a string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the account identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// An IBKR contract identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conid(i64);

impl Conid {
    /// Create a new contract identifier.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the contract identifier as an integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Conid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Conid {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_round_trip() {
        let id = AccountId::new("U1234567");
        assert_eq!(id.to_string(), "U1234567");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"U1234567\"");
    }

    #[test]
    fn test_conid_is_transparent() {
        let conid = Conid::new(265598);
        assert_eq!(serde_json::to_string(&conid).unwrap(), "265598");
        let parsed: Conid = serde_json::from_str("265598").unwrap();
        assert_eq!(parsed, conid);
    }
}

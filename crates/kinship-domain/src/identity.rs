//! Identifiers for users and friendship edges

use std::fmt;

/// Opaque identity of a user, based on UUIDv7
///
/// Users carry no attributes in this crate. The only things Kinship needs from
/// an identity are equality and a total order, the latter for storing each
/// unordered pair under a canonical (min, max) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u128);

impl UserId {
    /// Generate a new UUIDv7-based UserId
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::UserId;
    ///
    /// let alice = UserId::new();
    /// let bob = UserId::new();
    /// assert_ne!(alice, bob);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a UserId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization and tests.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a UserId from a UUID string
    ///
    /// # Examples
    ///
    /// ```
    /// use kinship_domain::UserId;
    ///
    /// let id = UserId::new();
    /// let parsed = UserId::from_string(&id.to_string()).unwrap();
    /// assert_eq!(id, parsed);
    /// ```
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid user id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl std::str::FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

/// Identifier of a stored friendship edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(u128);

impl EdgeId {
    /// Generate a new UUIDv7-based EdgeId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an EdgeId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_ordering() {
        let a = UserId::from_value(1000);
        let b = UserId::from_value(2000);

        assert!(a < b);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_user_id_display_and_parse() {
        let id = UserId::new();
        let id_str = id.to_string();

        // 8-4-4-4-12 with hyphens
        assert_eq!(id_str.len(), 36);
        assert_eq!(id_str.parse::<UserId>().unwrap(), id);
    }

    #[test]
    fn test_user_id_invalid_string() {
        assert!(UserId::from_string("alice").is_err());
        assert!(UserId::from_string("").is_err());
    }

    #[test]
    fn test_edge_ids_are_unique() {
        assert_ne!(EdgeId::new(), EdgeId::new());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Ordering of identities matches the underlying values
        #[test]
        fn test_user_id_ordering_property(a: u128, b: u128) {
            let id_a = UserId::from_value(a);
            let id_b = UserId::from_value(b);

            prop_assert_eq!(id_a < id_b, a < b);
            prop_assert_eq!(id_a == id_b, a == b);
        }

        #[test]
        fn test_user_id_string_roundtrip(value: u128) {
            let id = UserId::from_value(value);
            match UserId::from_string(&id.to_string()) {
                Ok(parsed) => prop_assert_eq!(id, parsed),
                Err(e) => return Err(TestCaseError::fail(e)),
            }
        }
    }
}

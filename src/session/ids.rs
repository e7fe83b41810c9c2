//! Session identifier.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a fresh session UUID.
///
/// With feature `uuid_v7` enabled, ids are time-ordered.
#[inline]
#[must_use]
fn session_uuid() -> Uuid {
    #[cfg(feature = "uuid_v7")]
    {
        Uuid::now_v7()
    }
    #[cfg(not(feature = "uuid_v7"))]
    {
        Uuid::new_v4()
    }
}

/// Opaque identifier of one browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl Default for SessionId {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl SessionId {
    /// Create a new identifier.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(session_uuid())
    }

    /// Borrow the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_roundtrip() {
        let id = SessionId::new();
        let parsed: Result<SessionId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-session".parse::<SessionId>().is_err());
    }
}

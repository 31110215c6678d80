//! ID utilities (connection ids).

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identifier of one WebSocket session, stable for the connection's lifetime.
///
/// Doubles as the player id on the wire, so it serializes as the bare ULID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(Ulid);

impl ConnId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::str::FromStr for ConnId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_parse_back() {
        let a = ConnId::new();
        let b = ConnId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<ConnId>().unwrap(), a);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ConnId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}

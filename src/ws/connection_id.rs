//! Server-assigned connection identity.
//!
//! [`ConnectionId`] is a newtype over a UUID v4 minted by
//! [`super::ConnectionManager::connect`]. It is the registry key; the optional
//! client-supplied identifier is only a label stored next to it.

use std::fmt;

use serde::Serialize;

/// Registry key of one live WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Creates a new random `ConnectionId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//! Socket timeouts handed to the transport.
//!
//! Values are stored in milliseconds and only applied by the transport during
//! network I/O. A zero value means "leave it to the transport".

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Read timeout on an established socket.
    ///
    /// Default: 60000 milliseconds (1 minute)
    #[serde(default = "defaults::socket_ms")]
    pub socket_ms: u64,

    /// Timeout for establishing the connection.
    ///
    /// Default: 60000 milliseconds (1 minute)
    #[serde(default = "defaults::connection_ms")]
    pub connection_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            socket_ms: defaults::socket_ms(),
            connection_ms: defaults::connection_ms(),
        }
    }
}

impl Timeouts {
    #[must_use]
    pub const fn socket(&self) -> Duration {
        Duration::from_millis(self.socket_ms)
    }

    #[must_use]
    pub const fn connection(&self) -> Duration {
        Duration::from_millis(self.connection_ms)
    }
}

/// Saturating conversion, durations beyond `u64::MAX` milliseconds are clamped.
pub(crate) fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

mod defaults {
    pub const fn socket_ms() -> u64 {
        60_000
    }
    pub const fn connection_ms() -> u64 {
        60_000
    }
}

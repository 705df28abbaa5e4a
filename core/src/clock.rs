//! Wall clock for processed/created timestamps.
//!
//! The engine never calls `Utc::now()` directly so tests can pin time.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum DeskClock {
    System,
    Fixed(DateTime<Utc>),
}

impl DeskClock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// Move a fixed clock forward. No-op on the system clock.
    pub fn advance(&mut self, by: chrono::Duration) {
        if let Self::Fixed(at) = self {
            *at += by;
        }
    }
}

impl Default for DeskClock {
    fn default() -> Self {
        Self::System
    }
}

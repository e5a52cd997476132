//! Time-derived record identities.
//!
//! Each generator hands out strictly increasing UTC instants (bumped by one
//! microsecond on a clock tie or step backwards), rendered as:
//! - id: `YYYYMMDDHHMMSSffffff` (20 digits)
//! - timestamp: `YYYY-MM-DDTHH:MM:SS.ffffffZ`
//!
//! Both renderings are fixed width, so lexicographic order is chronological.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

const ID_FORMAT: &str = "%Y%m%d%H%M%S%6f";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// An id/timestamp pair derived from one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub timestamp: String,
}

impl Identity {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            id: instant.format(ID_FORMAT).to_string(),
            timestamp: format_timestamp(instant),
        }
    }
}

/// Render an instant in the store's sortable timestamp format.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Current instant in the store's timestamp format.
pub fn now_timestamp() -> String {
    format_timestamp(Utc::now())
}

#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identity, strictly after every identity this generator issued.
    pub fn next(&self) -> Identity {
        Identity::at(self.next_instant(Utc::now()))
    }

    /// Next identity not contained in `taken`.
    pub fn next_unused(&self, taken: impl Fn(&str) -> bool) -> Identity {
        loop {
            let identity = self.next();
            if !taken(&identity.id) {
                return identity;
            }
            log::debug!("Identity {} already in use, advancing", identity.id);
        }
    }

    fn next_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        // Truncate to the rendered precision so ties are detected.
        let now = truncate_to_micros(now);
        let mut last = self.last.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }
}

fn truncate_to_micros(instant: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(instant.timestamp_micros()).unwrap_or(instant)
}

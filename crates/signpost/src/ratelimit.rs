//! Per-source registration rate limiting.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::error::ServiceError;

/// Registrations allowed per source per window.
pub const REGISTRATION_LIMIT: u32 = 13;

/// Length of the counting window, in seconds.
pub const WINDOW_SECS: u64 = 3600;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: u64,
}

/// Counts publish attempts per source address.
///
/// Every attempt pushes the window's expiry a full hour out, so a
/// source that keeps retrying while throttled stays throttled. That
/// matches the deployed behavior and is kept on purpose.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one attempt from `source`, rejecting past the limit.
    pub fn check(&self, source: IpAddr) -> Result<(), ServiceError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.check_at(source, now)
    }

    /// `check` against an explicit clock.
    pub fn check_at(&self, source: IpAddr, now: u64) -> Result<(), ServiceError> {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let window = windows.entry(source).or_insert(Window {
            count: 0,
            reset_at: now,
        });

        if now >= window.reset_at {
            window.count = 0;
        }
        window.count += 1;
        window.reset_at = now + WINDOW_SECS;

        if window.count > REGISTRATION_LIMIT {
            warn!(%source, count = window.count, "rate limit exceeded");
            return Err(ServiceError::RateLimited);
        }
        Ok(())
    }
}

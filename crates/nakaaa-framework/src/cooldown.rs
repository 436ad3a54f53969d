//! Per-command, per-user rate limiting.
//!
//! [`CooldownTracker::check`] answers "may this user run this command now?" and,
//! when the answer is yes, opens a new window in the same critical section.
//! Each window is removed by a timer task once it expires; lookups also treat
//! an expired window as absent, so correctness never depends on the timer
//! having fired.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use nakaaa_core::UserId;

/// Longest window the tracker opens. Longer cooldowns are cut to this.
pub const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Result of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    /// The command may run; a new window was opened.
    Ready,
    /// The command is cooling down for this user.
    Active { remaining: Duration },
}

impl CooldownStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Remaining time in fractional seconds, if cooling down.
    pub fn remaining_secs(&self) -> Option<f64> {
        match self {
            Self::Ready => None,
            Self::Active { remaining } => Some(remaining.as_secs_f64()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    expires_at: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct Windows {
    by_command: HashMap<String, HashMap<UserId, Window>>,
    next_generation: u64,
}

impl Windows {
    fn active(&self, command: &str, user: UserId, now: Instant) -> Option<Window> {
        self.by_command
            .get(command)
            .and_then(|users| users.get(&user))
            .filter(|window| window.expires_at > now)
            .copied()
    }

    fn remove_if(&mut self, command: &str, user: UserId, generation: u64) -> bool {
        let Some(users) = self.by_command.get_mut(command) else {
            return false;
        };
        if users.get(&user).map(|w| w.generation) != Some(generation) {
            return false;
        }
        users.remove(&user);
        if users.is_empty() {
            self.by_command.remove(command);
        }
        true
    }
}

/// Tracks open cooldown windows keyed by command name and user.
#[derive(Debug, Clone, Default)]
pub struct CooldownTracker {
    windows: Arc<Mutex<Windows>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks for an open window and opens one if there is none.
    ///
    /// The check and the insertion happen under one lock, so two concurrent
    /// calls for the same key can never both see [`CooldownStatus::Ready`].
    /// Windows longer than [`MAX_WINDOW`] are clamped.
    pub fn check(&self, command: &str, user: UserId, window: Duration) -> CooldownStatus {
        let window = window.min(MAX_WINDOW);
        let now = Instant::now();
        let mut windows = self.windows.lock();

        if let Some(open) = windows.active(command, user, now) {
            return CooldownStatus::Active {
                remaining: open.expires_at - now,
            };
        }

        let generation = windows.next_generation;
        windows.next_generation += 1;
        let expires_at = now + window;
        windows
            .by_command
            .entry(command.to_string())
            .or_default()
            .insert(
                user,
                Window {
                    expires_at,
                    generation,
                },
            );
        drop(windows);

        self.schedule_removal(command.to_string(), user, expires_at, generation);
        CooldownStatus::Ready
    }

    /// Time left in the open window, if any.
    pub fn remaining(&self, command: &str, user: UserId) -> Option<Duration> {
        let now = Instant::now();
        self.windows
            .lock()
            .active(command, user, now)
            .map(|open| open.expires_at - now)
    }

    /// Whether a window for this key is still stored, expired or not.
    pub fn contains(&self, command: &str, user: UserId) -> bool {
        self.windows
            .lock()
            .by_command
            .get(command)
            .is_some_and(|users| users.contains_key(&user))
    }

    /// Number of stored windows.
    pub fn len(&self) -> usize {
        self.windows
            .lock()
            .by_command
            .values()
            .map(HashMap::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.lock().by_command.is_empty()
    }

    /// Drops every window.
    pub fn clear(&self) {
        self.windows.lock().by_command.clear();
    }

    fn schedule_removal(&self, command: String, user: UserId, expires_at: Instant, generation: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            trace!(command = %command, "No runtime for cooldown timer, relying on lazy expiry");
            return;
        };
        let windows: Weak<Mutex<Windows>> = Arc::downgrade(&self.windows);
        handle.spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            if let Some(windows) = windows.upgrade()
                && windows.lock().remove_if(&command, user, generation)
            {
                trace!(command = %command, user = %user, "Cooldown window expired");
            }
        });
    }
}

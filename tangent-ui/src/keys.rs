//! Key-release bookkeeping for the terminal front end.
//!
//! Most terminals report key presses only. Held keys are tracked with a
//! last-seen timestamp (OS auto-repeat keeps refreshing it) and released
//! when the repeats stop. Terminals with the keyboard-enhancement protocol
//! deliver real release events and skip the timeout sweep.

use std::collections::HashMap;
use std::time::{Duration, Instant};

pub struct ReleaseTracker {
    held: HashMap<char, Instant>,
    timeout: Duration,
}

impl ReleaseTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            held: HashMap::new(),
            timeout,
        }
    }

    /// Record a press (or auto-repeat) of `code`.
    pub fn touch(&mut self, code: char, now: Instant) {
        self.held.insert(code, now);
    }

    /// Record an explicit release of `code`.
    pub fn release(&mut self, code: char) {
        self.held.remove(&code);
    }

    /// Keys whose repeats stopped longer than the timeout ago. Removed from
    /// tracking; the caller synthesizes the key-up.
    pub fn expired(&mut self, now: Instant) -> Vec<char> {
        let mut released = Vec::new();
        self.held.retain(|&code, last_seen| {
            if now.duration_since(*last_seen) > self.timeout {
                released.push(code);
                false
            } else {
                true
            }
        });
        released
    }

    /// Everything still held (used on exit so no note is left sounding).
    pub fn drain(&mut self) -> Vec<char> {
        let held: Vec<char> = self.held.keys().copied().collect();
        self.held.clear();
        held
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_then_expire() {
        let mut tracker = ReleaseTracker::new(Duration::from_millis(150));
        let start = Instant::now();
        tracker.touch('a', start);
        assert!(tracker.expired(start + Duration::from_millis(100)).is_empty());
        assert_eq!(
            tracker.expired(start + Duration::from_millis(200)),
            vec!['a']
        );
        assert!(tracker.is_empty());
    }

    #[test]
    fn repeat_refreshes_the_deadline() {
        let mut tracker = ReleaseTracker::new(Duration::from_millis(150));
        let start = Instant::now();
        tracker.touch('a', start);
        tracker.touch('a', start + Duration::from_millis(140));
        assert!(tracker.expired(start + Duration::from_millis(200)).is_empty());
        assert_eq!(
            tracker.expired(start + Duration::from_millis(300)),
            vec!['a']
        );
    }

    #[test]
    fn explicit_release_stops_tracking() {
        let mut tracker = ReleaseTracker::new(Duration::from_millis(150));
        let start = Instant::now();
        tracker.touch('a', start);
        tracker.release('a');
        assert!(tracker.expired(start + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn drain_returns_everything_held() {
        let mut tracker = ReleaseTracker::new(Duration::from_millis(150));
        let now = Instant::now();
        tracker.touch('a', now);
        tracker.touch('b', now);
        let mut drained = tracker.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec!['a', 'b']);
        assert!(tracker.is_empty());
    }
}

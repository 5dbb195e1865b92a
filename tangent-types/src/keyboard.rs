//! Per-key down/up state with key-repeat suppression.

use crate::keymap::KeyMap;
use crate::mapping::Row;

/// Boolean down/up state for both key rows. A transition is accepted only
/// when it changes the stored state, so OS key-repeat delivers no duplicate
/// note events. Driven from a single logical input thread; no locking.
#[derive(Debug, Clone)]
pub struct KeyboardState {
    low: Vec<bool>,
    high: Vec<bool>,
}

impl KeyboardState {
    pub fn new(low_len: usize, high_len: usize) -> Self {
        Self {
            low: vec![false; low_len],
            high: vec![false; high_len],
        }
    }

    /// State sized to a key map's rows, all keys up.
    pub fn for_keymap(keymap: &KeyMap) -> Self {
        Self::new(keymap.low_len(), keymap.high_len())
    }

    /// Record a down/up transition. Returns `true` when the transition was
    /// accepted (the state changed), `false` for a repeat. Out-of-range
    /// indices are the caller's concern; they are ignored here.
    pub fn transition(&mut self, row: Row, index: usize, down: bool) -> bool {
        let states = match row {
            Row::Low => &mut self.low,
            Row::High => &mut self.high,
        };
        match states.get_mut(index) {
            Some(state) if *state != down => {
                *state = down;
                true
            }
            _ => false,
        }
    }

    pub fn is_down(&self, row: Row, index: usize) -> bool {
        let states = match row {
            Row::Low => &self.low,
            Row::High => &self.high,
        };
        states.get(index).copied().unwrap_or(false)
    }

    /// Release everything (used when the key map is replaced).
    pub fn reset(&mut self) {
        self.low.fill(false);
        self.high.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_transition_accepted() {
        let mut state = KeyboardState::new(22, 23);
        assert!(state.transition(Row::Low, 0, true));
        assert!(state.is_down(Row::Low, 0));
    }

    #[test]
    fn repeated_transition_rejected() {
        let mut state = KeyboardState::new(22, 23);
        assert!(state.transition(Row::Low, 5, true));
        assert!(!state.transition(Row::Low, 5, true));
        assert!(state.transition(Row::Low, 5, false));
        assert!(!state.transition(Row::Low, 5, false));
    }

    #[test]
    fn alternating_transitions_always_accepted() {
        let mut state = KeyboardState::new(22, 23);
        for _ in 0..4 {
            assert!(state.transition(Row::High, 2, true));
            assert!(state.transition(Row::High, 2, false));
        }
    }

    #[test]
    fn rows_are_independent() {
        let mut state = KeyboardState::new(22, 23);
        assert!(state.transition(Row::Low, 1, true));
        assert!(state.transition(Row::High, 1, true));
        assert!(state.is_down(Row::Low, 1));
        assert!(state.is_down(Row::High, 1));
    }

    #[test]
    fn reset_releases_all() {
        let mut state = KeyboardState::new(4, 4);
        state.transition(Row::Low, 0, true);
        state.transition(Row::High, 3, true);
        state.reset();
        assert!(!state.is_down(Row::Low, 0));
        assert!(!state.is_down(Row::High, 3));
        // After reset a fresh down is a real transition again.
        assert!(state.transition(Row::Low, 0, true));
    }

    #[test]
    fn out_of_range_is_ignored() {
        let mut state = KeyboardState::new(4, 4);
        assert!(!state.transition(Row::Low, 99, true));
        assert!(!state.is_down(Row::Low, 99));
    }
}

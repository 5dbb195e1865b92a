//! Consolidated session state for the live instrument.
//!
//! One explicit object holds everything the key path and the router read:
//! channel, program/bank, octave, transpose, velocity, layout and key map.
//! UI-facing code mutates it only through the accessor operations on
//! [`crate::engine::Engine`] and [`crate::router::MidiRouter`].

use tangent_types::{KeyMap, Layout};

pub const MAX_OCTAVE: u8 = 7;

#[derive(Debug, Clone)]
pub struct SessionState {
    pub channel: u8,
    pub program: u8,
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub octave: u8,
    pub transpose: i32,
    pub velocity: u8,
    pub layout: Layout,
    pub keymap: KeyMap,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            channel: 1,
            program: 0, // grand piano
            bank_msb: 0,
            bank_lsb: 0,
            octave: 4,
            transpose: 0,
            velocity: 100,
            layout: Layout::Piano,
            keymap: KeyMap::jp106(),
        }
    }
}

impl SessionState {
    /// Raise the octave. Returns `false` at the upper clamp.
    pub fn octave_up(&mut self) -> bool {
        if self.octave < MAX_OCTAVE {
            self.octave += 1;
            true
        } else {
            false
        }
    }

    /// Lower the octave. Returns `false` at the lower clamp.
    pub fn octave_down(&mut self) -> bool {
        if self.octave > 0 {
            self.octave -= 1;
            true
        } else {
            false
        }
    }

    /// Transpose is an unbounded signed offset; out-of-range notes are
    /// dropped by the mapper, not prevented here.
    pub fn transpose_by(&mut self, delta: i32) {
        self.transpose += delta;
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.channel = channel & 0x0F;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octave_clamps() {
        let mut session = SessionState::default();
        for _ in 0..20 {
            session.octave_up();
        }
        assert_eq!(session.octave, MAX_OCTAVE);
        assert!(!session.octave_up());
        for _ in 0..20 {
            session.octave_down();
        }
        assert_eq!(session.octave, 0);
        assert!(!session.octave_down());
    }

    #[test]
    fn transpose_unbounded() {
        let mut session = SessionState::default();
        session.transpose_by(-100);
        assert_eq!(session.transpose, -100);
        session.transpose_by(300);
        assert_eq!(session.transpose, 200);
    }

    #[test]
    fn channel_masked_to_midi_range() {
        let mut session = SessionState::default();
        session.set_channel(15);
        assert_eq!(session.channel, 15);
        session.set_channel(16);
        assert_eq!(session.channel, 0);
    }
}

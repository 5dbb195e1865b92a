//! Slot-to-note mapping.
//!
//! The canonical formula: the high row sits one octave above the low row and
//! transpose applies in both layouts; only the anchor constant differs
//! between layouts (-4 piano, -5 chromatic), placing the lowest low-row key
//! of octave 4 in the middle-C region.

use serde::{Deserialize, Serialize};

use crate::keymap::is_notable_slot;

/// One of the two physical key rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    Low,
    High,
}

/// Key-to-pitch layout mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Layout {
    /// Piano-style spacing: slots 4, 10 and 18 are spacers.
    #[default]
    Piano,
    /// Every physical key maps to a semitone.
    Chromatic,
}

impl Layout {
    pub fn is_chromatic(self) -> bool {
        matches!(self, Layout::Chromatic)
    }

    pub fn name(self) -> &'static str {
        match self {
            Layout::Piano => "piano",
            Layout::Chromatic => "chromatic",
        }
    }
}

/// MIDI note for a key slot, or `None` when the slot is a spacer or the
/// result falls outside 0..=127. Out-of-range is a normal condition at the
/// pitch extremes; callers drop the event silently.
pub fn note_for_slot(row: Row, slot: usize, octave: u8, transpose: i32, layout: Layout) -> Option<u8> {
    if !is_notable_slot(slot, layout.is_chromatic()) {
        return None;
    }
    // Piano layout compacts the spacer slots out so 22 physical keys cover
    // the 12 usable positions per octave region.
    let nid = match layout {
        Layout::Chromatic => slot,
        Layout::Piano => match slot {
            0..=3 => slot,
            4..=9 => slot - 1,
            10..=17 => slot - 2,
            _ => slot - 3,
        },
    } as i32;
    let base = (i32::from(octave) + if row == Row::High { 1 } else { 0 }) * 12;
    let anchor = match layout {
        Layout::Piano => -4,
        Layout::Chromatic => -5,
    };
    let note = base + anchor + nid + transpose;
    u8::try_from(note).ok().filter(|&n| n <= 127)
}

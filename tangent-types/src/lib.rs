//! # tangent-types
//!
//! Shared type definitions for the tangent keyboard instrument.
//! Pure data and pure functions only — no I/O, no device handles.
//!
//! - [`keymap`] — key-code rows, built-in layouts, text interchange format
//! - [`mapping`] — row/layout enums and the slot-to-note function
//! - [`keyboard`] — per-key down/up state with key-repeat suppression
//! - [`chord`] — chord templates and matching over sounding pitches
//! - [`song`] — in-memory song data produced by the macro compiler

pub mod chord;
pub mod keyboard;
pub mod keymap;
pub mod mapping;
pub mod song;

pub use chord::{match_chords, note_name, Chord, ChordTemplate};
pub use keyboard::KeyboardState;
pub use keymap::{decode_keys, encode_keys, is_notable_slot, KeyMap, NON_NOTABLE_SLOTS};
pub use mapping::{note_for_slot, Layout, Row};
pub use song::{Song, SongEvent, TimedEvent};

//! Notifications raised for UI observers.
//!
//! Components never hold UI objects; they send `ControllerEvent`s into a
//! channel the front end drains once per loop iteration.

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use tangent_types::Song;

/// One state-change notification.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    OutputDeviceChanged { name: String },
    InputDeviceChanged { name: String },
    ProgramChanged { program: u8, bank_msb: u8, bank_lsb: u8 },
    NoteChanged { note: u8, velocity: u8 },
    /// A macro slot got a freshly compiled song and started playing.
    ListingChanged { slot: usize, song: Arc<Song> },
    /// Macro compilation failed; the slot keeps its prior state.
    PlaybackFailed { slot: usize, message: String },
}

/// Receiving side of the notification channel.
pub type EventReceiver = Receiver<ControllerEvent>;

/// Create the notification channel pair.
pub fn controller_channel() -> (Sender<ControllerEvent>, EventReceiver) {
    unbounded()
}

/// Fire-and-forget send; a missing receiver is logged, never fatal.
pub(crate) fn emit(events: &Sender<ControllerEvent>, event: ControllerEvent) {
    if events.send(event).is_err() {
        log::warn!(target: "events", "controller event dropped (no receiver)");
    }
}

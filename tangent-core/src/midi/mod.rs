//! MIDI wire-message construction and output fan-out.

pub mod ports;

use std::sync::{Arc, Mutex};

pub const CC_BANK_SELECT_MSB: u8 = 0x00;
pub const CC_BANK_SELECT_LSB: u8 = 0x20;

/// Note on/off. Velocity 0 is the note-off convention.
pub fn note_message(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

/// Control change.
pub fn control_message(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]
}

/// Program change.
pub fn program_message(channel: u8, program: u8) -> [u8; 2] {
    [0xC0 | (channel & 0x0F), program & 0x7F]
}

/// Destination for raw MIDI bytes.
pub trait MidiSink: Send {
    fn send(&mut self, bytes: &[u8]) -> Result<(), String>;
}

impl MidiSink for midir::MidiOutputConnection {
    fn send(&mut self, bytes: &[u8]) -> Result<(), String> {
        midir::MidiOutputConnection::send(self, bytes).map_err(|e| e.to_string())
    }
}

/// The primary output plus an optional byte-for-byte mirror (virtual port).
/// Callers lock the stack for a whole message, so a message's bytes are
/// never interleaved across writers.
#[derive(Default)]
pub struct OutputStack {
    primary: Option<Box<dyn MidiSink>>,
    mirror: Option<Box<dyn MidiSink>>,
}

impl OutputStack {
    pub fn set_primary(&mut self, sink: Option<Box<dyn MidiSink>>) {
        self.primary = sink;
    }

    pub fn set_mirror(&mut self, sink: Option<Box<dyn MidiSink>>) {
        self.mirror = sink;
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub fn has_mirror(&self) -> bool {
        self.mirror.is_some()
    }

    /// Send one message to the primary output and mirror it verbatim.
    /// Send failures are logged; the stack stays usable.
    pub fn send(&mut self, bytes: &[u8]) {
        if let Some(primary) = &mut self.primary {
            if let Err(e) = primary.send(bytes) {
                log::warn!(target: "midi", "output send failed: {}", e);
            }
        }
        if let Some(mirror) = &mut self.mirror {
            if let Err(e) = mirror.send(bytes) {
                log::warn!(target: "midi", "mirror send failed: {}", e);
            }
        }
    }
}

/// Shared handle to the output stack: the live key path and every player
/// write through the same lock.
pub type SharedOutputs = Arc<Mutex<OutputStack>>;

pub fn shared_outputs() -> SharedOutputs {
    Arc::new(Mutex::new(OutputStack::default()))
}

/// Sink that records every message it receives. Used by tests and
/// loopback diagnostics.
pub struct CaptureSink {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle for reading captured messages after the sink moved into an
    /// output stack.
    pub fn handle(&self) -> CaptureHandle {
        CaptureHandle {
            messages: Arc::clone(&self.messages),
        }
    }
}

impl Default for CaptureSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiSink for CaptureSink {
    fn send(&mut self, bytes: &[u8]) -> Result<(), String> {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(bytes.to_vec());
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct CaptureHandle {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl CaptureHandle {
    pub fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

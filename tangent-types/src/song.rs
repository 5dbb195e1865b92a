//! In-memory song data, as produced by the macro-language compiler.

use serde::{Deserialize, Serialize};

/// Default tempo when a song carries no tempo event: 120 BPM in
/// microseconds per quarter note.
pub const DEFAULT_TEMPO: u32 = 500_000;

/// One playable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SongEvent {
    /// Channel voice/mode message: status byte plus up to two data bytes.
    Channel { status: u8, data1: u8, data2: u8 },
    /// Variable-length system-exclusive-style payload, sent verbatim.
    SysEx(Vec<u8>),
    /// Tempo change, microseconds per quarter note. Timing only, no wire
    /// bytes.
    Tempo(u32),
}

impl SongEvent {
    /// Raw wire bytes, or `None` for timing-only events. Program change and
    /// channel pressure carry a single data byte.
    pub fn wire_bytes(&self) -> Option<Vec<u8>> {
        match self {
            SongEvent::Channel { status, data1, data2 } => {
                let bytes = match status & 0xF0 {
                    0xC0 | 0xD0 => vec![*status, *data1],
                    _ => vec![*status, *data1, *data2],
                };
                Some(bytes)
            }
            SongEvent::SysEx(bytes) => Some(bytes.clone()),
            SongEvent::Tempo(_) => None,
        }
    }
}

/// An event with its delta time in ticks since the previous event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub delta: u32,
    pub event: SongEvent,
}

/// A compiled song: tick resolution (ticks per quarter note) and an ordered
/// event list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub resolution: u16,
    pub events: Vec<TimedEvent>,
}

impl Song {
    pub fn new(resolution: u16) -> Self {
        Self {
            resolution,
            events: Vec::new(),
        }
    }

    pub fn push(&mut self, delta: u32, event: SongEvent) {
        self.events.push(TimedEvent { delta, event });
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn total_ticks(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.delta)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_byte_wire_messages() {
        let on = SongEvent::Channel { status: 0x91, data1: 60, data2: 100 };
        assert_eq!(on.wire_bytes(), Some(vec![0x91, 60, 100]));
        let cc = SongEvent::Channel { status: 0xB0, data1: 0x00, data2: 1 };
        assert_eq!(cc.wire_bytes(), Some(vec![0xB0, 0x00, 1]));
    }

    #[test]
    fn two_byte_wire_messages() {
        let program = SongEvent::Channel { status: 0xC1, data1: 5, data2: 0 };
        assert_eq!(program.wire_bytes(), Some(vec![0xC1, 5]));
        let pressure = SongEvent::Channel { status: 0xD0, data1: 42, data2: 0 };
        assert_eq!(pressure.wire_bytes(), Some(vec![0xD0, 42]));
    }

    #[test]
    fn sysex_passes_through() {
        let payload = vec![0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7];
        let event = SongEvent::SysEx(payload.clone());
        assert_eq!(event.wire_bytes(), Some(payload));
    }

    #[test]
    fn tempo_has_no_wire_bytes() {
        assert_eq!(SongEvent::Tempo(500_000).wire_bytes(), None);
    }

    #[test]
    fn total_ticks_sums_deltas() {
        let mut song = Song::new(480);
        song.push(0, SongEvent::Channel { status: 0x90, data1: 60, data2: 100 });
        song.push(480, SongEvent::Channel { status: 0x90, data1: 60, data2: 0 });
        song.push(240, SongEvent::Tempo(400_000));
        assert_eq!(song.total_ticks(), 720);
        assert!(!song.is_empty());
    }
}

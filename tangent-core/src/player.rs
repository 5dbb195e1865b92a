//! Asynchronous playback of one compiled song.
//!
//! The playback thread walks the song's timed events, converts delta ticks
//! to wall time through the current tempo, and writes every event's bytes to
//! the shared output stack — the mirror port receives them automatically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tangent_types::song::{Song, SongEvent, DEFAULT_TEMPO};

use crate::midi::SharedOutputs;

/// Sleep granularity while waiting for the next event; bounds how long a
/// stop request can go unnoticed.
const STOP_POLL: Duration = Duration::from_millis(2);

pub struct SongPlayer {
    song: Arc<Song>,
    outputs: SharedOutputs,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SongPlayer {
    pub fn new(song: Arc<Song>, outputs: SharedOutputs) -> Self {
        Self {
            song,
            outputs,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn song(&self) -> &Arc<Song> {
        &self.song
    }

    /// Start playback on a background thread. A second call is a no-op.
    pub fn play_async(&mut self) {
        if self.handle.is_some() {
            return;
        }
        let song = Arc::clone(&self.song);
        let outputs = Arc::clone(&self.outputs);
        let stop = Arc::clone(&self.stop);
        self.handle = Some(thread::spawn(move || run_playback(&song, &outputs, &stop)));
    }

    /// Request a halt. Idempotent; safe on a finished or never-started
    /// player. The playback thread notices within its sleep granularity.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Observable stop flag, outliving the player itself.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn is_playing(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for SongPlayer {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_playback(song: &Song, outputs: &SharedOutputs, stop: &Arc<AtomicBool>) {
    let resolution = u64::from(song.resolution.max(1));
    let mut tempo = u64::from(DEFAULT_TEMPO);
    // Notes this player turned on and has not yet released: (channel, note).
    let mut held: Vec<(u8, u8)> = Vec::new();
    let start = Instant::now();
    let mut elapsed_us: u64 = 0;

    for timed in &song.events {
        elapsed_us += u64::from(timed.delta) * tempo / resolution;
        let target = start + Duration::from_micros(elapsed_us);
        loop {
            if stop.load(Ordering::Relaxed) {
                release_held(outputs, &held);
                return;
            }
            let now = Instant::now();
            if now >= target {
                break;
            }
            thread::sleep((target - now).min(STOP_POLL));
        }

        match &timed.event {
            SongEvent::Tempo(us_per_quarter) => tempo = u64::from(*us_per_quarter).max(1),
            event => {
                if let Some(bytes) = event.wire_bytes() {
                    track_held(&mut held, &bytes);
                    if let Ok(mut outs) = outputs.lock() {
                        outs.send(&bytes);
                    }
                }
            }
        }
    }
}

fn track_held(held: &mut Vec<(u8, u8)>, bytes: &[u8]) {
    if bytes.len() != 3 {
        return;
    }
    let channel = bytes[0] & 0x0F;
    match bytes[0] & 0xF0 {
        0x90 if bytes[2] > 0 => {
            if !held.contains(&(channel, bytes[1])) {
                held.push((channel, bytes[1]));
            }
        }
        0x80 | 0x90 => held.retain(|&(c, n)| !(c == channel && n == bytes[1])),
        _ => {}
    }
}

/// No stuck notes on cancel: release everything still held.
fn release_held(outputs: &SharedOutputs, held: &[(u8, u8)]) {
    if held.is_empty() {
        return;
    }
    if let Ok(mut outs) = outputs.lock() {
        for &(channel, note) in held {
            outs.send(&[0x90 | channel, note, 0]);
        }
    }
}

//! Macro playback sessions: background compilation and per-slot players.
//!
//! `execute` and `stop` never block the input thread. Compilation runs on a
//! worker thread; its result is marshalled back through a feedback channel
//! and applied by `drain` on the coordinating thread, so the slot registry
//! is never touched concurrently with key events.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tangent_types::Song;

use crate::events::{emit, ControllerEvent};
use crate::midi::SharedOutputs;
use crate::player::SongPlayer;

/// The macro-language compiler collaborator. Any `Err` is a compile
/// failure; the failing slot keeps its prior state.
pub trait SongCompiler: Send + Sync {
    fn compile(&self, source: &str) -> Result<Song, String>;
}

/// Fixed lead-in selecting track, channel and tempo ahead of the user text.
/// The token forms are the compiler's convention.
pub fn with_preamble(channel: u8, text: &str) -> String {
    format!("1 CH{} t200r1t120 {}", channel + 1, text)
}

/// Result of one background compile.
pub enum PlaybackFeedback {
    Compiled { slot: usize, song: Arc<Song> },
    Failed { slot: usize, message: String },
}

/// Indexed player slots. Slots are created on first use and reused across
/// restarts; at most one active player per slot.
pub struct PlayerRegistry {
    players: Vec<Option<SongPlayer>>,
    compiler: Arc<dyn SongCompiler>,
    outputs: SharedOutputs,
    feedback_tx: Sender<PlaybackFeedback>,
    feedback_rx: Receiver<PlaybackFeedback>,
    events: crossbeam_channel::Sender<ControllerEvent>,
}

impl PlayerRegistry {
    pub fn new(
        compiler: Arc<dyn SongCompiler>,
        outputs: SharedOutputs,
        events: crossbeam_channel::Sender<ControllerEvent>,
    ) -> Self {
        let (feedback_tx, feedback_rx) = mpsc::channel();
        Self {
            players: Vec::new(),
            compiler,
            outputs,
            feedback_tx,
            feedback_rx,
            events,
        }
    }

    /// Compile `text` for `slot` on a background thread. Returns
    /// immediately; the result arrives via [`PlayerRegistry::drain`].
    pub fn execute(&self, text: &str, slot: usize, channel: u8) {
        let source = with_preamble(channel, text);
        let compiler = Arc::clone(&self.compiler);
        let feedback_tx = self.feedback_tx.clone();
        thread::spawn(move || match compiler.compile(&source) {
            Ok(song) => {
                let _ = feedback_tx.send(PlaybackFeedback::Compiled {
                    slot,
                    song: Arc::new(song),
                });
            }
            Err(message) => {
                log::error!(target: "playback", "compile failed for slot {}: {}", slot, message);
                let _ = feedback_tx.send(PlaybackFeedback::Failed { slot, message });
            }
        });
    }

    /// Signal the player at `slot` to halt. No-op on an empty slot; safe on
    /// an already-stopped player.
    pub fn stop(&self, slot: usize) {
        if let Some(Some(player)) = self.players.get(slot) {
            player.stop();
        }
    }

    pub fn player(&self, slot: usize) -> Option<&SongPlayer> {
        self.players.get(slot).and_then(|p| p.as_ref())
    }

    pub fn slot_count(&self) -> usize {
        self.players.len()
    }

    /// Apply completed compiles on the coordinating thread. Returns how
    /// many feedback messages were processed.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(feedback) = self.feedback_rx.try_recv() {
            self.apply(feedback);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, feedback: PlaybackFeedback) {
        match feedback {
            PlaybackFeedback::Compiled { slot, song } => self.start_song(slot, song),
            PlaybackFeedback::Failed { slot, message } => {
                emit(&self.events, ControllerEvent::PlaybackFailed { slot, message });
            }
        }
    }

    fn start_song(&mut self, slot: usize, song: Arc<Song>) {
        if self.players.len() <= slot {
            self.players.resize_with(slot + 1, || None);
        }
        // Dispose any running player before installing the replacement;
        // dropping stops it and joins its thread.
        self.players[slot] = None;

        let mut player = SongPlayer::new(Arc::clone(&song), Arc::clone(&self.outputs));
        player.play_async();
        self.players[slot] = Some(player);
        emit(&self.events, ControllerEvent::ListingChanged { slot, song });
    }
}

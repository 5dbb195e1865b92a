//! The coordinating facade for the input thread.
//!
//! One `Engine` owns the key state, the router, and the player registry.
//! The whole key path — keymap lookup, notable filter, debounce, note
//! mapping, routing — runs to completion before the next event is
//! processed.

use std::sync::Arc;

use crossbeam_channel::Sender;

use tangent_types::{is_notable_slot, note_for_slot, KeyMap, KeyboardState, Layout, Row};

use crate::events::ControllerEvent;
use crate::playback::{PlayerRegistry, SongCompiler};
use crate::router::MidiRouter;
use crate::session::SessionState;

pub struct Engine {
    keys: KeyboardState,
    router: MidiRouter,
    players: PlayerRegistry,
}

impl Engine {
    pub fn new(
        session: SessionState,
        compiler: Arc<dyn SongCompiler>,
        events: Sender<ControllerEvent>,
    ) -> Self {
        let keys = KeyboardState::for_keymap(&session.keymap);
        let router = MidiRouter::new(session, events.clone());
        let players = PlayerRegistry::new(compiler, router.outputs(), events);
        Self {
            keys,
            router,
            players,
        }
    }

    pub fn router(&self) -> &MidiRouter {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut MidiRouter {
        &mut self.router
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    /// Translate one physical key transition into a note event. Unknown
    /// keys, spacer slots, repeats and out-of-range notes all drop
    /// silently — none of them are errors.
    pub fn handle_key(&mut self, code: char, down: bool) {
        let code = code.to_ascii_uppercase();
        let session = self.router.session();
        let (octave, transpose, layout, velocity) = (
            session.octave,
            session.transpose,
            session.layout,
            session.velocity,
        );
        let located = session
            .keymap
            .index_of_low(code)
            .map(|slot| (Row::Low, slot))
            .or_else(|| session.keymap.index_of_high(code).map(|slot| (Row::High, slot)));
        let Some((row, slot)) = located else {
            return;
        };
        if !is_notable_slot(slot, layout.is_chromatic()) {
            return;
        }
        if !self.keys.transition(row, slot, down) {
            return; // key repeat
        }
        let Some(note) = note_for_slot(row, slot, octave, transpose, layout) else {
            return;
        };
        self.router.note_on_off(note, if down { velocity } else { 0 });
    }

    pub fn octave_up(&mut self) -> bool {
        self.router.octave_up()
    }

    pub fn octave_down(&mut self) -> bool {
        self.router.octave_down()
    }

    pub fn transpose_by(&mut self, delta: i32) {
        self.router.transpose_by(delta);
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.router.set_layout(layout);
    }

    /// Swap the key map and release every tracked key.
    pub fn set_keymap(&mut self, keymap: KeyMap) {
        self.keys = KeyboardState::for_keymap(&keymap);
        self.router.set_keymap(keymap);
    }

    pub fn change_program(&mut self, program: u8, bank_msb: u8, bank_lsb: u8) {
        self.router.change_program(program, bank_msb, bank_lsb);
    }

    pub fn change_output_device(&mut self, index: usize) -> Result<(), String> {
        self.router.change_output_device(index)
    }

    pub fn change_input_device(&mut self, index: usize) -> Result<(), String> {
        self.router.change_input_device(index)
    }

    pub fn enable_virtual_output(&mut self, port_name: &str) -> bool {
        self.router.enable_virtual_output(port_name)
    }

    /// Compile and play macro text at `slot`. Never blocks.
    pub fn execute(&self, text: &str, slot: usize) {
        self.players.execute(text, slot, self.router.session().channel);
    }

    /// Halt the player at `slot`, if any.
    pub fn stop(&self, slot: usize) {
        self.players.stop(slot);
    }

    /// Apply playback completions on the coordinating thread. Call once per
    /// loop iteration.
    pub fn tick(&mut self) -> usize {
        self.players.drain()
    }

    pub fn chord_label(&self) -> String {
        self.router.chord_label()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::controller_channel;
    use crate::midi::{CaptureHandle, CaptureSink};
    use crossbeam_channel::Receiver;
    use tangent_types::Song;

    struct StubCompiler;

    impl SongCompiler for StubCompiler {
        fn compile(&self, _source: &str) -> Result<Song, String> {
            Ok(Song::new(480))
        }
    }

    fn test_engine() -> (Engine, CaptureHandle, Receiver<ControllerEvent>) {
        let (tx, rx) = controller_channel();
        let mut engine = Engine::new(SessionState::default(), Arc::new(StubCompiler), tx);
        let sink = CaptureSink::new();
        let handle = sink.handle();
        engine.router_mut().install_primary(Box::new(sink), "capture");
        let _ = rx.try_recv();
        (engine, handle, rx)
    }

    #[test]
    fn key_press_and_release_produce_on_and_off() {
        let (mut engine, handle, _rx) = test_engine();
        // JP106 low slot 0 ('A'), octave 4, piano layout: note 44.
        engine.handle_key('a', true);
        engine.handle_key('a', false);
        assert_eq!(
            handle.messages(),
            vec![vec![0x91, 44, 100], vec![0x91, 44, 0]]
        );
    }

    #[test]
    fn key_repeat_is_suppressed() {
        let (mut engine, handle, _rx) = test_engine();
        engine.handle_key('A', true);
        engine.handle_key('A', true);
        engine.handle_key('A', true);
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn unknown_key_is_silent() {
        let (mut engine, handle, _rx) = test_engine();
        engine.handle_key('!', true);
        assert!(handle.is_empty());
    }

    #[test]
    fn spacer_key_is_silent_in_piano_layout() {
        let (mut engine, handle, _rx) = test_engine();
        // JP106 low slot 4 is 'D'.
        engine.handle_key('D', true);
        assert!(handle.is_empty());
    }

    #[test]
    fn spacer_key_sounds_in_chromatic_layout() {
        let (mut engine, handle, _rx) = test_engine();
        engine.set_layout(Layout::Chromatic);
        engine.handle_key('D', true);
        // (4 * 12) - 5 + 4 = 47
        assert_eq!(handle.messages(), vec![vec![0x91, 47, 100]]);
    }

    #[test]
    fn high_row_sits_an_octave_up() {
        let (mut engine, handle, _rx) = test_engine();
        engine.handle_key('A', true); // low slot 0 -> 44
        engine.handle_key('1', true); // high slot 0 -> 56
        let messages = handle.messages();
        assert_eq!(messages[0][1] + 12, messages[1][1]);
    }

    #[test]
    fn octave_change_shifts_following_notes() {
        let (mut engine, handle, _rx) = test_engine();
        engine.handle_key('A', true);
        engine.handle_key('A', false);
        assert!(engine.octave_up());
        engine.handle_key('A', true);
        let messages = handle.messages();
        assert_eq!(messages[0][1] + 12, messages[2][1]);
    }

    #[test]
    fn out_of_range_note_never_reaches_the_router() {
        let (mut engine, handle, _rx) = test_engine();
        for _ in 0..10 {
            engine.octave_down();
        }
        engine.transpose_by(-60);
        engine.handle_key('A', true);
        assert!(handle.is_empty());
    }

    #[test]
    fn keymap_swap_releases_tracked_keys() {
        let (mut engine, handle, _rx) = test_engine();
        engine.handle_key('A', true);
        engine.set_keymap(KeyMap::us101());
        // After the swap the same key press is a fresh transition.
        engine.handle_key('A', true);
        assert_eq!(handle.len(), 2);
    }

    #[test]
    fn chord_label_tracks_sounding_notes() {
        let (mut engine, _handle, _rx) = test_engine();
        engine.router_mut().note_on_off(60, 100);
        engine.router_mut().note_on_off(64, 100);
        engine.router_mut().note_on_off(67, 100);
        assert_eq!(engine.chord_label(), "C");
    }

    #[test]
    fn execute_never_blocks_and_applies_on_tick() {
        let (mut engine, _handle, rx) = test_engine();
        engine.execute("cde", 0);
        for _ in 0..500 {
            if engine.tick() > 0 {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
        }
        assert!(engine.players().player(0).is_some());
        let listing = rx
            .try_iter()
            .find(|e| matches!(e, ControllerEvent::ListingChanged { .. }));
        assert!(listing.is_some());
    }
}

//! MIDI routing: device handles, session state, sounding-note bookkeeping.

use std::sync::Arc;

use crossbeam_channel::Sender;
use midir::MidiInputConnection;

use tangent_types::chord;

use crate::events::{emit, ControllerEvent};
use crate::midi::{
    self, ports, MidiSink, SharedOutputs, CC_BANK_SELECT_LSB, CC_BANK_SELECT_MSB,
};
use crate::session::SessionState;

/// Owns the session state, the shared output stack, the optional input
/// connection, and the per-channel sounding-note table.
pub struct MidiRouter {
    session: SessionState,
    outputs: SharedOutputs,
    input: Option<MidiInputConnection<()>>,
    output_name: Option<String>,
    input_name: Option<String>,
    /// Velocity per note, per channel. 0 = silent.
    sounding: Box<[[u8; 128]; 16]>,
    events: Sender<ControllerEvent>,
}

impl MidiRouter {
    pub fn new(session: SessionState, events: Sender<ControllerEvent>) -> Self {
        Self {
            session,
            outputs: midi::shared_outputs(),
            input: None,
            output_name: None,
            input_name: None,
            sounding: Box::new([[0u8; 128]; 16]),
            events,
        }
    }

    /// Shared handle for players and the thru path.
    pub fn outputs(&self) -> SharedOutputs {
        Arc::clone(&self.outputs)
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    pub fn input_name(&self) -> Option<&str> {
        self.input_name.as_deref()
    }

    fn send(&self, bytes: &[u8]) {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.send(bytes);
        }
    }

    /// Send a note on/off (velocity 0 = off), update the sounding table for
    /// the session channel, and notify observers. Callers guarantee
    /// `note <= 127`; the mapper never produces anything else.
    pub fn note_on_off(&mut self, note: u8, velocity: u8) {
        let channel = self.session.channel;
        self.send(&midi::note_message(channel, note, velocity));
        self.sounding[channel as usize][(note & 0x7F) as usize] = velocity & 0x7F;
        emit(&self.events, ControllerEvent::NoteChanged { note, velocity });
    }

    /// Bank select (MSB, then LSB), then program change — bank select must
    /// precede program change on the wire.
    pub fn change_program(&mut self, program: u8, bank_msb: u8, bank_lsb: u8) {
        self.session.program = program & 0x7F;
        self.session.bank_msb = bank_msb & 0x7F;
        self.session.bank_lsb = bank_lsb & 0x7F;
        self.apply_program();
        emit(
            &self.events,
            ControllerEvent::ProgramChanged {
                program: self.session.program,
                bank_msb: self.session.bank_msb,
                bank_lsb: self.session.bank_lsb,
            },
        );
    }

    fn apply_program(&self) {
        let channel = self.session.channel;
        self.send(&midi::control_message(channel, CC_BANK_SELECT_MSB, self.session.bank_msb));
        self.send(&midi::control_message(channel, CC_BANK_SELECT_LSB, self.session.bank_lsb));
        self.send(&midi::program_message(channel, self.session.program));
    }

    /// Close the held output, open the port at `index`, and re-apply the
    /// current program/bank so the new device reflects the prior selection.
    /// On failure the router is left without a primary output.
    pub fn change_output_device(&mut self, index: usize) -> Result<(), String> {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.set_primary(None);
        }
        self.output_name = None;

        let (name, conn) = ports::open_output(index)?;
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.set_primary(Some(Box::new(conn)));
        }
        self.output_name = Some(name.clone());
        self.apply_program();
        emit(&self.events, ControllerEvent::OutputDeviceChanged { name });
        Ok(())
    }

    /// Close the held input and connect the port at `index`. Received bytes
    /// are forwarded verbatim to the output stack (MIDI-thru).
    pub fn change_input_device(&mut self, index: usize) -> Result<(), String> {
        self.input = None;
        self.input_name = None;

        let outputs = Arc::clone(&self.outputs);
        let (name, conn) = ports::open_input(index, move |_timestamp, bytes| {
            if let Ok(mut outputs) = outputs.lock() {
                outputs.send(bytes);
            }
        })?;
        self.input = Some(conn);
        self.input_name = Some(name.clone());
        emit(&self.events, ControllerEvent::InputDeviceChanged { name });
        Ok(())
    }

    /// Install a virtual mirror port. Returns `false` when the platform has
    /// no virtual-port capability — the feature is simply disabled.
    pub fn enable_virtual_output(&mut self, port_name: &str) -> bool {
        match ports::create_virtual_output(port_name) {
            Ok(conn) => {
                if let Ok(mut outputs) = self.outputs.lock() {
                    outputs.set_mirror(Some(Box::new(conn)));
                }
                true
            }
            Err(e) => {
                log::info!(target: "midi", "virtual output disabled: {}", e);
                false
            }
        }
    }

    /// Install an already-open primary sink (embedders, tests).
    pub fn install_primary(&mut self, sink: Box<dyn MidiSink>, name: &str) {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.set_primary(Some(sink));
        }
        self.output_name = Some(name.to_string());
        emit(
            &self.events,
            ControllerEvent::OutputDeviceChanged { name: name.to_string() },
        );
    }

    /// Install an already-open mirror sink (embedders, tests).
    pub fn install_mirror(&mut self, sink: Box<dyn MidiSink>) {
        if let Ok(mut outputs) = self.outputs.lock() {
            outputs.set_mirror(Some(sink));
        }
    }

    /// Currently sounding notes on the session channel.
    pub fn sounding_pitches(&self) -> Vec<u8> {
        let table = &self.sounding[self.session.channel as usize];
        (0u8..=127).filter(|&n| table[n as usize] > 0).collect()
    }

    /// Display label for the sounding chord; empty when nothing matches.
    pub fn chord_label(&self) -> String {
        chord::display_names(&chord::match_chords(&self.sounding_pitches()))
    }

    // Session accessors for UI-facing code.

    pub fn octave_up(&mut self) -> bool {
        self.session.octave_up()
    }

    pub fn octave_down(&mut self) -> bool {
        self.session.octave_down()
    }

    pub fn transpose_by(&mut self, delta: i32) {
        self.session.transpose_by(delta);
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.session.set_channel(channel);
    }

    pub fn set_layout(&mut self, layout: tangent_types::Layout) {
        self.session.layout = layout;
    }

    /// Replacing the key map builds a new immutable instance; callers also
    /// rebuild their key state.
    pub fn set_keymap(&mut self, keymap: tangent_types::KeyMap) {
        self.session.keymap = keymap;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::controller_channel;
    use crate::midi::CaptureSink;
    use crossbeam_channel::Receiver;

    fn test_router() -> (MidiRouter, crate::midi::CaptureHandle, Receiver<ControllerEvent>) {
        let (tx, rx) = controller_channel();
        let mut router = MidiRouter::new(SessionState::default(), tx);
        let sink = CaptureSink::new();
        let handle = sink.handle();
        router.install_primary(Box::new(sink), "capture");
        let _ = rx.try_recv(); // drop the install notification
        (router, handle, rx)
    }

    #[test]
    fn note_on_off_sends_and_tracks() {
        let (mut router, handle, rx) = test_router();
        router.note_on_off(60, 100);
        assert_eq!(handle.messages(), vec![vec![0x91, 60, 100]]);
        assert_eq!(router.sounding_pitches(), vec![60]);
        assert!(matches!(
            rx.try_recv(),
            Ok(ControllerEvent::NoteChanged { note: 60, velocity: 100 })
        ));

        router.note_on_off(60, 0);
        assert!(router.sounding_pitches().is_empty());
        assert_eq!(handle.len(), 2);
    }

    #[test]
    fn change_program_emits_bank_then_program() {
        let (mut router, handle, rx) = test_router();
        router.change_program(5, 0, 1);
        assert_eq!(
            handle.messages(),
            vec![
                vec![0xB1, 0x00, 0],
                vec![0xB1, 0x20, 1],
                vec![0xC1, 5],
            ]
        );
        assert!(matches!(
            rx.try_recv(),
            Ok(ControllerEvent::ProgramChanged { program: 5, bank_msb: 0, bank_lsb: 1 })
        ));
        assert_eq!(router.session().program, 5);
        assert_eq!(router.session().bank_lsb, 1);
    }

    #[test]
    fn mirror_receives_every_message() {
        let (mut router, primary, _rx) = test_router();
        let mirror = CaptureSink::new();
        let mirror_handle = mirror.handle();
        router.install_mirror(Box::new(mirror));

        router.note_on_off(72, 90);
        router.change_program(10, 2, 3);

        assert_eq!(primary.messages(), mirror_handle.messages());
        assert_eq!(mirror_handle.len(), 4);
    }

    #[test]
    fn sounding_table_is_per_channel() {
        let (mut router, _handle, _rx) = test_router();
        router.note_on_off(60, 100);
        router.set_channel(5);
        assert!(router.sounding_pitches().is_empty());
        router.note_on_off(64, 80);
        assert_eq!(router.sounding_pitches(), vec![64]);
    }

    #[test]
    fn chord_label_reflects_sounding_notes() {
        let (mut router, _handle, _rx) = test_router();
        for note in [60, 64, 67] {
            router.note_on_off(note, 100);
        }
        assert_eq!(router.chord_label(), "C");
        router.note_on_off(64, 0);
        router.note_on_off(67, 0);
        assert_eq!(router.chord_label(), "");
    }

    #[test]
    fn input_open_failure_is_recoverable() {
        let (mut router, handle, _rx) = test_router();
        assert!(router.change_input_device(usize::MAX).is_err());
        assert!(router.input_name().is_none());
        // The output path is unaffected.
        router.note_on_off(60, 100);
        assert_eq!(handle.len(), 1);
    }

    #[test]
    fn open_failure_leaves_router_deviceless_not_crashed() {
        let (mut router, _handle, _rx) = test_router();
        // Port index far beyond anything the system can have.
        let result = router.change_output_device(usize::MAX);
        assert!(result.is_err());
        assert!(router.output_name().is_none());
        // The router still routes; sends just drop.
        router.note_on_off(60, 100);
    }
}

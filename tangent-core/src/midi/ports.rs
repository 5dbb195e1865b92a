//! midir port enumeration and connection.
//!
//! midir consumes the client object on connect, so each operation creates a
//! fresh client. Opens are synchronous; the input thread accepts the
//! latency.

use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

const CLIENT_NAME: &str = "tangent";

/// An available MIDI port.
#[derive(Debug, Clone)]
pub struct MidiPortInfo {
    pub index: usize,
    pub name: String,
}

/// Available output ports. Enumeration failure reads as "no ports".
pub fn list_outputs() -> Vec<MidiPortInfo> {
    let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) else {
        return Vec::new();
    };
    midi_out
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_out
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index, name })
        })
        .collect()
}

/// Available input ports.
pub fn list_inputs() -> Vec<MidiPortInfo> {
    let Ok(midi_in) = MidiInput::new(CLIENT_NAME) else {
        return Vec::new();
    };
    midi_in
        .ports()
        .iter()
        .enumerate()
        .filter_map(|(index, port)| {
            midi_in
                .port_name(port)
                .ok()
                .map(|name| MidiPortInfo { index, name })
        })
        .collect()
}

/// Open the output port at `index`. Returns the port name and connection.
pub fn open_output(index: usize) -> Result<(String, MidiOutputConnection), String> {
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
    let ports = midi_out.ports();
    let port = ports
        .get(index)
        .ok_or_else(|| format!("invalid output port index: {}", index))?;
    let name = midi_out
        .port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());
    let conn = midi_out
        .connect(port, "tangent-output")
        .map_err(|e| e.to_string())?;
    Ok((name, conn))
}

/// Open the input port at `index`. `callback` receives the driver timestamp
/// and the raw bytes of every incoming message.
pub fn open_input<F>(index: usize, mut callback: F) -> Result<(String, MidiInputConnection<()>), String>
where
    F: FnMut(u64, &[u8]) + Send + 'static,
{
    let midi_in = MidiInput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
    let ports = midi_in.ports();
    let port = ports
        .get(index)
        .ok_or_else(|| format!("invalid input port index: {}", index))?;
    let name = midi_in
        .port_name(port)
        .unwrap_or_else(|_| "Unknown".to_string());
    let conn = midi_in
        .connect(
            port,
            "tangent-input",
            move |timestamp, message, _| callback(timestamp, message),
            (),
        )
        .map_err(|e| e.to_string())?;
    Ok((name, conn))
}

/// Create a virtual output port other software can connect to. Only
/// unix-family backends offer the capability; elsewhere the caller treats
/// the error as "feature disabled", not a fault.
#[cfg(unix)]
pub fn create_virtual_output(port_name: &str) -> Result<MidiOutputConnection, String> {
    use midir::os::unix::VirtualOutput;
    let midi_out = MidiOutput::new(CLIENT_NAME).map_err(|e| e.to_string())?;
    midi_out.create_virtual(port_name).map_err(|e| e.to_string())
}

#[cfg(not(unix))]
pub fn create_virtual_output(_port_name: &str) -> Result<MidiOutputConnection, String> {
    Err("virtual ports are not supported on this platform".to_string())
}

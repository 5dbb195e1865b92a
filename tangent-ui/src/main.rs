mod keys;

use std::fs::File;
use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::{execute, terminal};

use tangent_core::config::Config;
use tangent_core::engine::Engine;
use tangent_core::events::{controller_channel, ControllerEvent, EventReceiver};
use tangent_core::midi::ports;
use tangent_core::playback::SongCompiler;
use tangent_types::{chord, Song};

use keys::ReleaseTracker;

/// How long after the last auto-repeat a key counts as released, on
/// terminals without release events.
const RELEASE_TIMEOUT: Duration = Duration::from_millis(150);

/// The macro compiler is an external collaborator; this build ships without
/// one. Compile requests fail recoverably and the slot stays untouched.
struct UnavailableCompiler;

impl SongCompiler for UnavailableCompiler {
    fn compile(&self, _source: &str) -> Result<Song, String> {
        Err("no macro compiler is configured in this build".to_string())
    }
}

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("tangent")
        .join("tangent.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = File::create(&log_path)
        .unwrap_or_else(|_| File::create("/tmp/tangent.log").expect("Cannot create log file"));

    WriteLogger::init(log_level, simplelog::Config::default(), log_file)
        .expect("Failed to initialize logger");

    log::info!("tangent starting (log level: {:?})", log_level);
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let output_ports = ports::list_outputs();
    if output_ports.is_empty() {
        eprintln!("No MIDI output device was found.");
        log::error!(target: "midi", "no MIDI output device; exiting");
        std::process::exit(1);
    }

    let config = Config::load();
    let (events_tx, events_rx) = controller_channel();
    let mut engine = Engine::new(config.session(), Arc::new(UnavailableCompiler), events_tx);

    if let Err(e) = engine.change_output_device(0) {
        eprintln!("Could not open MIDI output: {}", e);
        log::error!(target: "midi", "startup output open failed: {}", e);
        std::process::exit(1);
    }
    if config.virtual_port_enabled() {
        engine.enable_virtual_output(&config.virtual_port_name());
    }

    println!("tangent — computer-keyboard MIDI instrument");
    for port in &output_ports {
        println!("  output {}: {}", port.index, port.name);
    }
    println!("Keys play notes. Up/Down: octave, Left/Right: transpose,");
    println!("Tab: macro entry, Esc: quit.");

    terminal::enable_raw_mode()?;
    let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let result = run(&mut engine, &events_rx, enhanced);

    if enhanced {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    terminal::disable_raw_mode()?;
    result
}

fn run(engine: &mut Engine, events_rx: &EventReceiver, enhanced: bool) -> std::io::Result<()> {
    let mut releases = ReleaseTracker::new(RELEASE_TIMEOUT);
    let mut macro_entry: Option<String> = None;

    loop {
        if event::poll(Duration::from_millis(5))? {
            if let Event::Key(key) = event::read()? {
                if handle_key_event(engine, &mut releases, &mut macro_entry, key) {
                    break;
                }
            }
        }

        // Without release events, a key is up once its auto-repeat stops.
        if !enhanced {
            for code in releases.expired(Instant::now()) {
                engine.handle_key(code, false);
            }
        }

        engine.tick();
        for event in events_rx.try_iter() {
            show_event(engine, &event);
        }
    }

    // Nothing may be left sounding on exit.
    for code in releases.drain() {
        engine.handle_key(code, false);
    }
    engine.tick();
    Ok(())
}

/// Returns `true` when the user asked to quit.
fn handle_key_event(
    engine: &mut Engine,
    releases: &mut ReleaseTracker,
    macro_entry: &mut Option<String>,
    key: KeyEvent,
) -> bool {
    // Macro-entry line mode: collect text, Enter submits to slot 0.
    if let Some(buffer) = macro_entry {
        if key.kind != KeyEventKind::Press && key.kind != KeyEventKind::Repeat {
            return false;
        }
        match key.code {
            KeyCode::Esc => {
                *macro_entry = None;
                status_line("macro entry cancelled");
            }
            KeyCode::Enter => {
                let text = buffer.clone();
                *macro_entry = None;
                engine.execute(&text, 0);
                status_line(&format!("compiling: {}", text));
            }
            KeyCode::Backspace => {
                buffer.pop();
                status_line(&format!("macro> {}", buffer));
            }
            KeyCode::Char(c) => {
                buffer.push(c);
                status_line(&format!("macro> {}", buffer));
            }
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Up if key.kind == KeyEventKind::Press => {
            if engine.octave_up() {
                status_line(&format!("octave {}", engine.router().session().octave));
            }
        }
        KeyCode::Down if key.kind == KeyEventKind::Press => {
            if engine.octave_down() {
                status_line(&format!("octave {}", engine.router().session().octave));
            }
        }
        KeyCode::Left if key.kind == KeyEventKind::Press => {
            engine.transpose_by(-1);
            status_line(&format!("transpose {}", engine.router().session().transpose));
        }
        KeyCode::Right if key.kind == KeyEventKind::Press => {
            engine.transpose_by(1);
            status_line(&format!("transpose {}", engine.router().session().transpose));
        }
        KeyCode::Tab if key.kind == KeyEventKind::Press => {
            *macro_entry = Some(String::new());
            status_line("macro> ");
        }
        KeyCode::Char(c) => match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                engine.handle_key(c, true);
                releases.touch(c, Instant::now());
            }
            KeyEventKind::Release => {
                engine.handle_key(c, false);
                releases.release(c);
            }
        },
        _ => {}
    }
    false
}

fn show_event(engine: &Engine, event: &ControllerEvent) {
    match event {
        ControllerEvent::NoteChanged { note, velocity } => {
            if *velocity > 0 {
                let octave = i32::from(*note) / 12 - 1;
                let label = engine.chord_label();
                if label.is_empty() {
                    status_line(&format!("{}{}", chord::note_name(*note), octave));
                } else {
                    status_line(&format!("{}{}  [{}]", chord::note_name(*note), octave, label));
                }
            }
        }
        ControllerEvent::OutputDeviceChanged { name } => {
            status_line(&format!("output: {}", name));
        }
        ControllerEvent::InputDeviceChanged { name } => {
            status_line(&format!("input: {}", name));
        }
        ControllerEvent::ProgramChanged { program, bank_msb, bank_lsb } => {
            status_line(&format!("program {} (bank {}:{})", program, bank_msb, bank_lsb));
        }
        ControllerEvent::ListingChanged { slot, song } => {
            status_line(&format!("slot {} playing ({} events)", slot, song.events.len()));
        }
        ControllerEvent::PlaybackFailed { slot, message } => {
            status_line(&format!("slot {} compile failed: {}", slot, message));
        }
    }
}

/// One status line in raw mode: carriage return + newline, flushed.
fn status_line(text: &str) {
    let mut out = stdout();
    let _ = write!(out, "{}\r\n", text);
    let _ = out.flush();
}

//! # tangent-core
//!
//! Engine library for the tangent keyboard instrument: MIDI routing,
//! session state, chord display, and macro playback sessions — independent
//! of any UI framework.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tangent_core::config::Config;
//! use tangent_core::engine::Engine;
//! use tangent_core::events::controller_channel;
//!
//! // 1. Load config (embedded defaults + user override)
//! let config = Config::load();
//!
//! // 2. Create the notification channel and the engine
//! let (events_tx, events_rx) = controller_channel();
//! let mut engine = Engine::new(config.session(), compiler, events_tx);
//!
//! // 3. Connect a MIDI output (fatal at startup if none exists)
//! engine.change_output_device(0)?;
//! engine.enable_virtual_output(&config.virtual_port_name());
//!
//! // 4. Feed key transitions from the input loop
//! engine.handle_key('A', true);
//! engine.handle_key('A', false);
//!
//! // 5. Each loop iteration: apply playback completions, drain events
//! engine.tick();
//! while let Ok(event) = events_rx.try_recv() { /* display */ }
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] — TOML configuration (embedded defaults + user override)
//! - [`session`] — the consolidated channel/program/octave/transpose state
//! - [`midi`] — wire-message builders, sink trait, output fan-out, ports
//! - [`router`] — `MidiRouter`: device handles, sounding notes, thru
//! - [`player`] — asynchronous playback of one compiled song
//! - [`playback`] — compiler collaborator and the per-slot player registry
//! - [`engine`] — the single coordinating facade for the input thread
//! - [`events`] — notifications for UI observers

pub mod config;
pub mod engine;
pub mod events;
pub mod midi;
pub mod playback;
pub mod player;
pub mod router;
pub mod session;

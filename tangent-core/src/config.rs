//! TOML configuration: embedded defaults plus an optional user override at
//! `<config_dir>/tangent/config.toml`. Malformed user config is logged and
//! ignored; the embedded file is authoritative for anything unset.

use std::path::PathBuf;

use serde::Deserialize;

use tangent_types::{KeyMap, Layout};

use crate::session::SessionState;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    defaults: DefaultsConfig,
    #[serde(default)]
    runtime: RuntimeConfig,
}

#[derive(Deserialize, Default)]
struct DefaultsConfig {
    channel: Option<u8>,
    octave: Option<u8>,
    transpose: Option<i32>,
    velocity: Option<u8>,
    layout: Option<String>,
    keymap: Option<String>,
    custom_name: Option<String>,
    custom_low: Option<String>,
    custom_high: Option<String>,
}

#[derive(Deserialize, Default)]
struct RuntimeConfig {
    virtual_port: Option<bool>,
    virtual_port_name: Option<String>,
}

pub struct Config {
    defaults: DefaultsConfig,
    runtime: RuntimeConfig,
}

impl Config {
    pub fn load() -> Self {
        let mut base: ConfigFile =
            toml::from_str(DEFAULT_CONFIG).expect("Failed to parse embedded config.toml");

        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_defaults(&mut base.defaults, user.defaults);
                            merge_runtime(&mut base.runtime, user.runtime);
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            defaults: base.defaults,
            runtime: base.runtime,
        }
    }

    /// Initial session state from the merged configuration. Unparseable
    /// values fall back to the session defaults.
    pub fn session(&self) -> SessionState {
        let fallback = SessionState::default();
        SessionState {
            channel: self.defaults.channel.map(|c| c & 0x0F).unwrap_or(fallback.channel),
            program: fallback.program,
            bank_msb: fallback.bank_msb,
            bank_lsb: fallback.bank_lsb,
            octave: self
                .defaults
                .octave
                .map(|o| o.min(crate::session::MAX_OCTAVE))
                .unwrap_or(fallback.octave),
            transpose: self.defaults.transpose.unwrap_or(fallback.transpose),
            velocity: self.defaults.velocity.map(|v| v & 0x7F).unwrap_or(fallback.velocity),
            layout: self
                .defaults
                .layout
                .as_deref()
                .and_then(parse_layout)
                .unwrap_or(fallback.layout),
            keymap: self.keymap().unwrap_or(fallback.keymap),
        }
    }

    fn keymap(&self) -> Option<KeyMap> {
        match self.defaults.keymap.as_deref() {
            Some("us101") | Some("US101") => Some(KeyMap::us101()),
            Some("jp106") | Some("JP106") => Some(KeyMap::jp106()),
            Some("custom") => {
                let name = self.defaults.custom_name.as_deref().unwrap_or("custom");
                let low = self.defaults.custom_low.as_deref()?;
                let high = self.defaults.custom_high.as_deref()?;
                match KeyMap::from_specs(name, low, high) {
                    Ok(map) => Some(map),
                    Err(e) => {
                        log::warn!(target: "config", "ignoring custom key map: {}", e);
                        None
                    }
                }
            }
            Some(other) => {
                log::warn!(target: "config", "unknown keymap {:?}", other);
                None
            }
            None => None,
        }
    }

    pub fn virtual_port_enabled(&self) -> bool {
        self.runtime.virtual_port.unwrap_or(true)
    }

    pub fn virtual_port_name(&self) -> String {
        self.runtime
            .virtual_port_name
            .clone()
            .unwrap_or_else(|| "Tangent Input Port".to_string())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tangent").join("config.toml"))
}

fn merge_defaults(base: &mut DefaultsConfig, user: DefaultsConfig) {
    if user.channel.is_some() {
        base.channel = user.channel;
    }
    if user.octave.is_some() {
        base.octave = user.octave;
    }
    if user.transpose.is_some() {
        base.transpose = user.transpose;
    }
    if user.velocity.is_some() {
        base.velocity = user.velocity;
    }
    if user.layout.is_some() {
        base.layout = user.layout;
    }
    if user.keymap.is_some() {
        base.keymap = user.keymap;
    }
    if user.custom_name.is_some() {
        base.custom_name = user.custom_name;
    }
    if user.custom_low.is_some() {
        base.custom_low = user.custom_low;
    }
    if user.custom_high.is_some() {
        base.custom_high = user.custom_high;
    }
}

fn merge_runtime(base: &mut RuntimeConfig, user: RuntimeConfig) {
    if user.virtual_port.is_some() {
        base.virtual_port = user.virtual_port;
    }
    if user.virtual_port_name.is_some() {
        base.virtual_port_name = user.virtual_port_name;
    }
}

fn parse_layout(s: &str) -> Option<Layout> {
    match s.to_lowercase().as_str() {
        "piano" => Some(Layout::Piano),
        "chromatic" => Some(Layout::Chromatic),
        _ => None,
    }
}

//! Scripted input traces.
//!
//! A script is a TOML document with an optional `[config]` table (an
//! [`InputConfig`]), a `[session]` table describing the view, and a list of
//! `[[event]]` entries replayed in order:
//!
//! ```toml
//! [session]
//! surface = [1024.0, 768.0]
//! viewport = [512.0, 384.0]
//!
//! [[event]]
//! kind = "pointer"
//! t = 0
//! x = 50.0
//! y = 50.0
//! phase = "down"
//!
//! [[event]]
//! kind = "tick"
//! t = 600
//! ```

use rdp_input::{
    HostKeyEvent, InputConfig, InputError, KeyPhase, MetaState, PointerEvent, PointerPhase,
    SessionCommand, SessionInputCoordinator,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Upper bound on timers fired while draining, in case a timer keeps rescheduling.
const MAX_DRAIN_STEPS: usize = 10_000;

/// A complete replay script.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Script {
    pub config: Option<InputConfig>,
    pub session: SessionSetup,
    #[serde(rename = "event")]
    pub events: Vec<ScriptEvent>,
}

/// Initial view state.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSetup {
    pub surface: [f32; 2],
    pub viewport: [f32; 2],
    pub scale: f32,
    pub scroll: [f32; 2],
    pub overlay: bool,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            surface: [1024.0, 768.0],
            viewport: [1024.0, 768.0],
            scale: 1.0,
            scroll: [0.0, 0.0],
            overlay: false,
        }
    }
}

/// One scripted step. `t` is the timestamp in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ScriptEvent {
    Pointer {
        t: u64,
        #[serde(default)]
        id: u32,
        x: f32,
        y: f32,
        phase: PointerPhase,
    },
    Key {
        t: u64,
        #[serde(default)]
        code: u32,
        #[serde(default)]
        meta: MetaState,
        #[serde(default)]
        unicode: u32,
        #[serde(default = "default_key_phase")]
        phase: KeyPhase,
        #[serde(default)]
        characters: String,
    },
    OverlayKey {
        t: u64,
        code: u32,
    },
    Wheel {
        t: u64,
        delta: f32,
    },
    Tick {
        t: u64,
    },
    Overlay {
        t: u64,
        visible: bool,
    },
    Viewport {
        t: u64,
        width: f32,
        height: f32,
    },
    ClearModifiers {
        t: u64,
    },
}

fn default_key_phase() -> KeyPhase {
    KeyPhase::Down
}

impl ScriptEvent {
    pub fn timestamp(&self) -> u64 {
        match *self {
            ScriptEvent::Pointer { t, .. }
            | ScriptEvent::Key { t, .. }
            | ScriptEvent::OverlayKey { t, .. }
            | ScriptEvent::Wheel { t, .. }
            | ScriptEvent::Tick { t }
            | ScriptEvent::Overlay { t, .. }
            | ScriptEvent::Viewport { t, .. }
            | ScriptEvent::ClearModifiers { t } => t,
        }
    }
}

/// One output line: a command and the time it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayLine {
    pub t: u64,
    #[serde(flatten)]
    pub command: SessionCommand,
}

impl Script {
    pub fn from_toml_str(s: &str) -> Result<Self, InputError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Build a coordinator for this script's view setup.
    pub fn coordinator(&self, config: InputConfig) -> SessionInputCoordinator {
        let s = &self.session;
        let mut coordinator = SessionInputCoordinator::new(config);
        coordinator.set_surface_size(s.surface[0], s.surface[1]);
        coordinator.set_viewport_size(s.viewport[0], s.viewport[1]);
        coordinator.set_scale(s.scale);
        coordinator.set_scroll_offset(s.scroll[0], s.scroll[1]);
        coordinator.show_overlay(s.overlay);
        coordinator
    }

    /// Replay every event and return the produced commands.
    ///
    /// With `drain`, timers still pending after the last event are fired too.
    pub fn replay(&self, config: InputConfig, drain: bool) -> Vec<ReplayLine> {
        let mut coordinator = self.coordinator(config);
        let mut lines = Vec::new();
        info!("Replaying {} events", self.events.len());

        for event in &self.events {
            let t = event.timestamp();
            let commands = apply(&mut coordinator, event);
            debug!("t={} {:?} -> {} commands", t, event, commands.len());
            lines.extend(commands.into_iter().map(|command| ReplayLine { t, command }));
        }

        if drain {
            for _ in 0..MAX_DRAIN_STEPS {
                let Some(t) = coordinator.next_deadline() else {
                    break;
                };
                let commands = coordinator.tick(t);
                lines.extend(commands.into_iter().map(|command| ReplayLine { t, command }));
            }
        }
        lines
    }
}

fn apply(coordinator: &mut SessionInputCoordinator, event: &ScriptEvent) -> Vec<SessionCommand> {
    match event {
        ScriptEvent::Pointer { t, id, x, y, phase } => {
            coordinator.handle_pointer_event(&PointerEvent::new(*id, *x, *y, *t, *phase))
        }
        ScriptEvent::Key {
            t,
            code,
            meta,
            unicode,
            phase,
            characters,
        } => {
            let mut out = coordinator.tick(*t);
            out.extend(coordinator.handle_key_event(&HostKeyEvent {
                key_code: *code,
                meta: *meta,
                unicode_char: *unicode,
                phase: *phase,
                characters: characters.clone(),
            }));
            out
        }
        ScriptEvent::OverlayKey { t, code } => coordinator.handle_overlay_key(*code, *t),
        ScriptEvent::Wheel { t, delta } => coordinator.handle_wheel(*delta, *t),
        ScriptEvent::Tick { t } => coordinator.tick(*t),
        ScriptEvent::Overlay { t, visible } => {
            let mut out = coordinator.tick(*t);
            out.extend(coordinator.show_overlay(*visible));
            out
        }
        ScriptEvent::Viewport { t, width, height } => {
            let out = coordinator.tick(*t);
            coordinator.set_viewport_size(*width, *height);
            out
        }
        ScriptEvent::ClearModifiers { t } => {
            let mut out = coordinator.tick(*t);
            out.extend(coordinator.clear_all_modifiers());
            out
        }
    }
}

//! Configuration types for the input engine.
//!
//! Values come from an external settings store, usually as a TOML document.
//! Out-of-range values are clamped to safe defaults by [`InputConfig::sanitized`]
//! rather than rejected.

use crate::errors::InputError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Default long-press threshold in milliseconds.
pub const DEFAULT_LONG_PRESS_TIMEOUT_MS: i64 = 500;
/// Display density assumed when the host does not report one.
pub const DEFAULT_DPI: f32 = 160.0;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Send right-button events where the left button would be sent and vice versa.
    pub swap_mouse_buttons: bool,
    /// Reverse the direction of every scroll event.
    pub invert_scrolling: bool,
    /// Hold time before a press turns into a long press (drag).
    pub long_press_timeout_ms: i64,
    /// Scroll the viewport while the touch pointer is dragged past its edges.
    pub auto_scroll_enabled: bool,
    /// Horizontal display density, used to size the pinch threshold.
    pub dpi_x: f32,
    /// Vertical display density.
    pub dpi_y: f32,
    /// Gesture timing and distance constants.
    pub timings: GestureTimings,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            swap_mouse_buttons: false,
            invert_scrolling: false,
            long_press_timeout_ms: DEFAULT_LONG_PRESS_TIMEOUT_MS,
            auto_scroll_enabled: false,
            dpi_x: DEFAULT_DPI,
            dpi_y: DEFAULT_DPI,
            timings: GestureTimings::default(),
        }
    }
}

/// Empirically chosen gesture constants. All overridable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureTimings {
    /// Window in which a second finger must land for a dual-touch gesture,
    /// and the maximum gap between the two fingers lifting.
    pub second_pointer_window_ms: u64,
    /// Window in which a two-finger touch still counts as a tap.
    pub two_finger_tap_window_ms: u64,
    /// Sub-threshold move samples needed before a dual touch becomes a scroll.
    pub scroll_evidence_samples: u32,
    /// Finger distance change (cm) that turns a dual touch into a pinch.
    pub pinch_distance_cm: f32,
    /// Vertical distance per scroll tick, in view pixels.
    pub scroll_tick_px: f32,
    /// Double-tap window for toggle modifiers to lock.
    pub modifier_lock_window_ms: u64,
    /// Window between an up and the next down for a double tap.
    pub double_tap_timeout_ms: u64,
    /// Distance a finger may travel before a tap becomes a scroll.
    pub touch_slop_px: f32,
    /// Maximum distance between the two taps of a double tap.
    pub double_tap_slop_px: f32,
    /// Minimum release velocity (px/s) for a fling.
    pub min_fling_velocity: f32,
    /// Release velocities are capped to this value (px/s).
    pub max_fling_velocity: f32,
    /// Debounce delay for coalesced move events.
    pub move_debounce_ms: u64,
    /// Superseded moves tolerated before a move is sent immediately.
    pub max_discarded_moves: u32,
    /// Interval between auto-scroll steps.
    pub auto_scroll_interval_ms: u64,
    /// Viewport distance moved per auto-scroll step.
    pub auto_scroll_step_px: f32,
    /// How long click feedback stays on the touch pointer.
    pub pointer_feedback_ms: u64,
    /// A touch sequence with no event for this long is abandoned when a new
    /// finger lands, as its pointer-up was lost.
    pub stale_pointer_timeout_ms: u64,
}

impl Default for GestureTimings {
    fn default() -> Self {
        Self {
            second_pointer_window_ms: 100,
            two_finger_tap_window_ms: 1000,
            scroll_evidence_samples: 20,
            pinch_distance_cm: 0.5,
            scroll_tick_px: 10.0,
            modifier_lock_window_ms: 800,
            double_tap_timeout_ms: 300,
            touch_slop_px: 8.0,
            double_tap_slop_px: 100.0,
            min_fling_velocity: 50.0,
            max_fling_velocity: 8000.0,
            move_debounce_ms: 150,
            max_discarded_moves: 3,
            auto_scroll_interval_ms: 50,
            auto_scroll_step_px: 20.0,
            pointer_feedback_ms: 150,
            stale_pointer_timeout_ms: 1000,
        }
    }
}

impl InputConfig {
    /// Create a new configuration builder.
    pub fn builder() -> InputConfigBuilder {
        InputConfigBuilder::default()
    }

    /// Parse a TOML document. Missing fields take their defaults; the result is sanitized.
    pub fn from_toml_str(s: &str) -> Result<Self, InputError> {
        let config: InputConfig = toml::from_str(s)?;
        Ok(config.sanitized())
    }

    /// Load and sanitize a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| InputError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Clamp out-of-range values to safe defaults.
    pub fn sanitized(mut self) -> Self {
        let defaults = GestureTimings::default();

        if self.long_press_timeout_ms <= 0 {
            warn!(
                "long_press_timeout_ms={} out of range, using {}",
                self.long_press_timeout_ms, DEFAULT_LONG_PRESS_TIMEOUT_MS
            );
            self.long_press_timeout_ms = DEFAULT_LONG_PRESS_TIMEOUT_MS;
        }
        if !(self.dpi_x.is_finite() && self.dpi_x > 0.0) {
            warn!("dpi_x={} out of range, using {}", self.dpi_x, DEFAULT_DPI);
            self.dpi_x = DEFAULT_DPI;
        }
        if !(self.dpi_y.is_finite() && self.dpi_y > 0.0) {
            warn!("dpi_y={} out of range, using {}", self.dpi_y, DEFAULT_DPI);
            self.dpi_y = DEFAULT_DPI;
        }

        let t = &mut self.timings;
        let d = &defaults;
        clamp_nonzero(
            "second_pointer_window_ms",
            &mut t.second_pointer_window_ms,
            d.second_pointer_window_ms,
        );
        clamp_nonzero(
            "two_finger_tap_window_ms",
            &mut t.two_finger_tap_window_ms,
            d.two_finger_tap_window_ms,
        );
        clamp_nonzero(
            "modifier_lock_window_ms",
            &mut t.modifier_lock_window_ms,
            d.modifier_lock_window_ms,
        );
        clamp_nonzero(
            "double_tap_timeout_ms",
            &mut t.double_tap_timeout_ms,
            d.double_tap_timeout_ms,
        );
        clamp_nonzero("move_debounce_ms", &mut t.move_debounce_ms, d.move_debounce_ms);
        clamp_nonzero(
            "auto_scroll_interval_ms",
            &mut t.auto_scroll_interval_ms,
            d.auto_scroll_interval_ms,
        );
        clamp_nonzero(
            "stale_pointer_timeout_ms",
            &mut t.stale_pointer_timeout_ms,
            d.stale_pointer_timeout_ms,
        );
        if t.scroll_evidence_samples == 0 {
            warn!(
                "scroll_evidence_samples=0 out of range, using {}",
                d.scroll_evidence_samples
            );
            t.scroll_evidence_samples = d.scroll_evidence_samples;
        }
        clamp_positive("pinch_distance_cm", &mut t.pinch_distance_cm, d.pinch_distance_cm);
        clamp_positive("scroll_tick_px", &mut t.scroll_tick_px, d.scroll_tick_px);
        clamp_positive("touch_slop_px", &mut t.touch_slop_px, d.touch_slop_px);
        clamp_positive("double_tap_slop_px", &mut t.double_tap_slop_px, d.double_tap_slop_px);
        clamp_positive("min_fling_velocity", &mut t.min_fling_velocity, d.min_fling_velocity);
        clamp_positive("auto_scroll_step_px", &mut t.auto_scroll_step_px, d.auto_scroll_step_px);
        if !(t.max_fling_velocity.is_finite() && t.max_fling_velocity >= t.min_fling_velocity) {
            warn!(
                "max_fling_velocity={} out of range, using {}",
                t.max_fling_velocity, d.max_fling_velocity
            );
            t.max_fling_velocity = d.max_fling_velocity.max(t.min_fling_velocity);
        }
        self
    }

    /// Long-press threshold as an unsigned delay (call on a sanitized config).
    pub fn long_press_timeout(&self) -> u64 {
        if self.long_press_timeout_ms > 0 {
            self.long_press_timeout_ms as u64
        } else {
            DEFAULT_LONG_PRESS_TIMEOUT_MS as u64
        }
    }
}

fn clamp_nonzero(name: &str, value: &mut u64, default: u64) {
    if *value == 0 {
        warn!("{}=0 out of range, using {}", name, default);
        *value = default;
    }
}

fn clamp_positive(name: &str, value: &mut f32, default: f32) {
    if !(value.is_finite() && *value > 0.0) {
        warn!("{}={} out of range, using {}", name, value, default);
        *value = default;
    }
}

/// Builder for [`InputConfig`].
#[derive(Debug, Default)]
pub struct InputConfigBuilder {
    config: InputConfig,
}

impl InputConfigBuilder {
    pub fn swap_mouse_buttons(mut self, swap: bool) -> Self {
        self.config.swap_mouse_buttons = swap;
        self
    }

    pub fn invert_scrolling(mut self, invert: bool) -> Self {
        self.config.invert_scrolling = invert;
        self
    }

    pub fn long_press_timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.config.long_press_timeout_ms = timeout_ms;
        self
    }

    pub fn auto_scroll_enabled(mut self, enabled: bool) -> Self {
        self.config.auto_scroll_enabled = enabled;
        self
    }

    /// Set the display density used for the pinch threshold.
    pub fn dpi(mut self, dpi_x: f32, dpi_y: f32) -> Self {
        self.config.dpi_x = dpi_x;
        self.config.dpi_y = dpi_y;
        self
    }

    pub fn timings(mut self, timings: GestureTimings) -> Self {
        self.config.timings = timings;
        self
    }

    /// Build the configuration, clamping out-of-range values.
    pub fn build(self) -> InputConfig {
        self.config.sanitized()
    }
}

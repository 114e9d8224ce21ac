//! One-finger gesture recognition.
//!
//! Follows the classic touch-screen gesture model: a press that stays within
//! the touch slop and lifts is a tap, two taps close in time and space are a
//! double tap, a press held past the long-press timeout starts a drag, and a
//! press that travels beyond the slop scrolls (and may end in a fling).
//!
//! Unlike the usual model, moves during a long press are reported as scrolls
//! (the drag) and the release of a long press is reported separately.

use crate::config::InputConfig;
use crate::events::{PointerEvent, PointerPhase, PointerSample};
use crate::timer::DelayedCallback;
use rdp_common::PointF;
use tracing::{debug, trace};

/// Only samples this recent contribute to the release velocity.
const VELOCITY_WINDOW_MS: u64 = 100;

/// Semantic one-finger events, positions in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SingleTouchEvent {
    Down {
        position: PointF,
    },
    /// The finger lifted without leaving the touch slop.
    SingleTapUp {
        position: PointF,
    },
    /// Second press of a double tap.
    DoubleTap {
        position: PointF,
    },
    /// The finger was held long enough to start a drag.
    LongPress {
        position: PointF,
    },
    /// The finger lifted after a long press.
    LongPressUp {
        position: PointF,
    },
    /// The finger moved. `distance` is previous minus current position.
    Scroll {
        position: PointF,
        distance_x: f32,
        distance_y: f32,
    },
    /// Release velocity in pixels per second.
    Fling {
        velocity_x: f32,
        velocity_y: f32,
    },
    Up {
        position: PointF,
    },
}

/// Thresholds for one-finger recognition.
#[derive(Debug, Clone)]
pub struct SingleTouchConfig {
    pub long_press_timeout_ms: u64,
    pub double_tap_timeout_ms: u64,
    pub touch_slop_px: f32,
    pub double_tap_slop_px: f32,
    pub min_fling_velocity: f32,
    pub max_fling_velocity: f32,
    /// Silence after which a tracked sequence is presumed to have lost its up.
    pub stale_pointer_timeout_ms: u64,
}

impl SingleTouchConfig {
    pub fn from_input_config(config: &InputConfig) -> Self {
        let t = &config.timings;
        Self {
            long_press_timeout_ms: config.long_press_timeout(),
            double_tap_timeout_ms: t.double_tap_timeout_ms,
            touch_slop_px: t.touch_slop_px,
            double_tap_slop_px: t.double_tap_slop_px,
            min_fling_velocity: t.min_fling_velocity,
            max_fling_velocity: t.max_fling_velocity,
            stale_pointer_timeout_ms: t.stale_pointer_timeout_ms,
        }
    }
}

impl Default for SingleTouchConfig {
    fn default() -> Self {
        Self::from_input_config(&InputConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct PreviousTap {
    down: PointF,
    up_ms: u64,
}

/// Recognizer for one-finger gestures.
#[derive(Debug)]
pub struct SingleTouchGestureRecognizer {
    config: SingleTouchConfig,
    /// First finger of the current sequence.
    primary: Option<u32>,
    /// Every finger currently down.
    pointers: Vec<u32>,
    down_position: PointF,
    last_position: PointF,
    always_in_tap_region: bool,
    in_long_press: bool,
    multi_touch: bool,
    is_double_tapping: bool,
    long_press: DelayedCallback,
    previous_tap: Option<PreviousTap>,
    velocity_samples: Vec<PointerSample>,
    /// Timestamp of the last event of the current sequence.
    last_event_ms: u64,
}

impl Default for SingleTouchGestureRecognizer {
    fn default() -> Self {
        Self::new(SingleTouchConfig::default())
    }
}

impl SingleTouchGestureRecognizer {
    pub fn new(config: SingleTouchConfig) -> Self {
        Self {
            config,
            primary: None,
            pointers: Vec::new(),
            down_position: PointF::default(),
            last_position: PointF::default(),
            always_in_tap_region: false,
            in_long_press: false,
            multi_touch: false,
            is_double_tapping: false,
            long_press: DelayedCallback::new(),
            previous_tap: None,
            velocity_samples: Vec::new(),
            last_event_ms: 0,
        }
    }

    /// True while a long press is held.
    pub fn in_long_press(&self) -> bool {
        self.in_long_press
    }

    /// True while a touch sequence is in progress.
    pub fn is_tracking(&self) -> bool {
        self.primary.is_some()
    }

    /// True if a sequence is tracked but has been silent for longer than the
    /// stale timeout, i.e. its pointer-up never arrived.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.primary.is_some()
            && now_ms.saturating_sub(self.last_event_ms) > self.config.stale_pointer_timeout_ms
    }

    /// Drop the current sequence without reporting anything.
    pub fn cancel_sequence(&mut self) {
        self.reset();
        self.previous_tap = None;
    }

    /// Fire the long-press timer if it is due.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SingleTouchEvent> {
        let mut out = Vec::new();
        if self.long_press.fire_if_due(now_ms).is_some() {
            debug!("Long press at ({:.1}, {:.1})", self.last_position.x, self.last_position.y);
            self.in_long_press = true;
            self.previous_tap = None;
            out.push(SingleTouchEvent::LongPress {
                position: self.last_position,
            });
        }
        out
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.long_press.deadline()
    }

    /// Feed one raw pointer event.
    pub fn handle_event(&mut self, ev: &PointerEvent) -> Vec<SingleTouchEvent> {
        let mut out = self.tick(ev.timestamp_ms);
        match ev.phase {
            PointerPhase::Down => self.on_down(ev, &mut out),
            PointerPhase::Move => self.on_move(ev, &mut out),
            PointerPhase::Up => self.on_up(ev, &mut out),
            PointerPhase::Cancel => {
                trace!("Touch sequence cancelled");
                self.cancel_sequence();
            }
        }
        if self.primary.is_some() {
            self.last_event_ms = ev.timestamp_ms;
        }
        out
    }

    fn on_down(&mut self, ev: &PointerEvent, out: &mut Vec<SingleTouchEvent>) {
        if self.is_stale(ev.timestamp_ms) && !self.pointers.contains(&ev.pointer_id) {
            debug!(
                "No event for {} ms, abandoning sequence with lost pointer-up",
                ev.timestamp_ms.saturating_sub(self.last_event_ms)
            );
            self.cancel_sequence();
        }
        if self.primary.is_some() {
            if !self.pointers.contains(&ev.pointer_id) {
                trace!("Additional finger {} down, tap detection off", ev.pointer_id);
                self.pointers.push(ev.pointer_id);
                self.multi_touch = true;
                self.always_in_tap_region = false;
                self.long_press.cancel();
            }
            return;
        }

        let position = ev.position();
        if let Some(prev) = self.previous_tap.take() {
            let slop = self.config.double_tap_slop_px;
            let within_time =
                ev.timestamp_ms.saturating_sub(prev.up_ms) <= self.config.double_tap_timeout_ms;
            if within_time && prev.down.distance_squared(&position) < slop * slop {
                debug!("Double tap at ({:.1}, {:.1})", position.x, position.y);
                self.is_double_tapping = true;
                out.push(SingleTouchEvent::DoubleTap { position });
            }
        }

        self.primary = Some(ev.pointer_id);
        self.pointers.push(ev.pointer_id);
        self.down_position = position;
        self.last_position = position;
        self.always_in_tap_region = true;
        self.velocity_samples.clear();
        self.velocity_samples.push(ev.sample());
        self.long_press
            .schedule(ev.timestamp_ms, self.config.long_press_timeout_ms, ());
        out.push(SingleTouchEvent::Down { position });
    }

    fn on_move(&mut self, ev: &PointerEvent, out: &mut Vec<SingleTouchEvent>) {
        if self.primary != Some(ev.pointer_id) || self.multi_touch {
            return;
        }
        let position = ev.position();
        self.record_sample(ev.sample());

        let distance_x = self.last_position.x - position.x;
        let distance_y = self.last_position.y - position.y;

        if !self.in_long_press {
            if self.always_in_tap_region {
                let slop = self.config.touch_slop_px;
                if self.down_position.distance_squared(&position) <= slop * slop {
                    return;
                }
                trace!("Left touch slop, scrolling");
                self.always_in_tap_region = false;
                self.long_press.cancel();
            } else if distance_x.abs() < 1.0 && distance_y.abs() < 1.0 {
                return;
            }
        }

        self.last_position = position;
        out.push(SingleTouchEvent::Scroll {
            position,
            distance_x,
            distance_y,
        });
    }

    fn on_up(&mut self, ev: &PointerEvent, out: &mut Vec<SingleTouchEvent>) {
        self.pointers.retain(|id| *id != ev.pointer_id);
        let Some(primary) = self.primary else {
            return;
        };
        if primary == ev.pointer_id {
            self.record_sample(ev.sample());
            self.last_position = ev.position();
        }
        if !self.pointers.is_empty() {
            return;
        }

        self.long_press.cancel();
        let position = self.last_position;
        if self.in_long_press {
            out.push(SingleTouchEvent::LongPressUp { position });
        } else if self.is_double_tapping {
            // The second tap completes the double tap and cannot start another
        } else if !self.multi_touch && self.always_in_tap_region {
            out.push(SingleTouchEvent::SingleTapUp { position });
            self.previous_tap = Some(PreviousTap {
                down: self.down_position,
                up_ms: ev.timestamp_ms,
            });
        } else if !self.multi_touch {
            if let Some((velocity_x, velocity_y)) = self.fling_velocity() {
                debug!("Fling ({:.0}, {:.0}) px/s", velocity_x, velocity_y);
                out.push(SingleTouchEvent::Fling {
                    velocity_x,
                    velocity_y,
                });
            }
        }
        out.push(SingleTouchEvent::Up { position });
        self.reset();
    }

    fn record_sample(&mut self, sample: PointerSample) {
        let horizon = sample.timestamp_ms.saturating_sub(VELOCITY_WINDOW_MS);
        self.velocity_samples.push(sample);
        self.velocity_samples.retain(|s| s.timestamp_ms >= horizon);
    }

    /// Release velocity, if fast enough for a fling. Capped per axis.
    fn fling_velocity(&self) -> Option<(f32, f32)> {
        let first = self.velocity_samples.first()?;
        let last = self.velocity_samples.last()?;
        let dt = last.timestamp_ms.saturating_sub(first.timestamp_ms);
        if dt == 0 {
            return None;
        }
        let dt = dt as f32;
        let max = self.config.max_fling_velocity;
        let delta = last.position - first.position;
        let vx = (delta.x * 1000.0 / dt).clamp(-max, max);
        let vy = (delta.y * 1000.0 / dt).clamp(-max, max);
        let min = self.config.min_fling_velocity;
        (vx.abs() > min || vy.abs() > min).then_some((vx, vy))
    }

    fn reset(&mut self) {
        self.primary = None;
        self.pointers.clear();
        self.always_in_tap_region = false;
        self.in_long_press = false;
        self.multi_touch = false;
        self.is_double_tapping = false;
        self.long_press.cancel();
        self.velocity_samples.clear();
    }
}

//! Two-finger gesture recognition.
//!
//! A dual touch starts when a second finger lands shortly after the first.
//! While undecided, every two-finger move either proves that the finger
//! distance changed (pinch-zoom) or adds to a scroll score; once the score is
//! high enough the gesture becomes a vertical scroll. A gesture that never
//! resolves and ends quickly is a two-finger tap.

use super::scale::ScaleGesture;
use crate::config::InputConfig;
use crate::events::{PointerEvent, PointerPhase, ScrollDirection};
use crate::timer::DelayedCallback;
use rdp_common::PointF;
use tracing::{debug, trace};

const CM_PER_INCH: f32 = 2.54;

/// Semantic two-finger events, positions in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DualTouchEvent {
    /// A second finger joined in time; a dual touch is in progress.
    Begin { position: PointF },
    /// One vertical scroll tick.
    Scroll { direction: ScrollDirection },
    /// The gesture resolved to pinch-zoom.
    ScaleBegin { focus: PointF },
    /// Incremental zoom step.
    Scale { factor: f32, focus: PointF },
    ScaleEnd,
    /// Both fingers lifted quickly without moving apart or scrolling.
    SingleTap { position: PointF },
    /// The dual touch is over. Emitted exactly once per [`DualTouchEvent::Begin`].
    End,
}

/// Resolution of a dual touch. Never reverts once it leaves `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    #[default]
    Unknown,
    Scroll,
    PinchZoom,
}

/// Thresholds for dual-touch recognition.
#[derive(Debug, Clone)]
pub struct DualTouchConfig {
    /// Maximum delay between the two fingers landing, and between them lifting.
    pub second_pointer_window_ms: u64,
    /// A gesture still undecided after this long is no longer a tap.
    pub tap_window_ms: u64,
    /// Sub-threshold moves needed before switching to scroll mode.
    pub scroll_evidence_samples: u32,
    /// Squared change of the per-axis finger distances that means pinch.
    pub pinch_distance_squared: i32,
    /// Vertical travel of the first finger per scroll tick.
    pub scroll_tick_px: f32,
    /// Silence after which tracked fingers are presumed to have lost their up.
    pub stale_pointer_timeout_ms: u64,
}

impl DualTouchConfig {
    /// Derive thresholds from the engine configuration, converting the pinch
    /// distance from centimetres to pixels with the display density.
    pub fn from_input_config(config: &InputConfig) -> Self {
        let t = &config.timings;
        let dx = t.pinch_distance_cm / CM_PER_INCH * config.dpi_x;
        let dy = t.pinch_distance_cm / CM_PER_INCH * config.dpi_y;
        Self {
            second_pointer_window_ms: t.second_pointer_window_ms,
            tap_window_ms: t.two_finger_tap_window_ms,
            scroll_evidence_samples: t.scroll_evidence_samples,
            pinch_distance_squared: (dx * dx + dy * dy) as i32,
            scroll_tick_px: t.scroll_tick_px,
            stale_pointer_timeout_ms: t.stale_pointer_timeout_ms,
        }
    }
}

impl Default for DualTouchConfig {
    fn default() -> Self {
        Self::from_input_config(&InputConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    AwaitingSecondPointer,
    Active(GestureMode),
    /// Ignores everything until every finger has lifted.
    Cancelled,
}

/// Recognizer for two-finger gestures.
#[derive(Debug)]
pub struct DualTouchGestureRecognizer {
    config: DualTouchConfig,
    state: State,
    /// Fingers currently down, in landing order.
    pointers: Vec<(u32, PointF)>,
    first_down_ms: u64,
    /// Finger positions when the second finger landed.
    second_down: [PointF; 2],
    tap_window: DelayedCallback,
    scroll_score: u32,
    scroll_reference: PointF,
    scale: Option<ScaleGesture>,
    first_lift_ms: Option<u64>,
    begun: bool,
    last_event_ms: u64,
}

impl Default for DualTouchGestureRecognizer {
    fn default() -> Self {
        Self::new(DualTouchConfig::default())
    }
}

impl DualTouchGestureRecognizer {
    pub fn new(config: DualTouchConfig) -> Self {
        Self {
            config,
            state: State::Idle,
            pointers: Vec::with_capacity(2),
            first_down_ms: 0,
            second_down: [PointF::default(); 2],
            tap_window: DelayedCallback::new(),
            scroll_score: 0,
            scroll_reference: PointF::default(),
            scale: None,
            first_lift_ms: None,
            begun: false,
            last_event_ms: 0,
        }
    }

    /// Current resolution, if a dual touch is active.
    pub fn mode(&self) -> Option<GestureMode> {
        match self.state {
            State::Active(mode) => Some(mode),
            _ => None,
        }
    }

    /// True while a dual touch is in progress (between begin and end).
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// True if fingers are tracked but nothing has been heard from them for
    /// longer than the stale timeout.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        !self.pointers.is_empty()
            && now_ms.saturating_sub(self.last_event_ms) > self.config.stale_pointer_timeout_ms
    }

    /// Abandon the current dual touch, closing any open brackets, and forget
    /// every tracked finger.
    pub fn cancel_sequence(&mut self) -> Vec<DualTouchEvent> {
        let mut out = Vec::new();
        self.cancel(&mut out);
        self.reset();
        out
    }

    /// Expire the tap window. A dual touch whose tap window elapsed can no
    /// longer end in a tap, but expiry itself reports nothing.
    pub fn tick(&mut self, now_ms: u64) -> Vec<DualTouchEvent> {
        if self.tap_window.fire_if_due(now_ms).is_some() {
            trace!("Two-finger tap window expired");
        }
        Vec::new()
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        self.tap_window.deadline()
    }

    /// Feed one raw pointer event.
    pub fn handle_event(&mut self, ev: &PointerEvent) -> Vec<DualTouchEvent> {
        let mut out = self.tick(ev.timestamp_ms);
        match ev.phase {
            PointerPhase::Down => self.on_down(ev, &mut out),
            PointerPhase::Move => self.on_move(ev, &mut out),
            PointerPhase::Up => self.on_up(ev, &mut out),
            PointerPhase::Cancel => out.extend(self.cancel_sequence()),
        }
        if !self.pointers.is_empty() {
            self.last_event_ms = ev.timestamp_ms;
        }
        out
    }

    fn on_down(&mut self, ev: &PointerEvent, out: &mut Vec<DualTouchEvent>) {
        if self.pointers.iter().any(|(id, _)| *id == ev.pointer_id) {
            // Duplicate down for a tracked finger; treat as a position update
            self.update_position(ev);
            return;
        }
        if self.is_stale(ev.timestamp_ms) {
            debug!("Tracked fingers went silent, dual touch abandoned");
            out.extend(self.cancel_sequence());
        }
        self.pointers.push((ev.pointer_id, ev.position()));

        match self.state {
            State::Idle => {
                self.reset_gesture();
                self.state = State::AwaitingSecondPointer;
                self.first_down_ms = ev.timestamp_ms;
            }
            State::AwaitingSecondPointer => {
                let delay = ev.timestamp_ms.saturating_sub(self.first_down_ms);
                if self.pointers.len() > 2 || delay > self.config.second_pointer_window_ms {
                    debug!("Second finger too late ({} ms), dual touch cancelled", delay);
                    self.cancel(out);
                    return;
                }
                self.second_down = [self.pointers[0].1, self.pointers[1].1];
                self.scroll_reference = self.second_down[0];
                self.scroll_score = 0;
                self.state = State::Active(GestureMode::Unknown);
                self.tap_window
                    .schedule(ev.timestamp_ms, self.config.tap_window_ms, ());
                self.begun = true;
                debug!("Dual touch began");
                out.push(DualTouchEvent::Begin {
                    position: self.second_down[0],
                });
            }
            State::Active(_) => {
                debug!("More than two fingers, dual touch cancelled");
                self.cancel(out);
            }
            State::Cancelled => {}
        }
    }

    fn on_move(&mut self, ev: &PointerEvent, out: &mut Vec<DualTouchEvent>) {
        self.update_position(ev);
        let State::Active(mode) = self.state else {
            return;
        };
        if self.pointers.len() != 2 {
            return;
        }
        let current = [self.pointers[0].1, self.pointers[1].1];

        let mode = match mode {
            GestureMode::Unknown => {
                if self.pointer_distance_changed(&current) {
                    debug!("Dual touch resolved to pinch-zoom");
                    self.state = State::Active(GestureMode::PinchZoom);
                    self.scale = Some(ScaleGesture::begin(current[0], current[1]));
                    out.push(DualTouchEvent::ScaleBegin {
                        focus: current[0].midpoint(&current[1]),
                    });
                    return;
                }
                self.scroll_score += 1;
                if self.scroll_score >= self.config.scroll_evidence_samples {
                    debug!("Dual touch resolved to scroll");
                    self.state = State::Active(GestureMode::Scroll);
                    GestureMode::Scroll
                } else {
                    GestureMode::Unknown
                }
            }
            resolved => resolved,
        };

        match mode {
            GestureMode::PinchZoom => {
                let step = self
                    .scale
                    .as_mut()
                    .and_then(|s| s.update(current[0], current[1]));
                if let Some(step) = step {
                    out.push(DualTouchEvent::Scale {
                        factor: step.factor,
                        focus: step.focus,
                    });
                }
            }
            GestureMode::Scroll => {
                let delta = current[0].y - self.scroll_reference.y;
                let direction = if delta > self.config.scroll_tick_px {
                    ScrollDirection::Down
                } else if delta < -self.config.scroll_tick_px {
                    ScrollDirection::Up
                } else {
                    return;
                };
                trace!("Two-finger scroll {:?} (delta {:.1})", direction, delta);
                self.scroll_reference = current[0];
                out.push(DualTouchEvent::Scroll { direction });
            }
            GestureMode::Unknown => {}
        }
    }

    fn on_up(&mut self, ev: &PointerEvent, out: &mut Vec<DualTouchEvent>) {
        self.update_position(ev);
        self.pointers.retain(|(id, _)| *id != ev.pointer_id);
        if !self.pointers.is_empty() {
            self.first_lift_ms = Some(ev.timestamp_ms);
            return;
        }

        if let Some(first_lift) = self.first_lift_ms {
            let gap = ev.timestamp_ms.saturating_sub(first_lift);
            if gap > self.config.second_pointer_window_ms {
                debug!("Fingers lifted {} ms apart, dual touch cancelled", gap);
                self.cancel(out);
                self.reset();
                return;
            }
        }

        if let State::Active(mode) = self.state {
            match mode {
                GestureMode::Unknown if self.tap_window.is_pending(ev.timestamp_ms) => {
                    debug!("Two-finger tap");
                    out.push(DualTouchEvent::SingleTap {
                        position: self.second_down[0],
                    });
                }
                GestureMode::PinchZoom => out.push(DualTouchEvent::ScaleEnd),
                _ => {}
            }
            if self.begun {
                out.push(DualTouchEvent::End);
            }
        }
        self.reset();
    }

    fn update_position(&mut self, ev: &PointerEvent) {
        if let Some(slot) = self.pointers.iter_mut().find(|(id, _)| *id == ev.pointer_id) {
            slot.1 = ev.position();
        }
    }

    /// Compare the per-axis finger distances against the second-down snapshot,
    /// in whole pixels.
    fn pointer_distance_changed(&self, current: &[PointF; 2]) -> bool {
        let axis_change = |old_a: f32, old_b: f32, new_a: f32, new_b: f32| {
            let before = (old_a as i32 - old_b as i32).abs();
            let after = (new_a as i32 - new_b as i32).abs();
            (after - before) * (after - before)
        };
        let [old0, old1] = self.second_down;
        let dist_x = axis_change(old0.x, old1.x, current[0].x, current[1].x);
        let dist_y = axis_change(old0.y, old1.y, current[0].y, current[1].y);
        dist_x.saturating_add(dist_y) > self.config.pinch_distance_squared
    }

    /// Abandon the gesture until every finger is up. Closes any open brackets.
    fn cancel(&mut self, out: &mut Vec<DualTouchEvent>) {
        self.tap_window.cancel();
        if self.scale.take().is_some() {
            out.push(DualTouchEvent::ScaleEnd);
        }
        if std::mem::take(&mut self.begun) {
            out.push(DualTouchEvent::End);
        }
        self.state = State::Cancelled;
    }

    fn reset_gesture(&mut self) {
        self.tap_window.cancel();
        self.scale = None;
        self.scroll_score = 0;
        self.first_lift_ms = None;
        self.begun = false;
    }

    fn reset(&mut self) {
        self.reset_gesture();
        self.pointers.clear();
        self.state = State::Idle;
    }
}

//! The on-screen touch pointer.
//!
//! A square widget divided into a 3x3 grid of zones, drawn on top of the
//! session view. The top-left zone is the cursor tip; the others are handles
//! and buttons:
//!
//! ```text
//!  +--------+--------+-----------+
//!  | cursor | move   | reset     |
//!  +--------+--------+-----------+
//!  | close  | left   | keyboard  |
//!  +--------+--------+-----------+
//!  | right  | scroll | extended  |
//!  +--------+--------+-----------+
//! ```
//!
//! The overlay runs its own one-finger recognizer over touches that start on
//! it. Dragging the move or left-click handle moves the widget (and the remote
//! cursor with it), holding the left-click handle presses the left button for
//! drag-and-drop, dragging the scroll handle scrolls.

use crate::config::InputConfig;
use crate::events::{MouseButton, PointerEvent, PointerPhase, ScrollDirection};
use crate::gestures::{SingleTouchConfig, SingleTouchEvent, SingleTouchGestureRecognizer};
use crate::timer::DelayedCallback;
use rdp_common::{PointF, RectF};
use tracing::{debug, trace};

/// Edge length of the overlay when none is configured.
pub const DEFAULT_OVERLAY_SIZE_PX: f32 = 150.0;

/// The nine zones of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayZone {
    Cursor,
    Move,
    ResetZoom,
    Close,
    LeftClick,
    ToggleKeyboard,
    RightClick,
    Scroll,
    ToggleExtendedKeyboard,
}

impl OverlayZone {
    /// Zone at grid position (`row`, `col`).
    pub fn at(row: usize, col: usize) -> Option<OverlayZone> {
        use OverlayZone::*;
        const GRID: [[OverlayZone; 3]; 3] = [
            [Cursor, Move, ResetZoom],
            [Close, LeftClick, ToggleKeyboard],
            [RightClick, Scroll, ToggleExtendedKeyboard],
        ];
        GRID.get(row).and_then(|r| r.get(col)).copied()
    }
}

/// Visual state, for the view layer to pick the right bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayAppearance {
    #[default]
    Default,
    Active,
    Scroll,
    LeftClick,
    RightClick,
}

/// Semantic overlay output. Positions are the cursor tip in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayEvent {
    Move {
        position: PointF,
    },
    /// Logical button; the coordinator applies the swap setting.
    Button {
        position: PointF,
        button: MouseButton,
        down: bool,
    },
    Scroll {
        direction: ScrollDirection,
    },
    ResetZoom,
    ToggleKeyboard,
    ToggleExtendedKeyboard,
    Close,
}

/// Overlay sizing and timing.
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    pub size_px: f32,
    pub scroll_tick_px: f32,
    pub feedback_ms: u64,
    pub gestures: SingleTouchConfig,
}

impl OverlayConfig {
    pub fn from_input_config(config: &InputConfig) -> Self {
        Self {
            size_px: DEFAULT_OVERLAY_SIZE_PX,
            scroll_tick_px: config.timings.scroll_tick_px,
            feedback_ms: config.timings.pointer_feedback_ms,
            gestures: SingleTouchConfig::from_input_config(config),
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self::from_input_config(&InputConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drag {
    None,
    Moving,
    Scrolling,
}

/// The draggable touch pointer widget.
#[derive(Debug)]
pub struct TouchPointerOverlay {
    config: OverlayConfig,
    translation: PointF,
    recognizer: SingleTouchGestureRecognizer,
    /// The current touch sequence started on the overlay.
    capturing: bool,
    down_zone: Option<OverlayZone>,
    drag: Drag,
    scroll_reference_y: f32,
    button_held: bool,
    appearance: OverlayAppearance,
    restore_appearance: DelayedCallback,
}

impl Default for TouchPointerOverlay {
    fn default() -> Self {
        Self::new(OverlayConfig::default())
    }
}

impl TouchPointerOverlay {
    pub fn new(config: OverlayConfig) -> Self {
        let recognizer = SingleTouchGestureRecognizer::new(config.gestures.clone());
        Self {
            config,
            translation: PointF::default(),
            recognizer,
            capturing: false,
            down_zone: None,
            drag: Drag::None,
            scroll_reference_y: 0.0,
            button_held: false,
            appearance: OverlayAppearance::Default,
            restore_appearance: DelayedCallback::new(),
        }
    }

    pub fn size(&self) -> f32 {
        self.config.size_px
    }

    /// Accumulated drag translation (top-left corner in view pixels).
    pub fn translation(&self) -> PointF {
        self.translation
    }

    pub fn set_translation(&mut self, translation: PointF) {
        self.translation = translation;
    }

    pub fn appearance(&self) -> OverlayAppearance {
        self.appearance
    }

    /// True while the left button is held by a long press on the overlay.
    pub fn is_button_held(&self) -> bool {
        self.button_held
    }

    /// Overlay rectangle in view pixels.
    pub fn bounds(&self) -> RectF {
        let size = self.config.size_px;
        RectF::from_origin_size(self.translation.x, self.translation.y, size, size)
    }

    /// Rectangle of `zone` in view pixels, after the drag translation.
    pub fn zone_rect(&self, zone: OverlayZone) -> RectF {
        let cell = self.config.size_px / 3.0;
        let (row, col) = (0..3)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .find(|&(r, c)| OverlayZone::at(r, c) == Some(zone))
            .unwrap_or((0, 0));
        RectF::from_origin_size(col as f32 * cell, row as f32 * cell, cell, cell)
            .translated(self.translation)
    }

    /// Zone under `position` (view pixels), if any.
    pub fn zone_at(&self, position: PointF) -> Option<OverlayZone> {
        let bounds = self.bounds();
        if !bounds.contains(position) {
            return None;
        }
        let cell = self.config.size_px / 3.0;
        let col = ((position.x - bounds.left) / cell) as usize;
        let row = ((position.y - bounds.top) / cell) as usize;
        OverlayZone::at(row.min(2), col.min(2))
    }

    /// Cursor tip in view pixels: the center of the cursor zone.
    pub fn cursor_position(&self) -> PointF {
        self.zone_rect(OverlayZone::Cursor).center()
    }

    /// Clamp the overlay back into a viewport of the given size.
    pub fn ensure_visibility(&mut self, viewport_width: f32, viewport_height: f32) {
        let size = self.config.size_px;
        let max_x = (viewport_width - size).max(0.0);
        let max_y = (viewport_height - size).max(0.0);
        let clamped = PointF::new(
            self.translation.x.clamp(0.0, max_x),
            self.translation.y.clamp(0.0, max_y),
        );
        if clamped != self.translation {
            debug!(
                "Overlay moved into view: ({:.0}, {:.0}) -> ({:.0}, {:.0})",
                self.translation.x, self.translation.y, clamped.x, clamped.y
            );
            self.translation = clamped;
        }
    }

    pub fn next_deadline(&self) -> Option<u64> {
        crate::timer::earliest([
            self.recognizer.next_deadline(),
            self.restore_appearance.deadline(),
        ])
    }

    /// Fire due timers: long press on a handle, appearance restore.
    pub fn tick(&mut self, now_ms: u64) -> Vec<OverlayEvent> {
        let mut out = Vec::new();
        if self.restore_appearance.fire_if_due(now_ms).is_some() {
            self.appearance = self.resting_appearance();
        }
        for gesture in self.recognizer.tick(now_ms) {
            self.on_gesture(gesture, now_ms, &mut out);
        }
        out
    }

    /// True while the overlay owns a touch sequence.
    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// True if the captured sequence went silent, its pointer-up lost.
    pub fn is_stale(&self, now_ms: u64) -> bool {
        self.capturing && self.recognizer.is_stale(now_ms)
    }

    /// Abandon the captured sequence, releasing a held button.
    pub fn cancel_sequence(&mut self) -> Vec<OverlayEvent> {
        let mut out = Vec::new();
        if !self.capturing {
            return out;
        }
        trace!("Overlay touch sequence abandoned");
        self.recognizer.cancel_sequence();
        if self.button_held {
            out.push(OverlayEvent::Button {
                position: self.cursor_position(),
                button: MouseButton::Left,
                down: false,
            });
        }
        self.end_sequence();
        out
    }

    /// Feed a raw pointer event. Returns `None` if the event belongs to a
    /// touch sequence that did not start on the overlay.
    pub fn handle_event(&mut self, ev: &PointerEvent) -> Option<Vec<OverlayEvent>> {
        if !self.capturing {
            if ev.phase != PointerPhase::Down || self.zone_at(ev.position()).is_none() {
                return None;
            }
            trace!("Overlay captured touch at ({:.1}, {:.1})", ev.x, ev.y);
            self.capturing = true;
        }

        let mut out = self.tick(ev.timestamp_ms);
        for gesture in self.recognizer.handle_event(ev) {
            self.on_gesture(gesture, ev.timestamp_ms, &mut out);
        }
        let finished = matches!(ev.phase, PointerPhase::Up | PointerPhase::Cancel);
        if finished && !self.recognizer.is_tracking() {
            self.end_sequence();
        }
        Some(out)
    }

    fn on_gesture(&mut self, gesture: SingleTouchEvent, now_ms: u64, out: &mut Vec<OverlayEvent>) {
        match gesture {
            SingleTouchEvent::Down { position } => {
                self.down_zone = self.zone_at(position);
                match self.down_zone {
                    Some(OverlayZone::Move | OverlayZone::LeftClick) => {
                        self.drag = Drag::Moving;
                        self.appearance = OverlayAppearance::Active;
                    }
                    Some(OverlayZone::Scroll) => {
                        self.drag = Drag::Scrolling;
                        self.scroll_reference_y = position.y;
                        self.appearance = OverlayAppearance::Scroll;
                    }
                    _ => {}
                }
            }
            SingleTouchEvent::LongPress { .. } => {
                if self.down_zone == Some(OverlayZone::LeftClick) {
                    debug!("Overlay holding left button");
                    self.button_held = true;
                    self.appearance = OverlayAppearance::LeftClick;
                    out.push(OverlayEvent::Button {
                        position: self.cursor_position(),
                        button: MouseButton::Left,
                        down: true,
                    });
                }
            }
            SingleTouchEvent::Scroll {
                position,
                distance_x,
                distance_y,
            } => match self.drag {
                Drag::Moving => {
                    self.translation = self.translation - PointF::new(distance_x, distance_y);
                    out.push(OverlayEvent::Move {
                        position: self.cursor_position(),
                    });
                }
                Drag::Scrolling => {
                    let delta = position.y - self.scroll_reference_y;
                    let direction = if delta > self.config.scroll_tick_px {
                        ScrollDirection::Down
                    } else if delta < -self.config.scroll_tick_px {
                        ScrollDirection::Up
                    } else {
                        return;
                    };
                    self.scroll_reference_y = position.y;
                    out.push(OverlayEvent::Scroll { direction });
                }
                Drag::None => {}
            },
            SingleTouchEvent::LongPressUp { .. } => {
                if self.button_held {
                    self.button_held = false;
                    out.push(OverlayEvent::Button {
                        position: self.cursor_position(),
                        button: MouseButton::Left,
                        down: false,
                    });
                }
            }
            SingleTouchEvent::SingleTapUp { position } => self.on_tap(position, now_ms, out),
            SingleTouchEvent::DoubleTap { position } => {
                if self.zone_at(position) == Some(OverlayZone::LeftClick) {
                    self.click(MouseButton::Left, now_ms, out);
                }
            }
            SingleTouchEvent::Fling { .. } | SingleTouchEvent::Up { .. } => {}
        }
    }

    fn on_tap(&mut self, position: PointF, now_ms: u64, out: &mut Vec<OverlayEvent>) {
        match self.zone_at(position) {
            Some(OverlayZone::LeftClick) => self.click(MouseButton::Left, now_ms, out),
            Some(OverlayZone::RightClick) => self.click(MouseButton::Right, now_ms, out),
            Some(OverlayZone::ResetZoom) => out.push(OverlayEvent::ResetZoom),
            Some(OverlayZone::ToggleKeyboard) => out.push(OverlayEvent::ToggleKeyboard),
            Some(OverlayZone::ToggleExtendedKeyboard) => {
                out.push(OverlayEvent::ToggleExtendedKeyboard)
            }
            Some(OverlayZone::Close) => out.push(OverlayEvent::Close),
            Some(OverlayZone::Cursor | OverlayZone::Move | OverlayZone::Scroll) | None => {}
        }
    }

    fn click(&mut self, button: MouseButton, now_ms: u64, out: &mut Vec<OverlayEvent>) {
        let position = self.cursor_position();
        trace!("Overlay {:?} click at ({:.1}, {:.1})", button, position.x, position.y);
        for down in [true, false] {
            out.push(OverlayEvent::Button {
                position,
                button,
                down,
            });
        }
        self.appearance = match button {
            MouseButton::Left => OverlayAppearance::LeftClick,
            MouseButton::Right => OverlayAppearance::RightClick,
        };
        self.restore_appearance
            .schedule(now_ms, self.config.feedback_ms, ());
    }

    fn end_sequence(&mut self) {
        self.capturing = false;
        self.down_zone = None;
        self.drag = Drag::None;
        self.button_held = false;
        if !self.restore_appearance.is_scheduled() {
            self.appearance = OverlayAppearance::Default;
        }
    }

    fn resting_appearance(&self) -> OverlayAppearance {
        match self.drag {
            Drag::Moving if self.button_held => OverlayAppearance::LeftClick,
            Drag::Moving => OverlayAppearance::Active,
            Drag::Scrolling => OverlayAppearance::Scroll,
            Drag::None => OverlayAppearance::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ev(x: f32, y: f32, t: u64, phase: PointerPhase) -> PointerEvent {
        PointerEvent::new(0, x, y, t, phase)
    }

    #[test]
    fn test_zone_grid() {
        let overlay = TouchPointerOverlay::default();
        assert_eq!(overlay.zone_at(PointF::new(10.0, 10.0)), Some(OverlayZone::Cursor));
        assert_eq!(overlay.zone_at(PointF::new(75.0, 75.0)), Some(OverlayZone::LeftClick));
        assert_eq!(overlay.zone_at(PointF::new(10.0, 140.0)), Some(OverlayZone::RightClick));
        assert_eq!(overlay.zone_at(PointF::new(75.0, 140.0)), Some(OverlayZone::Scroll));
        assert_eq!(
            overlay.zone_at(PointF::new(140.0, 140.0)),
            Some(OverlayZone::ToggleExtendedKeyboard)
        );
        assert_eq!(overlay.zone_at(PointF::new(150.0, 10.0)), None);
        assert_eq!(overlay.cursor_position(), PointF::new(25.0, 25.0));
    }

    #[test]
    fn test_hit_test_follows_translation() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.set_translation(PointF::new(200.0, 100.0));
        assert_eq!(overlay.zone_at(PointF::new(75.0, 75.0)), None);
        assert_eq!(overlay.zone_at(PointF::new(275.0, 175.0)), Some(OverlayZone::LeftClick));
        assert_eq!(overlay.cursor_position(), PointF::new(225.0, 125.0));
    }

    #[test]
    fn test_touch_outside_not_consumed() {
        let mut overlay = TouchPointerOverlay::default();
        assert_eq!(overlay.handle_event(&ev(400.0, 400.0, 0, PointerPhase::Down)), None);
        assert_eq!(overlay.handle_event(&ev(75.0, 75.0, 10, PointerPhase::Move)), None);
        assert_eq!(overlay.handle_event(&ev(75.0, 75.0, 20, PointerPhase::Up)), None);
    }

    #[test]
    fn test_cancel_releases_held_button() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.handle_event(&ev(75.0, 75.0, 0, PointerPhase::Down));
        let out = overlay.tick(500);
        assert_eq!(out.len(), 1);
        assert!(overlay.is_button_held());
        assert!(overlay.is_stale(2_000));

        assert_eq!(
            overlay.cancel_sequence(),
            vec![OverlayEvent::Button {
                position: PointF::new(25.0, 25.0),
                button: MouseButton::Left,
                down: false
            }]
        );
        assert!(!overlay.is_capturing());
        assert!(!overlay.is_button_held());
        assert!(overlay.cancel_sequence().is_empty());
        assert_eq!(overlay.handle_event(&ev(400.0, 300.0, 2_000, PointerPhase::Down)), None);
    }

    #[test]
    fn test_tap_center_left_clicks() {
        let mut overlay = TouchPointerOverlay::default();
        assert_eq!(overlay.handle_event(&ev(75.0, 75.0, 0, PointerPhase::Down)), Some(vec![]));
        let out = overlay.handle_event(&ev(75.0, 75.0, 50, PointerPhase::Up)).unwrap();
        let cursor = PointF::new(25.0, 25.0);
        assert_eq!(
            out,
            vec![
                OverlayEvent::Button {
                    position: cursor,
                    button: MouseButton::Left,
                    down: true
                },
                OverlayEvent::Button {
                    position: cursor,
                    button: MouseButton::Left,
                    down: false
                },
            ]
        );
        assert_eq!(overlay.appearance(), OverlayAppearance::LeftClick);
        overlay.tick(200);
        assert_eq!(overlay.appearance(), OverlayAppearance::Default);
    }

    #[test]
    fn test_tap_buttons() {
        let mut overlay = TouchPointerOverlay::default();
        let mut tap = |x: f32, y: f32, t: u64| {
            overlay.handle_event(&ev(x, y, t, PointerPhase::Down));
            overlay
                .handle_event(&ev(x, y, t + 10, PointerPhase::Up))
                .unwrap()
        };
        assert_eq!(tap(125.0, 25.0, 0), vec![OverlayEvent::ResetZoom]);
        assert_eq!(tap(125.0, 75.0, 1_000), vec![OverlayEvent::ToggleKeyboard]);
        assert_eq!(tap(25.0, 75.0, 2_000), vec![OverlayEvent::Close]);
        assert_eq!(tap(25.0, 25.0, 3_000), vec![]);
        let right = tap(25.0, 125.0, 4_000);
        assert_eq!(right.len(), 2);
        assert!(matches!(
            right[0],
            OverlayEvent::Button {
                button: MouseButton::Right,
                down: true,
                ..
            }
        ));
    }

    #[test]
    fn test_drag_moves_overlay() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.handle_event(&ev(75.0, 25.0, 0, PointerPhase::Down));
        let out = overlay
            .handle_event(&ev(95.0, 55.0, 20, PointerPhase::Move))
            .unwrap();
        assert_eq!(
            out,
            vec![OverlayEvent::Move {
                position: PointF::new(45.0, 55.0)
            }]
        );
        assert_eq!(overlay.translation(), PointF::new(20.0, 30.0));
        // The drag keeps the sequence even once the finger leaves the old bounds
        let out = overlay
            .handle_event(&ev(295.0, 55.0, 40, PointerPhase::Move))
            .unwrap();
        assert_eq!(out.len(), 1);
        overlay.handle_event(&ev(295.0, 55.0, 60, PointerPhase::Up));
        assert_eq!(overlay.translation(), PointF::new(220.0, 30.0));
    }

    #[test]
    fn test_long_press_holds_left_button() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.handle_event(&ev(75.0, 75.0, 0, PointerPhase::Down));
        let out = overlay.tick(500);
        assert_eq!(
            out,
            vec![OverlayEvent::Button {
                position: PointF::new(25.0, 25.0),
                button: MouseButton::Left,
                down: true
            }]
        );
        assert!(overlay.is_button_held());
        let out = overlay
            .handle_event(&ev(85.0, 75.0, 600, PointerPhase::Move))
            .unwrap();
        assert_eq!(
            out,
            vec![OverlayEvent::Move {
                position: PointF::new(35.0, 25.0)
            }]
        );
        let out = overlay
            .handle_event(&ev(85.0, 75.0, 700, PointerPhase::Up))
            .unwrap();
        assert_eq!(
            out,
            vec![OverlayEvent::Button {
                position: PointF::new(35.0, 25.0),
                button: MouseButton::Left,
                down: false
            }]
        );
        assert!(!overlay.is_button_held());
    }

    #[test]
    fn test_long_press_elsewhere_holds_nothing() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.handle_event(&ev(125.0, 125.0, 0, PointerPhase::Down));
        assert!(overlay.tick(600).is_empty());
        assert_eq!(
            overlay.handle_event(&ev(125.0, 125.0, 700, PointerPhase::Up)),
            Some(vec![])
        );
    }

    #[test]
    fn test_scroll_handle() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.handle_event(&ev(75.0, 125.0, 0, PointerPhase::Down));
        assert_eq!(overlay.appearance(), OverlayAppearance::Scroll);
        let out = overlay
            .handle_event(&ev(75.0, 137.0, 20, PointerPhase::Move))
            .unwrap();
        assert_eq!(
            out,
            vec![OverlayEvent::Scroll {
                direction: ScrollDirection::Down
            }]
        );
        let out = overlay
            .handle_event(&ev(75.0, 120.0, 40, PointerPhase::Move))
            .unwrap();
        assert_eq!(
            out,
            vec![OverlayEvent::Scroll {
                direction: ScrollDirection::Up
            }]
        );
        // The overlay itself does not move
        assert_eq!(overlay.translation(), PointF::default());
    }

    #[test]
    fn test_ensure_visibility() {
        let mut overlay = TouchPointerOverlay::default();
        overlay.set_translation(PointF::new(900.0, -40.0));
        overlay.ensure_visibility(800.0, 600.0);
        assert_eq!(overlay.translation(), PointF::new(650.0, 0.0));
    }
}

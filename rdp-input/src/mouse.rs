use crate::events::{MouseButton, ScrollDirection};
use crate::timer::DelayedCallback;
use bitflags::bitflags;
use rdp_common::Point;
use tracing::trace;

bitflags! {
    /// Remote buttons currently held down.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ButtonMask: u8 {
        const LEFT  = 1 << 0;
        const RIGHT = 1 << 1;
    }
}

impl From<MouseButton> for ButtonMask {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => ButtonMask::LEFT,
            MouseButton::Right => ButtonMask::RIGHT,
        }
    }
}

/// Configuration for move coalescing.
#[derive(Debug, Clone)]
pub struct CoalesceConfig {
    /// Delay before a pending move is sent
    pub debounce_ms: u64,
    /// Superseded moves tolerated before the newest is sent immediately
    pub max_discarded: u32,
}

impl Default for CoalesceConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 150,
            max_discarded: 3,
        }
    }
}

/// Debounces bursts of pointer moves.
///
/// Each move replaces the pending one. A continuous stream is still sampled:
/// once more than `max_discarded` moves have been superseded in a row, the
/// newest is sent right away.
#[derive(Debug)]
pub struct MoveCoalescer {
    config: CoalesceConfig,
    pending: DelayedCallback<Point>,
    discarded: u32,
}

impl Default for MoveCoalescer {
    fn default() -> Self {
        Self::new(CoalesceConfig::default())
    }
}

impl MoveCoalescer {
    pub fn new(config: CoalesceConfig) -> Self {
        Self {
            config,
            pending: DelayedCallback::new(),
            discarded: 0,
        }
    }

    /// Submit a move. Returns the position if it must be sent now.
    pub fn submit(&mut self, now_ms: u64, position: Point) -> Option<Point> {
        if self.pending.cancel() {
            self.discarded += 1;
        } else {
            self.discarded = 0;
        }

        if self.discarded > self.config.max_discarded {
            trace!("{} moves superseded, sending immediately", self.discarded);
            Some(position)
        } else {
            self.pending
                .schedule(now_ms, self.config.debounce_ms, position);
            None
        }
    }

    /// Drop the pending move. Returns true if there was one.
    pub fn cancel(&mut self) -> bool {
        self.pending.cancel()
    }

    /// Take the pending move if its debounce delay has elapsed.
    pub fn tick(&mut self, now_ms: u64) -> Option<Point> {
        self.pending.fire_if_due(now_ms)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.deadline()
    }

    /// Moves superseded in a row so far.
    pub fn discarded(&self) -> u32 {
        self.discarded
    }
}

/// Resolves which remote button a touch presses.
///
/// Session-view touches press the left button unless a two-finger tap armed
/// the right button for the next touch. The user's swap setting is applied
/// on top of that. The button pressed by a touch is remembered so that the
/// release always matches the press.
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    swap_buttons: bool,
    right_click_armed: bool,
    touch_button: Option<MouseButton>,
    held: ButtonMask,
}

impl PointerState {
    pub fn new(swap_buttons: bool) -> Self {
        Self {
            swap_buttons,
            ..Default::default()
        }
    }

    /// Arm (or disarm) the right button for the next session-view touch.
    /// Returns the new armed state.
    pub fn toggle_right_click(&mut self) -> bool {
        self.right_click_armed = !self.right_click_armed;
        trace!("Right click armed: {}", self.right_click_armed);
        self.right_click_armed
    }

    pub fn is_right_click_armed(&self) -> bool {
        self.right_click_armed
    }

    /// Buttons currently held on the remote side.
    pub fn held(&self) -> ButtonMask {
        self.held
    }

    /// Button a session-view touch presses.
    pub fn touch_press(&mut self) -> MouseButton {
        let logical = if self.right_click_armed {
            MouseButton::Right
        } else {
            MouseButton::Left
        };
        let button = self.apply_swap(logical);
        self.touch_button = Some(button);
        self.held.insert(button.into());
        button
    }

    /// Button a session-view touch releases. Disarms the right button.
    pub fn touch_release(&mut self) -> MouseButton {
        let button = match self.touch_button.take() {
            Some(button) => button,
            None => self.apply_swap(if self.right_click_armed {
                MouseButton::Right
            } else {
                MouseButton::Left
            }),
        };
        self.right_click_armed = false;
        self.held.remove(button.into());
        button
    }

    /// Button an overlay click of `logical` presses or releases.
    pub fn overlay_button(&mut self, logical: MouseButton, down: bool) -> MouseButton {
        let button = self.apply_swap(logical);
        if down {
            self.held.insert(button.into());
        } else {
            self.held.remove(button.into());
        }
        button
    }

    fn apply_swap(&self, button: MouseButton) -> MouseButton {
        if self.swap_buttons {
            button.swapped()
        } else {
            button
        }
    }
}

/// Wheel direction for a host wheel delta: positive scrolls up.
pub fn wheel_direction(delta_y: f32) -> Option<ScrollDirection> {
    if delta_y > 0.0 {
        Some(ScrollDirection::Up)
    } else if delta_y < 0.0 {
        Some(ScrollDirection::Down)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_move_is_debounced() {
        let mut coalescer = MoveCoalescer::default();
        assert_eq!(coalescer.submit(0, Point::new(1, 1)), None);
        assert_eq!(coalescer.tick(149), None);
        assert_eq!(coalescer.tick(150), Some(Point::new(1, 1)));
        assert_eq!(coalescer.tick(300), None);
    }

    #[test]
    fn test_burst_sends_after_max_discarded() {
        let mut coalescer = MoveCoalescer::default();
        for i in 0..4 {
            assert_eq!(coalescer.submit(i, Point::new(i as i32, 0)), None);
        }
        assert_eq!(coalescer.discarded(), 3);
        // Fifth move supersedes a fourth pending one
        assert_eq!(coalescer.submit(4, Point::new(4, 0)), Some(Point::new(4, 0)));
        assert_eq!(coalescer.next_deadline(), None);
        // Nothing pending any more, so the counter starts over
        assert_eq!(coalescer.submit(5, Point::new(5, 0)), None);
        assert_eq!(coalescer.discarded(), 0);
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut coalescer = MoveCoalescer::default();
        coalescer.submit(0, Point::new(1, 1));
        assert!(coalescer.cancel());
        assert_eq!(coalescer.tick(1_000), None);
    }

    #[test]
    fn test_right_click_toggle() {
        let mut state = PointerState::new(false);
        assert_eq!(state.touch_press(), MouseButton::Left);
        assert_eq!(state.touch_release(), MouseButton::Left);

        assert!(state.toggle_right_click());
        assert_eq!(state.touch_press(), MouseButton::Right);
        assert_eq!(state.held(), ButtonMask::RIGHT);
        assert_eq!(state.touch_release(), MouseButton::Right);
        assert!(!state.is_right_click_armed());
        assert!(state.held().is_empty());
    }

    #[test]
    fn test_release_matches_press() {
        let mut state = PointerState::new(false);
        assert_eq!(state.touch_press(), MouseButton::Left);
        // Arming mid-touch does not change the button being released
        state.toggle_right_click();
        assert_eq!(state.touch_release(), MouseButton::Left);
    }

    #[test]
    fn test_swap_buttons() {
        let mut state = PointerState::new(true);
        assert_eq!(state.touch_press(), MouseButton::Right);
        state.touch_release();
        state.toggle_right_click();
        assert_eq!(state.touch_press(), MouseButton::Left);
        state.touch_release();
        assert_eq!(state.overlay_button(MouseButton::Right, true), MouseButton::Left);
        assert_eq!(state.held(), ButtonMask::LEFT);
    }

    #[test]
    fn test_wheel_direction() {
        assert_eq!(wheel_direction(1.0), Some(ScrollDirection::Up));
        assert_eq!(wheel_direction(-0.5), Some(ScrollDirection::Down));
        assert_eq!(wheel_direction(0.0), None);
    }
}

//! Glue between the recognizers, the overlay, the keyboard and the session.
//!
//! The coordinator owns the view transform (zoom and scroll offset) and is the
//! only place where view pixels are converted to remote-surface pixels. All
//! handlers return the resulting [`SessionCommand`]s in order.

use crate::config::InputConfig;
use crate::events::{
    HostKeyEvent, MouseButton, PointerEvent, PointerPhase, ScrollDirection, SessionCommand,
};
use crate::gestures::{
    DualTouchConfig, DualTouchEvent, DualTouchGestureRecognizer, SingleTouchConfig,
    SingleTouchEvent, SingleTouchGestureRecognizer,
};
use crate::keyboard::{KeyboardModifierStateMachine, ModifierDisplayState};
use crate::mouse::{wheel_direction, CoalesceConfig, MoveCoalescer, PointerState};
use crate::overlay::{OverlayConfig, OverlayEvent, TouchPointerOverlay};
use crate::timer::{earliest, DelayedCallback};
use rdp_common::{Point, PointF};
use tracing::{debug, trace};

/// Smallest zoom factor.
pub const MIN_SCALE: f32 = 1.0;
/// Largest zoom factor.
pub const MAX_SCALE: f32 = 3.0;

/// Size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Routes host input through the engine and maps it onto the remote surface.
#[derive(Debug)]
pub struct SessionInputCoordinator {
    config: InputConfig,
    single: SingleTouchGestureRecognizer,
    dual: DualTouchGestureRecognizer,
    overlay: TouchPointerOverlay,
    overlay_visible: bool,
    keyboard: KeyboardModifierStateMachine,
    pointer: PointerState,
    coalescer: MoveCoalescer,
    auto_scroll: DelayedCallback,

    scale: f32,
    scroll: PointF,
    surface: Size,
    viewport: Size,

    /// A begin-touch was reported and its end-touch is still owed.
    touch_begun: bool,
    /// A long press holds the touch button and moves drag the remote cursor.
    dragging: bool,
    /// Last view position of the drag, where a forced release is sent.
    drag_position: PointF,
}

impl Default for SessionInputCoordinator {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl SessionInputCoordinator {
    pub fn new(config: InputConfig) -> Self {
        let config = config.sanitized();
        let timings = &config.timings;
        let coalesce = CoalesceConfig {
            debounce_ms: timings.move_debounce_ms,
            max_discarded: timings.max_discarded_moves,
        };
        Self {
            single: SingleTouchGestureRecognizer::new(SingleTouchConfig::from_input_config(
                &config,
            )),
            dual: DualTouchGestureRecognizer::new(DualTouchConfig::from_input_config(&config)),
            overlay: TouchPointerOverlay::new(OverlayConfig::from_input_config(&config)),
            overlay_visible: false,
            keyboard: KeyboardModifierStateMachine::new(timings.modifier_lock_window_ms),
            pointer: PointerState::new(config.swap_mouse_buttons),
            coalescer: MoveCoalescer::new(coalesce),
            auto_scroll: DelayedCallback::new(),
            scale: MIN_SCALE,
            scroll: PointF::default(),
            surface: Size::default(),
            viewport: Size::default(),
            touch_begun: false,
            dragging: false,
            drag_position: PointF::default(),
            config,
        }
    }

    pub fn config(&self) -> &InputConfig {
        &self.config
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn scroll_offset(&self) -> PointF {
        self.scroll
    }

    pub fn overlay(&self) -> &TouchPointerOverlay {
        &self.overlay
    }

    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    pub fn keyboard(&self) -> &KeyboardModifierStateMachine {
        &self.keyboard
    }

    pub fn pointer(&self) -> &PointerState {
        &self.pointer
    }

    /// Convert view pixels to remote-surface pixels.
    pub fn map_to_remote(&self, view: PointF) -> Point {
        let x = ((view.x + self.scroll.x) / self.scale) as i32;
        let y = ((view.y + self.scroll.y) / self.scale) as i32;
        Point::new(
            x.clamp(0, self.surface.width as i32),
            y.clamp(0, self.surface.height as i32),
        )
    }

    /// Zoom set by the view layer. Clamped, no notification.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// Scroll offset set by the view layer. Clamped, no notification.
    pub fn set_scroll_offset(&mut self, x: f32, y: f32) {
        self.scroll = self.clamp_scroll(PointF::new(x, y));
    }

    /// Remote desktop size, in remote pixels.
    pub fn set_surface_size(&mut self, width: f32, height: f32) {
        self.surface = Size::new(width, height);
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// Visible view size. Keeps the overlay on screen.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        self.viewport = Size::new(width, height);
        self.scroll = self.clamp_scroll(self.scroll);
        self.overlay.ensure_visibility(width, height);
    }

    /// Show or hide the touch pointer. Hiding it mid-touch abandons the
    /// sequence it captured and releases a button it was holding.
    pub fn show_overlay(&mut self, visible: bool) -> Vec<SessionCommand> {
        debug!("Touch pointer {}", if visible { "shown" } else { "hidden" });
        self.overlay_visible = visible;
        let mut out = Vec::new();
        if visible {
            self.overlay
                .ensure_visibility(self.viewport.width, self.viewport.height);
        } else {
            self.auto_scroll.cancel();
            self.abandon_overlay_sequence(&mut out);
        }
        out
    }

    /// Earliest pending timer deadline across all components.
    pub fn next_deadline(&self) -> Option<u64> {
        earliest([
            self.coalescer.next_deadline(),
            self.single.next_deadline(),
            self.dual.next_deadline(),
            self.overlay.next_deadline(),
            self.auto_scroll.deadline(),
        ])
    }

    /// Fire every timer that is due at `now_ms`, in deadline order.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SessionCommand> {
        let mut out = Vec::new();
        while let Some(deadline) = self.next_deadline().filter(|d| *d <= now_ms) {
            if let Some(position) = self.coalescer.tick(deadline) {
                out.push(SessionCommand::PointerMove {
                    x: position.x,
                    y: position.y,
                });
            }
            for gesture in self.single.tick(deadline) {
                self.on_single(gesture, deadline, &mut out);
            }
            for gesture in self.dual.tick(deadline) {
                self.on_dual(gesture, &mut out);
            }
            for event in self.overlay.tick(deadline) {
                self.on_overlay(event, deadline, &mut out);
            }
            if self.auto_scroll.fire_if_due(deadline).is_some() {
                self.auto_scroll_step(deadline, &mut out);
            }
        }
        out
    }

    /// Feed one raw pointer event from the session view.
    pub fn handle_pointer_event(&mut self, ev: &PointerEvent) -> Vec<SessionCommand> {
        let now = ev.timestamp_ms;
        let mut out = self.tick(now);

        if ev.phase == PointerPhase::Down
            && (self.single.is_stale(now) || self.dual.is_stale(now) || self.overlay.is_stale(now))
        {
            self.abandon_lost_sequence(&mut out);
        }

        if self.overlay_visible && !self.single.is_tracking() && !self.dual.is_active() {
            if let Some(events) = self.overlay.handle_event(ev) {
                for event in events {
                    self.on_overlay(event, now, &mut out);
                }
                return out;
            }
        }

        for gesture in self.dual.handle_event(ev) {
            self.on_dual(gesture, &mut out);
        }
        for gesture in self.single.handle_event(ev) {
            self.on_single(gesture, now, &mut out);
        }
        if ev.phase == PointerPhase::Cancel {
            self.cancel_touch(&mut out);
        }
        out
    }

    /// Translate a host keyboard event.
    pub fn handle_key_event(&mut self, ev: &HostKeyEvent) -> Vec<SessionCommand> {
        self.keyboard.process_host_key_event(ev)
    }

    /// Translate a key of the auxiliary on-screen keyboards.
    pub fn handle_overlay_key(&mut self, code: u32, now_ms: u64) -> Vec<SessionCommand> {
        let mut out = self.tick(now_ms);
        out.extend(self.keyboard.process_overlay_key_event(code, now_ms));
        out
    }

    /// Host mouse wheel: positive deltas scroll up.
    pub fn handle_wheel(&mut self, delta_y: f32, now_ms: u64) -> Vec<SessionCommand> {
        let mut out = self.tick(now_ms);
        if let Some(direction) = wheel_direction(delta_y) {
            out.push(self.scroll_command(direction));
        }
        out
    }

    pub fn modifier_display_state(&self, code: u32) -> Option<ModifierDisplayState> {
        self.keyboard.modifier_display_state(code)
    }

    /// Release all modifiers, locked ones included.
    pub fn clear_all_modifiers(&mut self) -> Vec<SessionCommand> {
        self.keyboard.clear_all_modifiers()
    }

    /// Forget keyboard state (new session) without sending anything.
    pub fn reset_keyboard(&mut self) {
        self.keyboard.reset();
    }

    pub fn send_alt_f4(&self) -> Vec<SessionCommand> {
        self.keyboard.send_alt_f4()
    }

    fn on_single(&mut self, gesture: SingleTouchEvent, now_ms: u64, out: &mut Vec<SessionCommand>) {
        match gesture {
            SingleTouchEvent::Down { .. } => {}
            SingleTouchEvent::LongPress { position } => {
                self.begin_touch(out);
                self.dragging = true;
                self.drag_position = position;
                self.press_touch_button(position, out);
            }
            SingleTouchEvent::Scroll {
                position,
                distance_x,
                distance_y,
            } => {
                if self.dragging {
                    self.drag_position = position;
                    let remote = self.map_to_remote(position);
                    if let Some(p) = self.coalescer.submit(now_ms, remote) {
                        out.push(SessionCommand::PointerMove { x: p.x, y: p.y });
                    }
                } else {
                    self.pan(PointF::new(distance_x, distance_y), out);
                }
            }
            SingleTouchEvent::LongPressUp { position } => {
                self.dragging = false;
                self.release_touch_button(position, out);
            }
            SingleTouchEvent::SingleTapUp { position } => {
                self.begin_touch(out);
                self.press_touch_button(position, out);
                self.release_touch_button(position, out);
                self.end_touch(out);
            }
            SingleTouchEvent::DoubleTap { position } => {
                self.begin_touch(out);
                self.press_touch_button(position, out);
                self.release_touch_button(position, out);
            }
            SingleTouchEvent::Fling {
                velocity_x,
                velocity_y,
            } => out.push(SessionCommand::Fling {
                velocity_x,
                velocity_y,
            }),
            SingleTouchEvent::Up { .. } => {
                self.dragging = false;
                self.end_touch(out);
            }
        }
    }

    fn on_dual(&mut self, gesture: DualTouchEvent, out: &mut Vec<SessionCommand>) {
        match gesture {
            DualTouchEvent::Begin { .. } => self.begin_touch(out),
            DualTouchEvent::Scroll { direction } => out.push(self.scroll_command(direction)),
            DualTouchEvent::ScaleBegin { focus } => {
                trace!("Pinch started at ({:.1}, {:.1})", focus.x, focus.y);
            }
            DualTouchEvent::Scale { factor, focus } => self.zoom(factor, focus, out),
            DualTouchEvent::ScaleEnd => trace!("Pinch ended at scale {:.2}", self.scale),
            DualTouchEvent::SingleTap { .. } => {
                self.pointer.toggle_right_click();
            }
            DualTouchEvent::End => self.end_touch(out),
        }
    }

    fn on_overlay(&mut self, event: OverlayEvent, now_ms: u64, out: &mut Vec<SessionCommand>) {
        match event {
            OverlayEvent::Move { position } => {
                let p = self.map_to_remote(position);
                out.push(SessionCommand::PointerMove { x: p.x, y: p.y });
                if self.config.auto_scroll_enabled && !self.auto_scroll.is_scheduled() {
                    self.auto_scroll.schedule(
                        now_ms,
                        self.config.timings.auto_scroll_interval_ms,
                        (),
                    );
                }
            }
            OverlayEvent::Button {
                position,
                button,
                down,
            } => self.send_overlay_button(position, button, down, out),
            OverlayEvent::Scroll { direction } => out.push(self.scroll_command(direction)),
            OverlayEvent::ResetZoom => {
                self.scale = MIN_SCALE;
                self.scroll = PointF::default();
                out.push(self.viewport_changed());
            }
            OverlayEvent::ToggleKeyboard => out.push(SessionCommand::ToggleSystemKeyboard),
            OverlayEvent::ToggleExtendedKeyboard => {
                out.push(SessionCommand::ToggleExtendedKeyboard)
            }
            OverlayEvent::Close => {
                out.extend(self.show_overlay(false));
                out.push(SessionCommand::OverlayClosed);
            }
        }
    }

    fn send_overlay_button(
        &mut self,
        position: PointF,
        button: MouseButton,
        down: bool,
        out: &mut Vec<SessionCommand>,
    ) {
        if !down {
            self.coalescer.cancel();
        }
        let button = self.pointer.overlay_button(button, down);
        let p = self.map_to_remote(position);
        out.push(SessionCommand::PointerButton {
            x: p.x,
            y: p.y,
            button,
            down,
        });
    }

    fn abandon_overlay_sequence(&mut self, out: &mut Vec<SessionCommand>) {
        for event in self.overlay.cancel_sequence() {
            if let OverlayEvent::Button {
                position,
                button,
                down,
            } = event
            {
                self.send_overlay_button(position, button, down, out);
            }
        }
    }

    /// A finger landed while the previous sequence had gone silent, so its
    /// pointer-up was lost. Release what it held and close its bracket.
    fn abandon_lost_sequence(&mut self, out: &mut Vec<SessionCommand>) {
        debug!("Touch sequence lost its pointer-up, abandoning it");
        self.abandon_overlay_sequence(out);
        for gesture in self.dual.cancel_sequence() {
            self.on_dual(gesture, out);
        }
        self.single.cancel_sequence();
        if self.dragging {
            self.dragging = false;
            self.release_touch_button(self.drag_position, out);
        }
        self.cancel_touch(out);
    }

    /// Scroll the viewport toward any edge the overlay has been dragged past.
    fn auto_scroll_step(&mut self, now_ms: u64, out: &mut Vec<SessionCommand>) {
        let position = self.overlay.translation();
        let size = self.overlay.size();
        let step = self.config.timings.auto_scroll_step_px;

        let axis = |pos: f32, extent: f32| {
            if pos > extent - size {
                step
            } else if pos < 0.0 {
                -step
            } else {
                0.0
            }
        };
        let delta = PointF::new(
            axis(position.x, self.viewport.width),
            axis(position.y, self.viewport.height),
        );
        let scroll = self.clamp_scroll(self.scroll + delta);
        if scroll == self.scroll {
            trace!("Auto-scroll stopped");
            return;
        }
        self.scroll = scroll;
        out.push(self.viewport_changed());
        self.auto_scroll
            .schedule(now_ms, self.config.timings.auto_scroll_interval_ms, ());
    }

    fn press_touch_button(&mut self, position: PointF, out: &mut Vec<SessionCommand>) {
        let button = self.pointer.touch_press();
        let p = self.map_to_remote(position);
        out.push(SessionCommand::PointerButton {
            x: p.x,
            y: p.y,
            button,
            down: true,
        });
    }

    fn release_touch_button(&mut self, position: PointF, out: &mut Vec<SessionCommand>) {
        self.coalescer.cancel();
        let button = self.pointer.touch_release();
        let p = self.map_to_remote(position);
        out.push(SessionCommand::PointerButton {
            x: p.x,
            y: p.y,
            button,
            down: false,
        });
    }

    fn begin_touch(&mut self, out: &mut Vec<SessionCommand>) {
        if !self.touch_begun {
            self.touch_begun = true;
            out.push(SessionCommand::BeginTouch);
        }
    }

    fn end_touch(&mut self, out: &mut Vec<SessionCommand>) {
        if self.touch_begun {
            self.touch_begun = false;
            out.push(SessionCommand::EndTouch);
        }
    }

    /// Platform cancel: drop pending work and close the view bracket. A held
    /// button is not released.
    fn cancel_touch(&mut self, out: &mut Vec<SessionCommand>) {
        self.coalescer.cancel();
        self.dragging = false;
        self.end_touch(out);
    }

    fn pan(&mut self, distance: PointF, out: &mut Vec<SessionCommand>) {
        let scroll = self.clamp_scroll(self.scroll + distance);
        if scroll != self.scroll {
            self.scroll = scroll;
            out.push(self.viewport_changed());
        }
    }

    /// Apply a pinch step, keeping the focus point under the fingers.
    fn zoom(&mut self, factor: f32, focus: PointF, out: &mut Vec<SessionCommand>) {
        let scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if scale == self.scale {
            return;
        }
        self.scale = scale;
        if scale > MIN_SCALE && scale < MAX_SCALE {
            let shift = PointF::new(focus.x * (factor - 1.0), focus.y * (factor - 1.0));
            self.scroll = self.scroll + shift;
        }
        self.scroll = self.clamp_scroll(self.scroll);
        debug!("Zoom {:.2}", self.scale);
        out.push(self.viewport_changed());
    }

    fn clamp_scroll(&self, scroll: PointF) -> PointF {
        let max_x = (self.surface.width * self.scale - self.viewport.width).max(0.0);
        let max_y = (self.surface.height * self.scale - self.viewport.height).max(0.0);
        PointF::new(scroll.x.clamp(0.0, max_x), scroll.y.clamp(0.0, max_y))
    }

    fn scroll_command(&self, direction: ScrollDirection) -> SessionCommand {
        let direction = if self.config.invert_scrolling {
            direction.inverted()
        } else {
            direction
        };
        SessionCommand::PointerScroll { direction }
    }

    fn viewport_changed(&self) -> SessionCommand {
        SessionCommand::ViewportChanged {
            scale: self.scale,
            scroll_x: self.scroll.x,
            scroll_y: self.scroll.y,
        }
    }
}

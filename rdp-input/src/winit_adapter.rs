//! Convert winit window events into engine input.
//!
//! Touches map one to one. The left mouse button is treated as a single
//! finger so the engine can be driven from a desktop window. Keys with a
//! direct mapping are reported by code; the character winit then delivers for
//! the same key press is swallowed so it is not typed twice.

use crate::events::{HostKeyEvent, MetaState, PointerEvent, PointerPhase};
use crate::keyboard::{host_key_mapping, host_keys};
use tracing::trace;
use winit::event::{
    ElementState, KeyboardInput, ModifiersState, MouseButton, MouseScrollDelta, Touch, TouchPhase,
    VirtualKeyCode, WindowEvent,
};

/// Pointer id used for the emulated mouse finger.
pub const MOUSE_POINTER_ID: u32 = u32::MAX;

/// One unit of host input extracted from a window event.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    Pointer(PointerEvent),
    Key(HostKeyEvent),
    /// Wheel delta, positive away from the user.
    Wheel(f32),
}

/// Stateful winit event translator.
#[derive(Debug, Default)]
pub struct WinitEventAdapter {
    modifiers: ModifiersState,
    cursor: (f32, f32),
    mouse_down: bool,
    swallow_next_char: bool,
}

impl WinitEventAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate `event`, stamped with `timestamp_ms`.
    pub fn handle_window_event(
        &mut self,
        event: &WindowEvent,
        timestamp_ms: u64,
    ) -> Option<HostInput> {
        match event {
            WindowEvent::Touch(touch) => Some(HostInput::Pointer(touch_to_pointer_event(
                touch,
                timestamp_ms,
            ))),
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers = *modifiers;
                None
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x as f32, position.y as f32);
                self.mouse_down
                    .then(|| self.mouse_pointer(PointerPhase::Move, timestamp_ms))
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let phase = match state {
                    ElementState::Pressed => PointerPhase::Down,
                    ElementState::Released => PointerPhase::Up,
                };
                self.mouse_down = *state == ElementState::Pressed;
                Some(self.mouse_pointer(phase, timestamp_ms))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                Some(HostInput::Wheel(y))
            }
            WindowEvent::KeyboardInput { input, .. } => self.keyboard_input(input),
            WindowEvent::ReceivedCharacter(ch) => {
                if std::mem::take(&mut self.swallow_next_char) || ch.is_control() {
                    return None;
                }
                Some(HostInput::Key(HostKeyEvent::down(0, self.meta_state(), *ch as u32)))
            }
            _ => None,
        }
    }

    fn keyboard_input(&mut self, input: &KeyboardInput) -> Option<HostInput> {
        let code = input.virtual_keycode.and_then(host_key_code)?;
        match input.state {
            ElementState::Released => Some(HostInput::Key(HostKeyEvent::up(code))),
            ElementState::Pressed => {
                let meta = self.meta_state();
                // Alt/Sym combinations fall back to the character winit reports
                self.swallow_next_char = host_key_mapping(code).is_some()
                    && !meta.intersects(MetaState::ALT | MetaState::SYM);
                trace!("Key {:?} -> host code {}", input.virtual_keycode, code);
                Some(HostInput::Key(HostKeyEvent::down(code, meta, 0)))
            }
        }
    }

    fn mouse_pointer(&self, phase: PointerPhase, timestamp_ms: u64) -> HostInput {
        let (x, y) = self.cursor;
        HostInput::Pointer(PointerEvent::new(MOUSE_POINTER_ID, x, y, timestamp_ms, phase))
    }

    fn meta_state(&self) -> MetaState {
        let mut meta = MetaState::empty();
        meta.set(MetaState::SHIFT, self.modifiers.shift());
        meta.set(MetaState::ALT, self.modifiers.alt());
        meta.set(MetaState::CTRL, self.modifiers.ctrl());
        meta.set(MetaState::META, self.modifiers.logo());
        meta
    }
}

/// Convert a winit touch into a pointer event.
pub fn touch_to_pointer_event(touch: &Touch, timestamp_ms: u64) -> PointerEvent {
    let phase = match touch.phase {
        TouchPhase::Started => PointerPhase::Down,
        TouchPhase::Moved => PointerPhase::Move,
        TouchPhase::Ended => PointerPhase::Up,
        TouchPhase::Cancelled => PointerPhase::Cancel,
    };
    PointerEvent::new(
        touch.id as u32,
        touch.location.x as f32,
        touch.location.y as f32,
        timestamp_ms,
        phase,
    )
}

/// Host key code for a winit key, for the keys the direct table knows.
pub fn host_key_code(vk: VirtualKeyCode) -> Option<u32> {
    use VirtualKeyCode::*;
    const DIGITS: [VirtualKeyCode; 10] = [
        Key0, Key1, Key2, Key3, Key4, Key5, Key6, Key7, Key8, Key9,
    ];
    const LETTERS: [VirtualKeyCode; 26] = [
        A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    ];

    if let Some(i) = DIGITS.iter().position(|k| *k == vk) {
        return Some(host_keys::KEYCODE_0 + i as u32);
    }
    if let Some(i) = LETTERS.iter().position(|k| *k == vk) {
        return Some(host_keys::KEYCODE_A + i as u32);
    }
    match vk {
        Space => Some(host_keys::KEYCODE_SPACE),
        Return => Some(host_keys::KEYCODE_ENTER),
        Back => Some(host_keys::KEYCODE_DEL),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::KeyPhase;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    fn device() -> DeviceId {
        unsafe { DeviceId::dummy() }
    }

    #[allow(deprecated)]
    fn key_input(vk: VirtualKeyCode, state: ElementState) -> WindowEvent<'static> {
        WindowEvent::KeyboardInput {
            device_id: device(),
            input: KeyboardInput {
                scancode: 0,
                state,
                virtual_keycode: Some(vk),
                modifiers: ModifiersState::empty(),
            },
            is_synthetic: false,
        }
    }

    #[test]
    fn test_touch_phases() {
        let touch = Touch {
            device_id: device(),
            phase: TouchPhase::Started,
            location: PhysicalPosition::new(12.5, 40.0),
            force: None,
            id: 3,
        };
        let ev = touch_to_pointer_event(&touch, 99);
        assert_eq!(ev, PointerEvent::new(3, 12.5, 40.0, 99, PointerPhase::Down));
    }

    #[test]
    fn test_host_key_codes() {
        assert_eq!(host_key_code(VirtualKeyCode::A), Some(host_keys::KEYCODE_A));
        assert_eq!(host_key_code(VirtualKeyCode::Key5), Some(12));
        assert_eq!(host_key_code(VirtualKeyCode::Back), Some(host_keys::KEYCODE_DEL));
        assert_eq!(host_key_code(VirtualKeyCode::F1), None);
    }

    #[test]
    fn test_mapped_key_swallows_character() {
        let mut adapter = WinitEventAdapter::new();
        let press = key_input(VirtualKeyCode::A, ElementState::Pressed);
        let down = adapter.handle_window_event(&press, 0);
        assert!(matches!(down, Some(HostInput::Key(ref k)) if k.phase == KeyPhase::Down));
        assert_eq!(adapter.handle_window_event(&WindowEvent::ReceivedCharacter('a'), 0), None);
        // A character without a key of its own is typed as Unicode
        let euro = adapter.handle_window_event(&WindowEvent::ReceivedCharacter('€'), 1);
        assert!(matches!(euro, Some(HostInput::Key(ref k)) if k.unicode_char == '€' as u32));
    }

    #[test]
    fn test_mouse_as_finger() {
        let mut adapter = WinitEventAdapter::new();
        #[allow(deprecated)]
        let moved = WindowEvent::CursorMoved {
            device_id: device(),
            position: PhysicalPosition::new(10.0, 20.0),
            modifiers: ModifiersState::empty(),
        };
        assert_eq!(adapter.handle_window_event(&moved, 0), None);
        #[allow(deprecated)]
        let press = WindowEvent::MouseInput {
            device_id: device(),
            state: ElementState::Pressed,
            button: MouseButton::Left,
            modifiers: ModifiersState::empty(),
        };
        assert_eq!(
            adapter.handle_window_event(&press, 5),
            Some(HostInput::Pointer(PointerEvent::new(
                MOUSE_POINTER_ID,
                10.0,
                20.0,
                5,
                PointerPhase::Down
            )))
        );
        assert!(matches!(
            adapter.handle_window_event(&moved, 6),
            Some(HostInput::Pointer(PointerEvent {
                phase: PointerPhase::Move,
                ..
            }))
        ));
    }
}

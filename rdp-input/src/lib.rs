//! rdp-input: translate touch and keyboard input for a remote-desktop session
//!
//! This crate turns raw host pointer and key events into remote input
//! (button, move, scroll, virtual-key and Unicode events) plus a few view
//! notifications. [`SessionInputCoordinator`] is the entry point; it owns the
//! gesture recognizers, the on-screen touch pointer and the keyboard modifier
//! state, and maps view coordinates onto the remote surface.
//!
//! Everything runs on the caller's thread. Timers are explicit: call
//! [`SessionInputCoordinator::tick`] when [`SessionInputCoordinator::next_deadline`]
//! is reached.

pub mod config;
mod coordinator;
pub mod errors;
pub mod events;
pub mod gestures;
pub mod keyboard;
mod mouse;
pub mod overlay;
pub mod timer;

#[cfg(feature = "winit")]
pub mod winit_adapter;

pub use config::{GestureTimings, InputConfig};
pub use coordinator::{SessionInputCoordinator, Size, MAX_SCALE, MIN_SCALE};
pub use errors::InputError;
pub use events::{
    HostKeyEvent, KeyPhase, KeyboardLayout, MetaState, MouseButton, PointerEvent, PointerPhase,
    ScrollDirection, SessionCommand, SessionSink,
};
pub use keyboard::{KeyboardModifierStateMachine, ModifierDisplayState, ModifierKey};
pub use mouse::{wheel_direction, ButtonMask, CoalesceConfig, MoveCoalescer, PointerState};
pub use overlay::{OverlayAppearance, OverlayEvent, OverlayZone, TouchPointerOverlay};

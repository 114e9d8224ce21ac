//! Touch gesture recognition.
//!
//! Raw pointer events are fed to two independent recognizers: one for
//! one-finger sequences (taps, long-press drags, scrolls, flings) and one for
//! two-finger sequences (pinch-zoom, vertical scroll, two-finger tap). Both
//! report positions in view pixels; mapping into remote-surface space is done
//! by the coordinator.

mod dual;
mod scale;
mod single;

pub use dual::{DualTouchConfig, DualTouchEvent, DualTouchGestureRecognizer, GestureMode};
pub use scale::{ScaleGesture, ScaleStep};
pub use single::{SingleTouchConfig, SingleTouchEvent, SingleTouchGestureRecognizer};

//! rdp-replay: drive the input engine from a scripted event trace.

pub mod args;
pub mod script;

//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and turns the scheduler's frame
//! decisions into redraw requests and control flow.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};

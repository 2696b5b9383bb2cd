use std::time::Instant;

use winit::window::Window;

use crate::render::{RenderScheduler, WgpuBackend};
use crate::window::RuntimeCtx;

/// Window handle and metadata.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

/// Context passed to `core::App` callbacks.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by the GPU surface
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub renderer: &'a mut RenderScheduler<WgpuBackend<'w>>,
    /// Callback time in the renderer's clock domain.
    pub now: Instant,
    pub runtime: &'a mut RuntimeCtx,
}

use std::time::{Duration, Instant};

use anyhow::Result;

use super::{ResizeError, SurfaceInfo};

/// Contract between a host loop and a renderer.
///
/// Calls must be serialized by the host; `&mut self` on every operation makes
/// that explicit.
pub trait Renderer {
    /// Draws one frame, ideally within `budget`.
    ///
    /// The budget is advisory. Failures are handled inside the renderer and
    /// never surface here.
    fn render(&mut self, budget: Duration);

    /// Called whenever the drawing surface changes size or scale.
    ///
    /// On error the previously allocated targets stay valid.
    fn resize(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError>;

    /// Binds the graphics context. Must precede drawing, and must be repeated
    /// after the context is lost. Calling it twice is harmless.
    fn use_context(&mut self) -> Result<()>;

    /// Keeps frames coming until `until`, so fades are not cut off.
    ///
    /// Extend-only: an earlier time never shortens a pending deadline.
    fn set_render_until(&mut self, until: Instant);
}

use std::time::Duration;

use anyhow::Result;

use crate::paint::Color;
use crate::time::FrameTime;

use super::{FrameError, ResizeError, SurfaceInfo};

/// Closed set of backends shipped with the engine.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BackendKind {
    /// CPU framebuffer; headless hosts and tests.
    Software,
    /// GPU swapchain through wgpu.
    Wgpu,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Software => "software",
            BackendKind::Wgpu => "wgpu",
        }
    }
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameInput<'a> {
    pub time: FrameTime,
    pub budget: Duration,
    pub clear: Color,
    pub surface: &'a SurfaceInfo,
}

/// Implementation side of the render contract.
///
/// The scheduler guarantees ordering (bind before draw, validated surfaces
/// before `resize_targets`); backends own the context and the size-dependent
/// targets.
pub trait RenderBackend {
    fn kind(&self) -> BackendKind;

    /// Makes the backend's context usable. Repeated calls re-bind without
    /// acquiring a second context.
    fn bind_context(&mut self) -> Result<()>;

    /// Drops the binding after a context-invalidating event.
    fn release_context(&mut self);

    /// Replaces the size-dependent targets.
    ///
    /// Backend-specific limits are checked before anything is touched; on error
    /// the old targets must remain in place.
    fn resize_targets(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError>;

    /// Draws and presents one frame.
    ///
    /// An error must leave nothing half-presented.
    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), FrameError>;
}

use anyhow::Result;

use crate::device::{DepthTarget, Gpu, SurfaceErrorAction};

use super::{BackendKind, FrameError, FrameInput, RenderBackend, ResizeError, SurfaceInfo};

/// GPU backend over wgpu.
///
/// The swapchain is the color target; a depth texture is the other
/// size-dependent target. "Binding the context" configures the swapchain for
/// the current size, since wgpu has no thread-current context.
pub struct WgpuBackend<'w> {
    gpu: Gpu<'w>,
    depth: Option<DepthTarget>,
    bound: bool,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>) -> Self {
        Self {
            gpu,
            depth: None,
            bound: false,
        }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    /// Surface description matching the current swapchain format.
    pub fn surface_info(&self, width: u32, height: u32, scale_factor: f64) -> SurfaceInfo {
        SurfaceInfo::new(width, height, scale_factor, self.gpu.surface_format())
    }
}

impl RenderBackend for WgpuBackend<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Wgpu
    }

    fn bind_context(&mut self) -> Result<()> {
        if !self.gpu.configure() {
            log::debug!("surface has zero size; configuration deferred to the next resize");
        }
        self.bound = true;
        Ok(())
    }

    fn release_context(&mut self) {
        self.bound = false;
    }

    fn resize_targets(&mut self, surface: &SurfaceInfo) -> Result<(), ResizeError> {
        if surface.format != self.gpu.surface_format() {
            return Err(ResizeError::UnsupportedFormat(surface.format));
        }

        let max = self.gpu.max_texture_dimension();
        if surface.width > max || surface.height > max {
            return Err(ResizeError::TooLarge {
                width: surface.width,
                height: surface.height,
                max,
            });
        }

        let depth = self.gpu.create_depth_target(surface.width, surface.height);
        self.gpu.resize(surface.width, surface.height);
        // The previous depth texture is released here.
        self.depth = Some(depth);
        Ok(())
    }

    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), FrameError> {
        if !self.bound {
            return Err(FrameError::Skipped("context not bound".to_string()));
        }
        let Some(depth) = self.depth.as_ref() else {
            return Err(FrameError::Skipped("no depth target".to_string()));
        };

        let mut gpu_frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let reason = err.to_string();
                return Err(surface_failure(self.gpu.handle_surface_error(err), reason));
            }
        };

        let scope = self.gpu.validation_scope();
        gpu_frame.clear(frame.clear.to_wgpu(), depth);
        self.gpu.submit(gpu_frame, scope).map_err(rejected_frame)
    }
}

/// Maps a failed swapchain acquisition after the surface handled it.
fn surface_failure(action: SurfaceErrorAction, reason: String) -> FrameError {
    match action {
        SurfaceErrorAction::Fatal => FrameError::Fatal(reason),
        SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
            FrameError::Skipped(reason)
        }
    }
}

/// Maps an error caught while recording a frame. The frame was not submitted.
fn rejected_frame(err: wgpu::Error) -> FrameError {
    match err {
        wgpu::Error::OutOfMemory { .. } => FrameError::Fatal(err.to_string()),
        wgpu::Error::Validation { .. } | wgpu::Error::Internal { .. } => {
            FrameError::Skipped(format!("frame commands rejected: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_surface_errors_stop_rendering() {
        let reason = || "Surface timed out".to_string();
        assert!(matches!(
            surface_failure(SurfaceErrorAction::Reconfigured, reason()),
            FrameError::Skipped(_)
        ));
        assert!(matches!(
            surface_failure(SurfaceErrorAction::SkipFrame, reason()),
            FrameError::Skipped(_)
        ));
        assert_eq!(
            surface_failure(SurfaceErrorAction::Fatal, reason()),
            FrameError::Fatal(reason())
        );
    }

    #[test]
    fn invalid_commands_skip_the_frame() {
        let err = wgpu::Error::Validation {
            source: "depth attachment size mismatch".into(),
            description: "depth attachment size mismatch".to_string(),
        };
        match rejected_frame(err) {
            FrameError::Skipped(reason) => {
                assert!(reason.contains("depth attachment size mismatch"), "{reason}")
            }
            other => panic!("expected a skipped frame, got {other:?}"),
        }
    }

    #[test]
    fn out_of_memory_while_recording_is_fatal() {
        let err = wgpu::Error::OutOfMemory {
            source: "allocation failed".into(),
        };
        assert!(matches!(rejected_frame(err), FrameError::Fatal(_)));
    }
}

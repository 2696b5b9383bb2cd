//! Render scheduling.
//!
//! The [`Renderer`] trait is the host-facing contract: render within an
//! advisory budget, resize, bind the context, extend the render-until
//! deadline. [`RenderScheduler`] implements it over a pluggable
//! [`RenderBackend`] and decides when the next frame is due.
//!
//! Convention:
//! - every timestamp is in the scheduler's `Clock` domain
//! - drawing only happens after `use_context`, on the object that owns the context

mod backend;
mod config;
mod error;
mod renderer;
mod scheduler;
mod software;
mod surface;
mod wgpu_backend;

pub use backend::{BackendKind, FrameInput, RenderBackend};
pub use config::SchedulerConfig;
pub use error::{FrameError, ResizeError};
pub use renderer::Renderer;
pub use scheduler::{RenderScheduler, Schedule, SchedulerState};
pub use software::{SoftwareBackend, TargetLedger};
pub use surface::SurfaceInfo;
pub use wgpu_backend::WgpuBackend;

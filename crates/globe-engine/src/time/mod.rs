//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `Clock` per scheduler; every timestamp handed to the scheduler comes from it
//! - one `FrameClock` per render loop, ticked once per drawn frame
//! - one `RenderDeadline` per renderer, extended by animations

mod clock;
mod deadline;
mod frame_clock;
mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use deadline::RenderDeadline;
pub use frame_clock::{FrameClock, FrameTime};
pub use stats::{FrameReport, FrameStats};

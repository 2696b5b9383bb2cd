//! Globe engine crate.
//!
//! This crate owns the render-scheduling contract and the platform + GPU
//! runtime pieces used by viewers.

pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod time;
pub mod window;

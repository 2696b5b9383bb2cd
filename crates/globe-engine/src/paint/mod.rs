//! Paint model shared between the scheduler and backends.
//!
//! Scope: color representation (linear premultiplied alpha) and color
//! animation helpers.

pub mod color;
pub mod fade;

pub use color::Color;
pub use fade::ColorFade;

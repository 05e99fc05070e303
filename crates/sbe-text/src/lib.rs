//! sbe Text
//!
//! Turns fetched markup into plain text and lays it out on a fixed
//! character grid.

mod render;
mod layout;

pub use render::render;
pub use layout::{layout, DisplayItem, LayoutConfig, HSTEP, VSTEP, WIDTH};

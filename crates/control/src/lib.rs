//! Orientation control for the solar tracker: circular-angle math,
//! drag-to-angle input mapping, and the pan/tilt control loop.

pub mod circular;
pub mod controller;
pub mod drag;

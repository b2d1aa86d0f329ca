//! Utility Module
//!
//! - [`OrbitControls`]: orbit camera driven by viewport commands
//!   (zoom in/out, rotate, pan)

pub mod orbit_control;

pub use orbit_control::OrbitControls;

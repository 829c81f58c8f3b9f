//! Peripheral drivers for the sensor and indicator outputs.

pub mod indicator;
pub mod sht31;

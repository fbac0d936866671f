//! The control loop: speed curve, hysteresis controller and its sleep abstraction.

pub mod clock;
pub mod curve;
pub mod hysteresis;

// src/motion/mod.rs - Torque curve shaping and trajectory expansion
pub mod shaper;
pub mod trajectory;

pub use shaper::{generate, ShapingError, ShapingFunction, TorqueCurve, CURVE_LEN};
pub use trajectory::{expand, parse_stopping_points, Trajectory, TrajectoryError};

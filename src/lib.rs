// torque-link: torque correction frames for a serial motion controller
//
// parameters -> motion::shaper (curve) + motion::trajectory (positions)
//            -> communication::frame (frames) -> hardware::transport (samples)

pub mod communication;
pub mod config;
pub mod driver;
pub mod error;
pub mod hardware;
pub mod motion;

pub use driver::{Driver, PreparedSend, SendOutcome, SendRequest};
pub use error::{DriverError, DriverResult, ErrorCategory};

// src/driver.rs - One user-initiated send operation
//
// Parameters arrive as a plain struct; the curve and frames flow by value
// from the generator through the encoder into the transport. Only one
// operation may own the port at a time.

use crate::communication::frame::{encode, ControlMode, Frame, FrameHeader, Sample};
use crate::config::Config;
use crate::error::{DriverError, DriverResult};
use crate::hardware::serial::SerialInterface;
use crate::hardware::transport::{Transport, TransportMode};
use crate::motion::shaper::{generate, ShapingFunction, TorqueCurve};
use crate::motion::trajectory::{expand, parse_stopping_points, Trajectory};
use std::time::Duration;
use tokio::sync::Mutex;

/// Everything the operator supplies for one send.
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub shaping: Option<ShapingFunction>,
    pub tolerance_deg: u16,
    pub const_value: i64,
    pub amplitude: u8,
    pub frequency: u8,
    pub control_mode: ControlMode,
    /// Whitespace separated stopping points.
    pub trajectory: String,
    pub port: String,
    pub mode: Option<TransportMode>,
}

impl SendRequest {
    pub fn from_config(config: &Config) -> Self {
        Self {
            shaping: config.shaping.function,
            tolerance_deg: config.shaping.tolerance,
            const_value: config.shaping.constant,
            amplitude: config.frame.amplitude,
            frequency: config.frame.frequency,
            control_mode: config.frame.control_mode,
            trajectory: config.motion.trajectory.clone(),
            port: config.device.port.clone(),
            mode: config.transport.mode,
        }
    }

    pub fn header(&self) -> FrameHeader {
        FrameHeader {
            control_mode: self.control_mode,
            amplitude: self.amplitude,
            frequency: self.frequency,
        }
    }

    /// Generate the torque curve for display, without touching the port.
    pub fn curve(&self) -> DriverResult<TorqueCurve> {
        let function = self.shaping.ok_or(DriverError::MissingShaping)?;
        Ok(generate(function, self.tolerance_deg, self.const_value)?)
    }

    pub fn trajectory(&self) -> DriverResult<Trajectory> {
        Ok(expand(parse_stopping_points(&self.trajectory).as_slice())?)
    }

    /// Validate every parameter and build the frames. No I/O.
    ///
    /// Read-only sends carry no trajectory frames; the trajectory is still
    /// parsed so a malformed one fails the same way in every mode.
    pub fn prepare(&self) -> DriverResult<PreparedSend> {
        let curve = self.curve()?;
        let mode = self.mode.ok_or(DriverError::MissingMode)?;
        let trajectory = self.trajectory()?;
        let frames = match mode {
            TransportMode::ReadOnly => Vec::new(),
            TransportMode::WriteOnly | TransportMode::WriteThenRead => {
                encode(&trajectory, &curve, self.header())
            }
        };
        Ok(PreparedSend {
            curve,
            frames,
            mode,
            port: self.port.clone(),
        })
    }
}

/// A validated request, ready for the transport.
#[derive(Debug, Clone)]
pub struct PreparedSend {
    pub curve: TorqueCurve,
    pub frames: Vec<Frame>,
    pub mode: TransportMode,
    pub port: String,
}

/// What a completed send hands back for display.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub curve: TorqueCurve,
    pub frames_sent: usize,
    pub samples: Vec<Sample>,
}

pub struct Driver<S: SerialInterface> {
    serial: S,
    read_timeout: Duration,
    in_flight: Mutex<()>,
}

impl<S: SerialInterface> Driver<S> {
    pub fn new(serial: S, read_timeout: Duration) -> Self {
        Self {
            serial,
            read_timeout,
            in_flight: Mutex::new(()),
        }
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Validate, encode and exchange frames with the device.
    ///
    /// A second call while one is running fails with [`DriverError::Busy`].
    pub async fn send(&self, request: &SendRequest) -> DriverResult<SendOutcome> {
        let _guard = self.in_flight.try_lock().map_err(|_| {
            tracing::debug!("Rejected send to {}: operation in progress", request.port);
            DriverError::Busy
        })?;

        let prepared = request.prepare()?;
        tracing::info!(
            "Sending {} frame(s) to {} ({})",
            prepared.frames.len(),
            prepared.port,
            prepared.mode
        );

        let mut transport = Transport::new(&self.serial, prepared.port.as_str(), self.read_timeout);
        let report = transport.run(prepared.mode, &prepared.frames).await?;

        Ok(SendOutcome {
            curve: prepared.curve,
            frames_sent: report.frames_sent,
            samples: report.samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    fn request() -> SendRequest {
        SendRequest::from_config(&Config::default())
    }

    #[test]
    fn defaults_need_function_and_mode() {
        let err = request().prepare().unwrap_err();
        assert!(matches!(err, DriverError::MissingShaping));
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let mut req = request();
        req.shaping = Some(ShapingFunction::Linear);
        assert!(matches!(req.prepare(), Err(DriverError::MissingMode)));
    }

    #[test]
    fn prepare_builds_one_frame_per_step() {
        let mut req = request();
        req.shaping = Some(ShapingFunction::Sinh);
        req.mode = Some(TransportMode::WriteOnly);
        req.trajectory = "0 10 5".to_string();
        let prepared = req.prepare().unwrap();
        assert_eq!(prepared.frames.len(), 15);
        assert_eq!(prepared.port, "COM3");
        assert_eq!(prepared.frames[0].header(), &[0x2C, 0x4D, 0x01, 0x00, 0x01, 255, 128]);
    }

    #[test]
    fn bad_trajectory_is_configuration_error() {
        let mut req = request();
        req.shaping = Some(ShapingFunction::Linear);
        req.mode = Some(TransportMode::WriteOnly);
        req.trajectory = "0 9O".to_string();
        let err = req.prepare().unwrap_err();
        assert!(matches!(err, DriverError::Trajectory(_)));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn read_only_prepares_no_frames() {
        let mut req = request();
        req.shaping = Some(ShapingFunction::Cubic);
        req.mode = Some(TransportMode::ReadOnly);
        let prepared = req.prepare().unwrap();
        assert!(prepared.frames.is_empty());
        assert_eq!(prepared.mode, TransportMode::ReadOnly);
        assert_eq!(prepared.curve, req.curve().unwrap());

        req.trajectory = "0 x".to_string();
        assert!(matches!(req.prepare(), Err(DriverError::Trajectory(_))));
    }

    #[test]
    fn constant_out_of_range_is_configuration_error() {
        let mut req = request();
        req.shaping = Some(ShapingFunction::Constant);
        req.const_value = 300;
        assert_eq!(req.curve().unwrap_err().category(), ErrorCategory::Configuration);
    }
}

//! Wire format for torque frames and telemetry replies.
//!
//! Outbound frames are a fixed 7-byte header followed by the 360 torque
//! samples, rotated so the device sees the curve aligned to the current
//! trajectory position. Replies are fixed 15-byte telemetry records.

use crate::motion::shaper::{TorqueCurve, CURVE_LEN};
use crate::motion::trajectory::Trajectory;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAGIC: [u8; 2] = [0x2C, 0x4D];
pub const HEADER_LEN: usize = 7;
/// Header plus one byte per degree.
pub const FRAME_LEN: usize = HEADER_LEN + CURVE_LEN;
pub const REPLY_LEN: usize = 15;

/// Raw degree values in replies are biased by this amount.
pub const DEGREE_BIAS: i32 = 180;

const DEGREE_OFFSET: usize = 7;
const TORQUE_OFFSET: usize = 11;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("Invalid reply length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Control mode byte at offset 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    St,
    #[default]
    Pt,
}

impl ControlMode {
    pub fn byte(self) -> u8 {
        match self {
            ControlMode::St => 0x00,
            ControlMode::Pt => 0x01,
        }
    }
}

/// Fixed metadata carried in every frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub control_mode: ControlMode,
    /// Dynamic range scale; 255 means ±6 torque units.
    pub amplitude: u8,
    /// Angular scale; 128 means ±180°.
    pub frequency: u8,
}

impl Default for FrameHeader {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Pt,
            amplitude: 255,
            frequency: 128,
        }
    }
}

impl FrameHeader {
    pub fn new(amplitude: u8, frequency: u8) -> Self {
        Self {
            amplitude,
            frequency,
            ..Self::default()
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_LEN] {
        [
            MAGIC[0],
            MAGIC[1],
            0x01,
            0x00,
            self.control_mode.byte(),
            self.amplitude,
            self.frequency,
        ]
    }
}

/// One outbound message. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    pub fn new(header: FrameHeader, payload: &[u8; CURVE_LEN]) -> Self {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[..HEADER_LEN].copy_from_slice(&header.to_bytes());
        bytes[HEADER_LEN..].copy_from_slice(payload);
        Self { bytes }
    }

    /// Frame sent before sampling live telemetry: full scale header, zero torque.
    pub fn telemetry_request() -> Self {
        Self::new(FrameHeader::default(), &[0u8; CURVE_LEN])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn header(&self) -> &[u8] {
        &self.bytes[..HEADER_LEN]
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LEN..]
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("header", &self.header())
            .field("payload_len", &self.payload().len())
            .finish()
    }
}

/// Copy of `curve` rotated right by `position` (mod 360). Negative positions rotate left.
pub fn rotate_curve(curve: &TorqueCurve, position: i32) -> [u8; CURVE_LEN] {
    let mut rotated = *curve.samples();
    let shift = position.rem_euclid(CURVE_LEN as i32) as usize;
    rotated.rotate_right(shift);
    rotated
}

/// Encode one frame per trajectory position.
pub fn encode(trajectory: &Trajectory, curve: &TorqueCurve, header: FrameHeader) -> Vec<Frame> {
    let frames: Vec<Frame> = trajectory
        .positions()
        .iter()
        .map(|&position| Frame::new(header, &rotate_curve(curve, position)))
        .collect();
    tracing::debug!(
        frames = frames.len(),
        amplitude = header.amplitude,
        frequency = header.frequency,
        "Encoded frames"
    );
    frames
}

/// One decoded telemetry reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub degree: i32,
    pub torque: i32,
}

/// Decode a 15-byte telemetry reply. Bytes outside the degree and torque fields are ignored.
pub fn decode_reply(data: &[u8]) -> Result<Sample, DecodeError> {
    if data.len() < REPLY_LEN {
        return Err(DecodeError::InvalidLength {
            expected: REPLY_LEN,
            actual: data.len(),
        });
    }

    let raw_degree = u16::from_be_bytes([data[DEGREE_OFFSET], data[DEGREE_OFFSET + 1]]);
    let raw_torque = u16::from_be_bytes([data[TORQUE_OFFSET], data[TORQUE_OFFSET + 1]]);

    Ok(Sample {
        degree: i32::from(raw_degree) - DEGREE_BIAS,
        torque: i32::from(raw_torque),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::shaper::{generate, ShapingFunction};

    fn ramp_curve() -> TorqueCurve {
        let mut samples = [0u8; CURVE_LEN];
        for (i, slot) in samples.iter_mut().enumerate() {
            *slot = (i % 256) as u8;
        }
        TorqueCurve::from_samples(samples)
    }

    #[test]
    fn frame_layout() {
        let curve = generate(ShapingFunction::Constant, 0, 3).unwrap();
        let frames = encode(&Trajectory::from(vec![0]), &curve, FrameHeader::new(200, 64));
        assert_eq!(frames.len(), 1);
        let bytes = frames[0].as_bytes();
        assert_eq!(bytes.len(), 367);
        assert_eq!(&bytes[..7], &[0x2C, 0x4D, 0x01, 0x00, 0x01, 200, 64]);
        assert!(bytes[7..].iter().all(|&b| b == 3));
    }

    #[test]
    fn st_control_mode_byte() {
        let header = FrameHeader {
            control_mode: ControlMode::St,
            ..FrameHeader::default()
        };
        assert_eq!(header.to_bytes()[4], 0x00);
    }

    #[test]
    fn rotates_right_by_position() {
        let curve = ramp_curve();
        let rotated = rotate_curve(&curve, 1);
        assert_eq!(rotated[0], curve.samples()[359]);
        assert_eq!(&rotated[1..], &curve.samples()[..359]);
    }

    #[test]
    fn negative_position_rotates_left() {
        let curve = ramp_curve();
        let rotated = rotate_curve(&curve, -1);
        assert_eq!(rotated[359], curve.samples()[0]);
        assert_eq!(&rotated[..359], &curve.samples()[1..]);
        assert_eq!(rotate_curve(&curve, -361), rotated);
    }

    #[test]
    fn full_cycle_restores_curve() {
        let curve = ramp_curve();
        assert_eq!(&rotate_curve(&curve, 360), curve.samples());
        assert_eq!(&rotate_curve(&curve, -720), curve.samples());
        assert_eq!(rotate_curve(&curve, 361), rotate_curve(&curve, 1));
    }

    #[test]
    fn encoding_leaves_curve_untouched() {
        let curve = ramp_curve();
        let before = curve.clone();
        let frames = encode(&Trajectory::from(vec![5, 90, -3]), &curve, FrameHeader::default());
        assert_eq!(curve, before);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].payload(), &rotate_curve(&before, 90)[..]);
        assert_eq!(frames[2].payload(), &rotate_curve(&before, -3)[..]);
    }

    #[test]
    fn telemetry_request_is_zero_payload() {
        let request = Frame::telemetry_request();
        assert_eq!(request.header(), &[0x2C, 0x4D, 0x01, 0x00, 0x01, 255, 128]);
        assert!(request.payload().iter().all(|&b| b == 0));
        assert_eq!(request.as_bytes().len(), FRAME_LEN);
    }

    #[test]
    fn decodes_degree_and_torque() {
        let mut reply = [0xAAu8; REPLY_LEN];
        reply[7] = 0x00;
        reply[8] = 0xB4;
        reply[11] = 0x00;
        reply[12] = 0x2A;
        assert_eq!(decode_reply(&reply), Ok(Sample { degree: 0, torque: 42 }));
    }

    #[test]
    fn decodes_big_endian_fields() {
        let mut reply = [0u8; REPLY_LEN];
        reply[7] = 0x01;
        reply[8] = 0x68;
        reply[11] = 0x12;
        reply[12] = 0x34;
        let sample = decode_reply(&reply).unwrap();
        assert_eq!(sample.degree, 360 - 180);
        assert_eq!(sample.torque, 0x1234);
        assert_eq!(decode_reply(&[0u8; REPLY_LEN]).unwrap().degree, -180);
    }

    #[test]
    fn short_reply_is_rejected() {
        assert_eq!(
            decode_reply(&[0u8; 14]),
            Err(DecodeError::InvalidLength {
                expected: 15,
                actual: 14
            })
        );
    }
}

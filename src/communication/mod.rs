// src/communication/mod.rs - Device wire format
pub mod frame;

pub use frame::{
    decode_reply, encode, rotate_curve, ControlMode, DecodeError, Frame, FrameHeader, Sample,
    FRAME_LEN, REPLY_LEN,
};

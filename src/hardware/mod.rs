// src/hardware/mod.rs - Serial access and device transport
pub mod serial;
pub mod transport;

pub use serial::{HostSerial, SerialInterface, SerialLink, BAUD_RATE};
pub use transport::{
    Transport, TransportError, TransportMode, TransportReport, TransportState, READ_ONLY_SAMPLES,
};

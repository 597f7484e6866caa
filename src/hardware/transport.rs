// src/hardware/transport.rs - Three-mode frame exchange with the device
//
// One run is one user-initiated operation: the port is opened on entry and
// closed on every exit path. Writes and reads are strictly sequential; in
// write-then-read mode each reply belongs to the frame written just before it.

use crate::communication::frame::{decode_reply, DecodeError, Frame, Sample, REPLY_LEN};
use crate::hardware::serial::{SerialInterface, SerialLink, BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Replies sampled in read-only mode.
pub const READ_ONLY_SAMPLES: usize = 500;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{port} port is not opened: {source}")]
    PortUnavailable {
        port: String,
        #[source]
        source: io::Error,
    },
    #[error("Write to {port} failed after {frames_sent} frame(s): {source}")]
    Write {
        port: String,
        frames_sent: usize,
        #[source]
        source: io::Error,
    },
    #[error("Read of reply {index} from {port} failed: {source}")]
    Read {
        port: String,
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("Short reply {index} from {port}: got {received} of {expected} bytes")]
    ShortReply {
        port: String,
        index: usize,
        received: usize,
        expected: usize,
    },
    #[error("Timed out after {timeout_ms} ms waiting for reply {index} from {port}")]
    ReplyTimeout {
        port: String,
        index: usize,
        timeout_ms: u128,
    },
    #[error("Undecodable reply: {0}")]
    Decode(#[from] DecodeError),
}

impl TransportError {
    /// Port or link failure, as opposed to a malformed or missing reply.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            TransportError::PortUnavailable { .. }
                | TransportError::Write { .. }
                | TransportError::Read { .. }
        )
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown transport mode '{0}' (expected write_only, read_only or write_then_read)")]
pub struct UnknownModeError(pub String);

/// How frames and replies are sequenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Send every frame, expect nothing back.
    WriteOnly,
    /// Send one zero-torque request, then sample telemetry.
    ReadOnly,
    /// Send each frame and read its reply.
    WriteThenRead,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportMode::WriteOnly => "write_only",
            TransportMode::ReadOnly => "read_only",
            TransportMode::WriteThenRead => "write_then_read",
        })
    }
}

impl FromStr for TransportMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "write_only" | "write" | "w" => Ok(TransportMode::WriteOnly),
            "read_only" | "read" | "r" => Ok(TransportMode::ReadOnly),
            "write_then_read" | "read_write" | "rw" => Ok(TransportMode::WriteThenRead),
            _ => Err(UnknownModeError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Idle,
    Opened,
    Writing,
    ReadingOnly,
    WritingThenReading,
    Closed,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportReport {
    pub frames_sent: usize,
    pub samples: Vec<Sample>,
}

pub struct Transport<'a, S: SerialInterface> {
    serial: &'a S,
    port: String,
    read_timeout: Duration,
    state: TransportState,
}

impl<'a, S: SerialInterface> Transport<'a, S> {
    pub fn new(serial: &'a S, port: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            serial,
            port: port.into(),
            read_timeout,
            state: TransportState::Idle,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    fn transition(&mut self, next: TransportState) {
        tracing::debug!("Transport {:?} -> {:?} on {}", self.state, next, self.port);
        self.state = next;
    }

    /// Run one operation. `frames` is ignored in [`TransportMode::ReadOnly`].
    pub async fn run(
        &mut self,
        mode: TransportMode,
        frames: &[Frame],
    ) -> Result<TransportReport, TransportError> {
        self.transition(TransportState::Idle);

        let mut link = match self.serial.open(&self.port, BAUD_RATE).await {
            Ok(link) => link,
            Err(source) => {
                tracing::debug!("Open of {} failed: {}", self.port, source);
                self.transition(TransportState::Closed);
                return Err(TransportError::PortUnavailable {
                    port: self.port.clone(),
                    source,
                });
            }
        };
        tracing::info!("Opened {} at {} baud ({})", self.port, BAUD_RATE, mode);
        self.transition(TransportState::Opened);

        let result = match mode {
            TransportMode::WriteOnly => {
                self.transition(TransportState::Writing);
                self.write_only(&mut link, frames).await
            }
            TransportMode::ReadOnly => {
                self.transition(TransportState::ReadingOnly);
                self.read_only(&mut link).await
            }
            TransportMode::WriteThenRead => {
                self.transition(TransportState::WritingThenReading);
                self.write_then_read(&mut link, frames).await
            }
        };

        drop(link);
        self.transition(TransportState::Closed);
        match &result {
            Ok(report) => tracing::info!(
                "Closed {}: {} frame(s) sent, {} sample(s) decoded",
                self.port,
                report.frames_sent,
                report.samples.len()
            ),
            Err(e) => tracing::debug!("Closed {} after failure: {}", self.port, e),
        }
        result
    }

    async fn write_only(
        &self,
        link: &mut S::Link,
        frames: &[Frame],
    ) -> Result<TransportReport, TransportError> {
        for (sent, frame) in frames.iter().enumerate() {
            self.write_frame(link, frame, sent).await?;
        }
        Ok(TransportReport {
            frames_sent: frames.len(),
            samples: Vec::new(),
        })
    }

    async fn read_only(&self, link: &mut S::Link) -> Result<TransportReport, TransportError> {
        self.write_frame(link, &Frame::telemetry_request(), 0).await?;
        let mut samples = Vec::with_capacity(READ_ONLY_SAMPLES);
        for index in 0..READ_ONLY_SAMPLES {
            samples.push(self.read_sample(link, index).await?);
        }
        Ok(TransportReport {
            frames_sent: 1,
            samples,
        })
    }

    async fn write_then_read(
        &self,
        link: &mut S::Link,
        frames: &[Frame],
    ) -> Result<TransportReport, TransportError> {
        let mut samples = Vec::with_capacity(frames.len());
        for (index, frame) in frames.iter().enumerate() {
            self.write_frame(link, frame, index).await?;
            samples.push(self.read_sample(link, index).await?);
        }
        Ok(TransportReport {
            frames_sent: frames.len(),
            samples,
        })
    }

    async fn write_frame(
        &self,
        link: &mut S::Link,
        frame: &Frame,
        frames_sent: usize,
    ) -> Result<(), TransportError> {
        tracing::trace!("TX frame {} ({} bytes)", frames_sent, frame.as_bytes().len());
        link.write_all(frame.as_bytes())
            .await
            .map_err(|source| TransportError::Write {
                port: self.port.clone(),
                frames_sent,
                source,
            })
    }

    async fn read_sample(&self, link: &mut S::Link, index: usize) -> Result<Sample, TransportError> {
        let mut reply = [0u8; REPLY_LEN];
        let received = match timeout(self.read_timeout, fill_reply(link, &mut reply)).await {
            Ok(Ok(received)) => received,
            Ok(Err(source)) => {
                return Err(TransportError::Read {
                    port: self.port.clone(),
                    index,
                    source,
                });
            }
            Err(_) => {
                return Err(TransportError::ReplyTimeout {
                    port: self.port.clone(),
                    index,
                    timeout_ms: self.read_timeout.as_millis(),
                });
            }
        };

        if received < REPLY_LEN {
            tracing::warn!("Short reply {} from {}: {} bytes", index, self.port, received);
            return Err(TransportError::ShortReply {
                port: self.port.clone(),
                index,
                received,
                expected: REPLY_LEN,
            });
        }

        let sample = decode_reply(&reply)?;
        tracing::trace!("RX reply {}: {:?}", index, sample);
        Ok(sample)
    }
}

/// Read until `reply` is full or the stream ends. Returns the bytes received.
async fn fill_reply<L: SerialLink>(link: &mut L, reply: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < reply.len() {
        match link.read(&mut reply[filled..]).await {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

// src/hardware/serial.rs - Serial port access behind a mockable interface
use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;

/// Baud rate the device firmware is fixed to.
pub const BAUD_RATE: u32 = 115_200;

/// An open, exclusively owned serial connection. Dropping it closes the port.
#[async_trait]
pub trait SerialLink: Send {
    /// Write the whole buffer or fail.
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Read whatever is available into `buf`. `Ok(0)` means end of stream.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Opens serial links by port identifier.
#[async_trait]
pub trait SerialInterface: Send + Sync {
    type Link: SerialLink;

    async fn open(&self, port: &str, baud: u32) -> io::Result<Self::Link>;

    fn available_ports(&self) -> Vec<String>;
}

/// Host serial ports via serial2-tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSerial;

#[async_trait]
impl SerialInterface for HostSerial {
    type Link = HostLink;

    async fn open(&self, port: &str, baud: u32) -> io::Result<HostLink> {
        let serial = serial2_tokio::SerialPort::open(port, baud)?;
        Ok(HostLink { port: serial })
    }

    fn available_ports(&self) -> Vec<String> {
        match serial2_tokio::SerialPort::available_ports() {
            Ok(paths) => paths.iter().map(|p| p.display().to_string()).collect(),
            Err(e) => {
                tracing::warn!("Failed to enumerate serial ports: {}", e);
                vec![]
            }
        }
    }
}

pub struct HostLink {
    port: serial2_tokio::SerialPort,
}

#[async_trait]
impl SerialLink for HostLink {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        AsyncWriteExt::write_all(&mut self.port, buf).await
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf).await
    }
}

impl std::fmt::Debug for HostLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLink").finish_non_exhaustive()
    }
}

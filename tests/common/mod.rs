// In-memory serial port for driving the transport without hardware
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use torque_link::communication::frame::REPLY_LEN;
use torque_link::hardware::serial::{SerialInterface, SerialLink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(String, u32),
    Write(Vec<u8>),
    Read(usize),
    Close,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<Event>,
    replies: VecDeque<u8>,
    /// Max bytes handed out per read call.
    chunk: Option<usize>,
    /// Never complete a read once the reply queue is empty.
    stall_when_empty: bool,
    fail_write_after: Option<usize>,
    writes: usize,
    missing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockSerial {
    state: Arc<Mutex<MockState>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port identifier that does not exist.
    pub fn missing() -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().missing = true;
        mock
    }

    pub fn queue_reply(&self, degree_raw: u16, torque_raw: u16) {
        let mut reply = [0u8; REPLY_LEN];
        reply[7..9].copy_from_slice(&degree_raw.to_be_bytes());
        reply[11..13].copy_from_slice(&torque_raw.to_be_bytes());
        self.queue_bytes(&reply);
    }

    pub fn queue_bytes(&self, bytes: &[u8]) {
        self.state.lock().unwrap().replies.extend(bytes.iter().copied());
    }

    pub fn set_chunk(&self, chunk: usize) {
        self.state.lock().unwrap().chunk = Some(chunk);
    }

    pub fn stall_when_empty(&self) {
        self.state.lock().unwrap().stall_when_empty = true;
    }

    pub fn fail_write_after(&self, writes: usize) {
        self.state.lock().unwrap().fail_write_after = Some(writes);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Read(_)))
            .count()
    }

    pub fn opens(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Event::Open(..)))
            .count()
    }
}

pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

impl Drop for MockLink {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.events.push(Event::Close);
        }
    }
}

#[async_trait]
impl SerialInterface for MockSerial {
    type Link = MockLink;

    async fn open(&self, port: &str, baud: u32) -> io::Result<MockLink> {
        let mut state = self.state.lock().unwrap();
        if state.missing {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such port: {}", port),
            ));
        }
        state.events.push(Event::Open(port.to_string(), baud));
        Ok(MockLink {
            state: self.state.clone(),
        })
    }

    fn available_ports(&self) -> Vec<String> {
        vec!["/dev/ttyMOCK0".to_string()]
    }
}

#[async_trait]
impl SerialLink for MockLink {
    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_write_after == Some(state.writes) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        state.writes += 1;
        state.events.push(Event::Write(buf.to_vec()));
        Ok(())
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            if state.replies.is_empty() {
                state.stall_when_empty
            } else {
                let limit = state.chunk.unwrap_or(usize::MAX).min(buf.len());
                let mut n = 0;
                while n < limit {
                    match state.replies.pop_front() {
                        Some(byte) => {
                            buf[n] = byte;
                            n += 1;
                        }
                        None => break,
                    }
                }
                state.events.push(Event::Read(n));
                return Ok(n);
            }
        };
        if stall {
            std::future::pending::<()>().await;
        }
        self.state.lock().unwrap().events.push(Event::Read(0));
        Ok(0)
    }
}

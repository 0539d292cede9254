use std::collections::VecDeque;
use std::sync::Arc;

use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use parking_lot::Mutex;

use crate::crc16::checksum;
use crate::monitor::StopSignal;
use crate::sink::{Level, LogSink};
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyError {
    Broken,
}

impl embedded_io::Error for DummyError {
    fn kind(&self) -> ErrorKind {
        match self {
            DummyError::Broken => ErrorKind::BrokenPipe,
        }
    }
}

/// What a `DummySerial` saw, shared with the test after the transport has been moved.
#[derive(Debug, Default)]
pub struct Probe {
    pub written: Vec<Vec<u8>>,
    pub input_clears: usize,
    pub output_clears: usize,
    pub drops: usize,
}

/// Answers each written frame with the next scripted reply.
pub struct DummySerial {
    replies: VecDeque<Vec<u8>>,
    pending: VecDeque<u8>,
    chunk: usize,
    fail_writes: bool,
    stop_after: Option<(usize, StopSignal)>,
    pub probe: Arc<Mutex<Probe>>,
}

impl DummySerial {
    pub fn new<R: AsRef<[u8]>>(replies: &[R]) -> Self {
        Self {
            replies: replies.iter().map(|r| r.as_ref().to_vec()).collect(),
            pending: VecDeque::new(),
            chunk: usize::MAX,
            fail_writes: false,
            stop_after: None,
            probe: Arc::default(),
        }
    }

    /// Never answers.
    pub fn silent() -> Self {
        Self::new::<&[u8]>(&[])
    }

    /// Hands out at most `chunk` bytes per read call.
    pub fn chunked(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Requests a stop once `writes` frames have been written.
    pub fn stop_after(mut self, writes: usize, stop: StopSignal) -> Self {
        self.stop_after = Some((writes, stop));
        self
    }
}

impl Drop for DummySerial {
    fn drop(&mut self) {
        self.probe.lock().drops += 1;
    }
}

impl ErrorType for DummySerial {
    type Error = DummyError;
}

impl Read for DummySerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.chunk).min(self.pending.len());
        for slot in buf.iter_mut().take(n) {
            // n never exceeds pending.len()
            *slot = self.pending.pop_front().unwrap_or_default();
        }
        Ok(n)
    }
}

impl Write for DummySerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(DummyError::Broken);
        }
        let count = {
            let mut probe = self.probe.lock();
            probe.written.push(buf.to_vec());
            probe.written.len()
        };
        self.pending = self.replies.pop_front().unwrap_or_default().into();

        if let Some((writes, stop)) = &self.stop_after {
            if count >= *writes {
                stop.stop();
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ReadReady for DummySerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pending.is_empty())
    }
}

impl Transport for DummySerial {
    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.pending.clear();
        self.probe.lock().input_clears += 1;
        Ok(())
    }

    fn clear_output(&mut self) -> Result<(), Self::Error> {
        self.probe.lock().output_clears += 1;
        Ok(())
    }
}

/// Builds a valid 7-byte read reply carrying `value`.
pub fn read_reply(function: u8, value: u16) -> Vec<u8> {
    let mut reply = vec![0xFE, function, 0x02];
    reply.extend_from_slice(&value.to_be_bytes());
    let crc = checksum(&reply);
    reply.extend_from_slice(&crc);
    reply
}

#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub message: String,
}

/// Keeps every record in memory; clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn levels(&self) -> Vec<(Level, String)> {
        self.records
            .lock()
            .iter()
            .map(|r| (r.level, r.message.clone()))
            .collect()
    }

    pub fn count(&self, level: Level) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }
}

impl LogSink for MemorySink {
    fn log(&mut self, level: Level, message: &str) {
        self.records.lock().push(Record {
            level,
            message: message.to_string(),
        });
    }
}

//! Test helpers for capturing the logging sink.
//!
//! Shared by unit tests and the integration tests under `tests/`.

use std::io;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// An in-memory sink usable wherever the logger factory expects a writer.
#[derive(Debug, Clone, Default)]
pub struct CapturedSink {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buffer
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl io::Write for CapturedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .buffer
            .lock()
            .map_err(|_| io::Error::other("captured sink poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedSink {
    type Writer = CapturedSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

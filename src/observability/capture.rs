//! In-memory JSON log capture for tests

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::Level;

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Collects every line a subscriber built by [`CapturedLogs::subscriber`] emits
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs {
    writer: CaptureWriter,
}

impl CapturedLogs {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let writer = self.writer.clone();
        tracing_subscriber::fmt()
            .json()
            .with_max_level(Level::TRACE)
            .with_writer(move || writer.clone())
            .finish()
    }

    pub(crate) fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.writer.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    /// `event` field of every captured line, in order
    pub(crate) fn events(&self) -> Vec<String> {
        self.lines()
            .iter()
            .filter_map(|line| line["fields"]["event"].as_str().map(str::to_string))
            .collect()
    }
}

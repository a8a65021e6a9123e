//! Output duplication
//!
//! [`TeeWriter`] copies every write to several sinks. The binary installs
//! one as the `env_logger` target so the run log lands on the console
//! and in the log file at once.

use std::io::{self, Write};

/// Writes everything to each inner writer in order.
pub struct TeeWriter {
    writers: Vec<Box<dyn Write + Send>>,
}

impl TeeWriter {
    pub fn new() -> Self {
        Self { writers: Vec::new() }
    }

    pub fn with(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writers.push(Box::new(writer));
        self
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl Default for TeeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for writer in &mut self.writers {
            writer.write_all(buf)?;
        }
        Ok(buf.len())
    }

    /// Flushes every writer, reporting the first failure.
    fn flush(&mut self) -> io::Result<()> {
        let mut first_error = None;
        for writer in &mut self.writers {
            if let Err(e) = writer.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

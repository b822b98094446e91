//! Terminal output for rendered frames, help and status messages.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::error::{Error, Result};

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Marker printed before status error messages.
pub const ERROR_SYMBOL: &str = "✖";

/// Output sink shared by every command of a program.
#[derive(Clone)]
pub struct Terminal {
    stdout: SharedWriter,
    stderr: SharedWriter,
    color: bool,
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("color", &self.color)
            .finish_non_exhaustive()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::stdio()
    }
}

impl Terminal {
    /// Write to the process stdout and stderr. Colour is enabled when
    /// stderr is a terminal.
    pub fn stdio() -> Self {
        Self {
            stdout: shared(io::stdout()),
            stderr: shared(io::stderr()),
            color: io::stderr().is_terminal(),
        }
    }

    /// Write into in-memory buffers, readable through the returned [`Capture`].
    pub fn capture() -> (Self, Capture) {
        let capture = Capture::default();
        let terminal = Self {
            stdout: shared(BufferWriter(capture.stdout.clone())),
            stderr: shared(BufferWriter(capture.stderr.clone())),
            color: false,
        };
        (terminal, capture)
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn color(&self) -> bool {
        self.color
    }

    /// Write a rendered frame to stdout, newline terminated.
    pub fn write_frame(&self, frame: &str) -> Result<()> {
        if frame.is_empty() {
            return Ok(());
        }
        write_line(&self.stdout, frame)
    }

    /// Write help text, to stderr when it accompanies a failure.
    pub fn write_help(&self, help: &str, to_stderr: bool) -> Result<()> {
        let target = if to_stderr { &self.stderr } else { &self.stdout };
        write_line(target, help)
    }

    /// Write a single-line error status to stderr.
    pub fn status_error(&self, message: &str) -> Result<()> {
        let line = if self.color {
            format!("{} {}", ERROR_SYMBOL.red(), message.red())
        } else {
            format!("{ERROR_SYMBOL} {message}")
        };
        write_line(&self.stderr, &line)
    }

    /// Write already formatted diagnostic text to stderr.
    pub fn write_error_text(&self, text: &str) -> Result<()> {
        write_line(&self.stderr, text)
    }
}

fn shared(writer: impl Write + Send + 'static) -> SharedWriter {
    Arc::new(Mutex::new(Box::new(writer)))
}

fn write_line(target: &SharedWriter, text: &str) -> Result<()> {
    let mut writer = target.lock().unwrap_or_else(PoisonError::into_inner);
    writer.write_all(text.as_bytes()).map_err(Error::Output)?;
    if !text.ends_with('\n') {
        writer.write_all(b"\n").map_err(Error::Output)?;
    }
    writer.flush().map_err(Error::Output)
}

/// Buffers behind a capturing [`Terminal`].
#[derive(Debug, Clone, Default)]
pub struct Capture {
    stdout: Arc<Mutex<Vec<u8>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

impl Capture {
    pub fn stdout(&self) -> String {
        read_buffer(&self.stdout)
    }

    pub fn stderr(&self) -> String {
        read_buffer(&self.stderr)
    }
}

fn read_buffer(buffer: &Mutex<Vec<u8>>) -> String {
    let bytes = buffer.lock().unwrap_or_else(PoisonError::into_inner);
    String::from_utf8_lossy(&bytes).into_owned()
}

struct BufferWriter(Arc<Mutex<Vec<u8>>>);

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

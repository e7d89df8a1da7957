//! Log output for the `sproc` binary.
//!
//! Stdout carries the command's own output (result JSON, procedure names), so log lines go to
//! stderr. With `--log FILE` they are also appended to that file, which keeps a history across
//! scheduled runs.

use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::fmt::writer::MakeWriter;

#[derive(Clone)]
pub(crate) enum LogTarget {
    Stderr,
    Tee(Arc<Mutex<File>>),
}

impl LogTarget {
    pub(crate) fn open(path: Option<&Path>) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::Stderr);
        };
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::Tee(Arc::new(Mutex::new(file))))
    }

    /// Colour codes only when every destination is a terminal.
    pub(crate) fn wants_ansi(&self) -> bool {
        matches!(self, Self::Stderr) && io::stderr().is_terminal()
    }
}

impl<'a> MakeWriter<'a> for LogTarget {
    type Writer = LogSink;

    fn make_writer(&'a self) -> LogSink {
        LogSink {
            file: match self {
                Self::Stderr => None,
                Self::Tee(file) => Some(Arc::clone(file)),
            },
        }
    }
}

/// Writer for one formatted event.
pub(crate) struct LogSink {
    file: Option<Arc<Mutex<File>>>,
}

impl LogSink {
    fn each(&self, mut op: impl FnMut(&mut dyn Write) -> io::Result<()>) -> io::Result<()> {
        op(&mut io::stderr().lock())?;
        match &self.file {
            Some(file) => op(&mut *file.lock().unwrap_or_else(PoisonError::into_inner)),
            None => Ok(()),
        }
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.each(|w| w.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.each(|w| w.flush())
    }
}

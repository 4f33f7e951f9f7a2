//! The node's single bidirectional byte channel
//!
//! Outbound, frames and diagnostic log records share one writer behind one
//! mutex. A frame is written while holding the lock from prefix to suffix,
//! and the log writer takes the same lock per record, so a log line can
//! never land inside a frame.
//!
//! Inbound, a worker thread blocks on the reader and hands complete lines
//! to the super-loop through a single-slot channel; the loop only polls.

use crate::codec::WireFrame;
use crate::config::ChannelConfig;
use crate::error::WireError;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;
use std::fmt;
use std::io::{self, BufRead, BufReader, ErrorKind, Read, Write};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};
use tracing_subscriber::fmt::MakeWriter;

/// Destination for encoded frames
pub trait FrameSink {
    /// Write one whole frame and flush it
    fn send_frame(&self, frame: &WireFrame) -> Result<(), WireError>;
}

type SharedWrite = Box<dyn Write + Send>;

/// Cloneable handle to the outbound half of the channel
#[derive(Clone)]
pub struct ChannelWriter {
    inner: Arc<Mutex<SharedWrite>>,
}

impl ChannelWriter {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write one diagnostic line outside the logging pipeline
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.inner.lock();
        out.write_all(line.as_bytes())?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

impl FrameSink for ChannelWriter {
    fn send_frame(&self, frame: &WireFrame) -> Result<(), WireError> {
        let mut out = self.inner.lock();
        out.write_all(frame.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

impl fmt::Debug for ChannelWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelWriter").finish_non_exhaustive()
    }
}

/// Exclusive access to the channel for the duration of one log record
pub struct ChannelGuard<'a> {
    out: MutexGuard<'a, SharedWrite>,
}

impl Write for ChannelGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl<'a> MakeWriter<'a> for ChannelWriter {
    type Writer = ChannelGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        ChannelGuard {
            out: self.inner.lock(),
        }
    }
}

/// Non-blocking source of inbound text lines
pub trait LineSource {
    /// Next complete line if one is ready; never blocks
    fn poll_line(&mut self) -> Option<String>;
}

impl LineSource for VecDeque<String> {
    fn poll_line(&mut self) -> Option<String> {
        self.pop_front()
    }
}

/// Inbound half of the channel, fed by a reader thread
pub struct LineReceiver {
    lines: Receiver<String>,
    closed: bool,
}

impl LineReceiver {
    /// Start a worker reading newline-terminated lines from `reader`
    pub fn spawn<R: Read + Send + 'static>(reader: R) -> io::Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("earwatch-rx".to_string())
            .spawn(move || read_lines(reader, tx))?;
        Ok(Self {
            lines: rx,
            closed: false,
        })
    }

    /// True once the reader hit end of input and every line was taken
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl LineSource for LineReceiver {
    fn poll_line(&mut self) -> Option<String> {
        match self.lines.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.closed {
                    self.closed = true;
                    info!("Inbound channel closed, no further verdicts will arrive");
                }
                None
            }
        }
    }
}

fn read_lines<R: Read>(reader: R, tx: Sender<String>) {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                if !line.is_empty() {
                    let _ = tx.send(String::from_utf8_lossy(&line).into_owned());
                }
                break;
            }
            Ok(_) => {
                let terminated = line.last() == Some(&b'\n');
                if tx.send(String::from_utf8_lossy(&line).into_owned()).is_err() {
                    break;
                }
                line.clear();
                if !terminated {
                    break;
                }
            }
            // Serial ports report idle periods as timeouts; partial bytes stay in `line`
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                continue
            }
            Err(e) => {
                warn!("Inbound channel read failed: {}", e);
                break;
            }
        }
    }

    debug!("Inbound channel worker stopped");
}

/// Open the channel described by `config`: stdin/stdout, or a serial device
pub fn open_channel(config: &ChannelConfig) -> Result<(ChannelWriter, LineReceiver), WireError> {
    config.validate().map_err(WireError::Config)?;

    match config.serial_port.as_deref() {
        None => Ok((ChannelWriter::stdout(), LineReceiver::spawn(io::stdin())?)),
        Some(path) => open_serial(path, config),
    }
}

#[cfg(feature = "serial-transport")]
fn open_serial(
    path: &str,
    config: &ChannelConfig,
) -> Result<(ChannelWriter, LineReceiver), WireError> {
    use std::time::Duration;

    let port = serialport::new(path, config.baud_rate)
        .timeout(Duration::from_millis(config.read_timeout_ms))
        .open()
        .map_err(|e| WireError::Transport(format!("Failed to open {}: {}", path, e)))?;
    let reader = port
        .try_clone()
        .map_err(|e| WireError::Transport(format!("Failed to clone {}: {}", path, e)))?;

    Ok((ChannelWriter::new(port), LineReceiver::spawn(reader)?))
}

#[cfg(not(feature = "serial-transport"))]
fn open_serial(
    path: &str,
    _config: &ChannelConfig,
) -> Result<(ChannelWriter, LineReceiver), WireError> {
    Err(WireError::Transport(format!(
        "Cannot open {}: built without the serial-transport feature",
        path
    )))
}

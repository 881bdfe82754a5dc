//! GPIO line collaborator
//!
//! The reader and monitor consume an acquired line through the [`ButtonLine`]
//! trait; [`LineProvider`] performs the acquisition. The production backend
//! uses the Linux GPIO character device (/dev/gpiochipX).

use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gpio_cdev::{Chip, EventRequestFlags, EventType, LineEventHandle, LineRequestFlags};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use tracing::debug;

use crate::error::{ConfigError, ReadError};
use crate::types::{Bias, EdgeEvent, EdgeKind, EventTimestamp, Level, LineConfig};

/// Consumer label reported to the kernel for acquired lines
const CONSUMER: &str = "gpio-button";

/// An acquired, configured input line
///
/// All calls are synchronous and fallible. `wait_for_edge` returns `Ok(None)`
/// on timeout so callers can re-check their stop condition on a bounded
/// interval.
pub trait ButtonLine: Send + Sync {
    /// Read the electrical level, no polarity correction
    fn read_level(&self) -> Result<Level, ReadError>;

    /// Block until the next edge event or the timeout elapses
    fn wait_for_edge(&self, timeout: Duration) -> Result<Option<EdgeEvent>, ReadError>;
}

/// Line acquisition backend
pub trait LineProvider: Send + Sync {
    /// Request the configured line as input with the configured bias
    fn acquire(&self, config: &LineConfig) -> Result<Arc<dyn ButtonLine>, ConfigError>;
}

/// Production provider over the GPIO character device
#[derive(Debug, Default)]
pub struct CdevProvider;

impl LineProvider for CdevProvider {
    fn acquire(&self, config: &LineConfig) -> Result<Arc<dyn ButtonLine>, ConfigError> {
        let mut chip = Chip::new(&config.chip_path)
            .map_err(|e| ConfigError::AcquisitionFailed(format!("chip open failed: {}", e)))?;

        let line = chip.get_line(config.line_offset).map_err(|e| {
            ConfigError::AcquisitionFailed(format!("line {} failed: {}", config.line_offset, e))
        })?;

        let flags = LineRequestFlags::INPUT
            | match config.bias {
                Bias::Disabled => LineRequestFlags::BIAS_DISABLE,
                Bias::PullUp => LineRequestFlags::BIAS_PULL_UP,
                Bias::PullDown => LineRequestFlags::BIAS_PULL_DOWN,
            };

        // Request with both edges at the kernel level; direction filtering is
        // the monitor's job.
        let events = line
            .events(flags, EventRequestFlags::BOTH_EDGES, CONSUMER)
            .map_err(|e| ConfigError::AcquisitionFailed(format!("line request failed: {}", e)))?;

        debug!(
            "acquired {} line {} with bias {:?}",
            config.chip_path.display(),
            config.line_offset,
            config.bias
        );

        Ok(Arc::new(CdevLine::new(events)))
    }
}

/// Character-device line handle
struct CdevLine {
    fd: RawFd,
    events: Mutex<LineEventHandle>,
}

impl CdevLine {
    fn new(events: LineEventHandle) -> Self {
        Self {
            fd: events.as_raw_fd(),
            events: Mutex::new(events),
        }
    }
}

impl ButtonLine for CdevLine {
    fn read_level(&self) -> Result<Level, ReadError> {
        let events = self.events.lock().unwrap();
        let value = events
            .get_value()
            .map_err(|e| ReadError::Io(e.to_string()))?;
        Ok(if value == 0 { Level::Low } else { Level::High })
    }

    fn wait_for_edge(&self, timeout: Duration) -> Result<Option<EdgeEvent>, ReadError> {
        // Poll the event fd unlocked so concurrent level reads are not
        // stalled for the whole timeout.
        let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
        let mut fds = [PollFd::new(borrowed, PollFlags::POLLIN)];
        let timeout_ms = timeout.as_millis().min(u16::MAX as u128) as u16;
        let ready = match poll(&mut fds, PollTimeout::from(timeout_ms)) {
            Ok(n) => n,
            // Interrupted waits count as a timeout tick, not a failure
            Err(nix::errno::Errno::EINTR) => return Ok(None),
            Err(e) => return Err(ReadError::Io(e.to_string())),
        };
        if ready == 0 {
            return Ok(None);
        }

        let mut events = self.events.lock().unwrap();
        match events.next() {
            Some(Ok(event)) => {
                let kind = match event.event_type() {
                    EventType::RisingEdge => EdgeKind::Rising,
                    EventType::FallingEdge => EdgeKind::Falling,
                };
                Ok(Some(EdgeEvent {
                    kind,
                    timestamp: EventTimestamp::from_nanos(event.timestamp()),
                }))
            }
            Some(Err(e)) => Err(ReadError::Io(e.to_string())),
            None => Err(ReadError::Io("event stream ended".to_string())),
        }
    }
}

//! Edge Monitor
//!
//! Runs a blocking wait-for-edge loop on a background task and delivers
//! debounced, direction-filtered events to a user callback.
//!
//! Callbacks run synchronously on the monitor task: a slow callback delays
//! subsequent edge processing and can lose closely-spaced real edges, so
//! callbacks are expected to return quickly. A callback must not call
//! `stop` on the same monitor synchronously, that would deadlock against
//! the join.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, trace};

use crate::debounce::DebounceFilter;
use crate::error::{MonitorError, ReadError};
use crate::line::ButtonLine;
use crate::types::{EdgeEvent, EdgeSelect};

/// Edge callback object
///
/// Invoked with the edge direction and the kernel timestamp of each accepted
/// transition.
pub type EdgeCallback = Arc<dyn Fn(EdgeEvent) + Send + Sync + 'static>;

/// How often the monitor task wakes from the kernel wait to check its stop
/// flag; bounds the worst-case `stop` latency.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Monitor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No monitor task active
    Idle,
    /// Monitor task delivering events
    Running,
}

/// Background edge monitor for one acquired line
///
/// At most one monitor task is active at a time; start/stop transitions are
/// serialized. A wait failure terminates the task and is retrievable through
/// `last_error`; restarting is the caller's decision.
pub struct EdgeMonitor {
    stop_flag: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
    last_error: Arc<parking_lot::RwLock<Option<ReadError>>>,
}

impl EdgeMonitor {
    /// Create an idle monitor
    pub fn new() -> Self {
        Self {
            stop_flag: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
            last_error: Arc::new(parking_lot::RwLock::new(None)),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> MonitorState {
        if self.is_running() {
            MonitorState::Running
        } else {
            MonitorState::Idle
        }
    }

    /// Whether the monitor task is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The failure that terminated the last monitor task, if any
    pub fn last_error(&self) -> Option<ReadError> {
        self.last_error.read().clone()
    }

    /// Clear the recorded failure
    pub fn clear_error(&self) {
        *self.last_error.write() = None;
    }

    /// Start monitoring the given acquired line
    ///
    /// `line` is `None` when the reader holds no acquired line; `callback`
    /// is `None` when no handler was registered. Both are setup misuse and
    /// leave the monitor idle.
    pub async fn start(
        &self,
        line: Option<Arc<dyn ButtonLine>>,
        selector: EdgeSelect,
        debounce_window: Duration,
        callback: Option<EdgeCallback>,
    ) -> Result<(), MonitorError> {
        let line = line.ok_or(MonitorError::NotConfigured)?;
        let callback = callback.ok_or(MonitorError::NoCallback)?;

        let mut task = self.task.lock().await;
        if self.running.load(Ordering::SeqCst) {
            return Err(MonitorError::AlreadyRunning);
        }
        // Reap a task that exited on its own (wait failure); its error stays
        // retrievable until the next successful start.
        if let Some(stale) = task.take() {
            let _ = stale.await;
        }

        self.stop_flag.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
        *self.last_error.write() = None;

        let stop_flag = self.stop_flag.clone();
        let running = self.running.clone();
        let last_error = self.last_error.clone();

        let handle = tokio::task::spawn_blocking(move || {
            monitor_loop(
                line,
                selector,
                debounce_window,
                callback,
                stop_flag,
                running,
                last_error,
            );
        });
        *task = Some(handle);

        info!(
            "edge monitor started ({:?}, debounce {:?})",
            selector, debounce_window
        );
        Ok(())
    }

    /// Signal the monitor task to exit and join it
    ///
    /// Blocks the caller until the task has observed the stop flag at its
    /// next poll wake-up. A no-op when no monitor is running.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        self.stop_flag.store(true, Ordering::SeqCst);

        if let Some(handle) = task.take() {
            let _ = handle.await;
            debug!("edge monitor stopped");
        }
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for EdgeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Main monitor loop (runs in a blocking task)
fn monitor_loop(
    line: Arc<dyn ButtonLine>,
    selector: EdgeSelect,
    debounce_window: Duration,
    callback: EdgeCallback,
    stop_flag: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    last_error: Arc<parking_lot::RwLock<Option<ReadError>>>,
) {
    let mut debounce = DebounceFilter::new(debounce_window);

    while !stop_flag.load(Ordering::Relaxed) {
        match line.wait_for_edge(POLL_INTERVAL) {
            // Timeout tick: loop around and re-check the stop flag
            Ok(None) => continue,
            Ok(Some(event)) => {
                if debounce.is_bounce(event.timestamp) {
                    trace!("edge at {:?} debounced", event.timestamp);
                    continue;
                }
                if !selector.matches(event.kind) {
                    continue;
                }
                callback(event);
                debounce.mark_accepted(event.timestamp);
            }
            Err(e) => {
                error!("edge wait failed, monitor exiting: {}", e);
                *last_error.write() = Some(e);
                break;
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    debug!("edge monitor loop exited");
}

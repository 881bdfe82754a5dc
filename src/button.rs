//! Button facade
//!
//! Ties one line reader and one edge monitor together behind the lifecycle
//! surface user code works with: `begin`, reads, interrupt start/stop and
//! `clean`. The reader and monitor state are exclusively owned here and
//! never shared across buttons.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::info;

use crate::error::{ConfigError, MonitorError, ReadError};
use crate::hold::HoldAction;
use crate::line::{CdevProvider, LineProvider};
use crate::monitor::{EdgeCallback, EdgeMonitor, MonitorState};
use crate::reader::LineReader;
use crate::types::{EdgeEvent, EdgeSelect, Level, LineConfig};

/// A single push-button on a GPIO input line
pub struct Button {
    reader: Arc<LineReader>,
    monitor: EdgeMonitor,
    handler: Mutex<Option<EdgeCallback>>,
    provider: Box<dyn LineProvider>,
}

impl Button {
    /// Create a button over the GPIO character device
    pub fn new(config: LineConfig) -> Self {
        Self::with_provider(config, Box::new(CdevProvider))
    }

    /// Create a button over a custom line backend
    pub fn with_provider(config: LineConfig, provider: Box<dyn LineProvider>) -> Self {
        Self {
            reader: Arc::new(LineReader::new(config)),
            monitor: EdgeMonitor::new(),
            handler: Mutex::new(None),
            provider,
        }
    }

    /// The line configuration
    pub fn config(&self) -> &LineConfig {
        self.reader.config()
    }

    /// Apply the configuration to hardware and acquire the line
    pub fn begin(&self) -> Result<(), ConfigError> {
        self.reader.configure_with(self.provider.as_ref())
    }

    /// Whether the line is acquired
    pub fn is_configured(&self) -> bool {
        self.reader.is_configured()
    }

    /// Electrical level of the line, no polarity correction
    pub fn value(&self) -> Result<Level, ReadError> {
        self.reader.raw_level()
    }

    /// Logical pressed state
    pub fn is_pressed(&self) -> Result<bool, ReadError> {
        self.reader.is_pressed()
    }

    /// Register the edge handler invoked by the monitor task
    ///
    /// The handler must return quickly and must not call `stop_interrupt`
    /// or `clean` on this button synchronously.
    pub fn on_edge(&self, handler: impl Fn(EdgeEvent) + Send + Sync + 'static) {
        *self.handler.lock().unwrap() = Some(Arc::new(handler));
    }

    /// Start edge monitoring with the registered handler
    ///
    /// Fails with [`MonitorError::NoCallback`] when no handler was
    /// registered, with the monitor left idle.
    pub async fn begin_interrupt(
        &self,
        selector: EdgeSelect,
        debounce_window: Duration,
    ) -> Result<(), MonitorError> {
        let callback = self.handler.lock().unwrap().clone();
        self.monitor
            .start(
                self.reader.acquired_line(),
                selector,
                debounce_window,
                callback,
            )
            .await
    }

    /// Stop edge monitoring; a no-op when none is running
    pub async fn stop_interrupt(&self) {
        self.monitor.stop().await;
    }

    /// Monitor lifecycle state
    pub fn monitor_state(&self) -> MonitorState {
        self.monitor.state()
    }

    /// The failure that terminated the monitor task, if any
    pub fn last_monitor_error(&self) -> Option<ReadError> {
        self.monitor.last_error()
    }

    /// Stop monitoring and release the line
    ///
    /// Idempotent: safe to call repeatedly and on a never-configured button.
    pub async fn clean(&self) {
        self.monitor.stop().await;
        self.reader.release();
        info!("button cleaned up");
    }

    /// Build a hold-action machine sampling this button's pressed state
    pub fn hold_action(&self) -> HoldAction<impl FnMut() -> Result<bool, ReadError>> {
        let reader = Arc::clone(&self.reader);
        HoldAction::new(move || reader.is_pressed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReadError;
    use crate::hold::Action;
    use crate::line::fake::{FakeLine, FakeProvider};
    use crate::types::{EdgeKind, Polarity};

    const WINDOW: Duration = Duration::from_millis(10);

    fn fake_button(level: Level, config: LineConfig) -> (Button, Arc<FakeLine>) {
        let line = FakeLine::new(level);
        let provider = FakeProvider::new(line.clone());
        (Button::with_provider(config, Box::new(provider)), line)
    }

    #[tokio::test]
    async fn test_lifecycle_and_reads() {
        let (button, line) = fake_button(
            Level::Low,
            LineConfig::default().with_polarity(Polarity::ActiveLow),
        );

        assert_eq!(button.value(), Err(ReadError::NotConfigured));
        tokio_test::assert_ok!(button.begin());
        assert!(button.is_configured());
        assert_eq!(button.value(), Ok(Level::Low));
        assert_eq!(button.is_pressed(), Ok(true));

        line.set_level(Level::High);
        assert_eq!(button.is_pressed(), Ok(false));

        button.clean().await;
        assert!(!button.is_configured());
    }

    #[tokio::test]
    async fn test_begin_interrupt_without_handler_fails() {
        let (button, _line) = fake_button(Level::Low, LineConfig::default());
        button.begin().unwrap();

        let err = button
            .begin_interrupt(EdgeSelect::Both, WINDOW)
            .await
            .unwrap_err();
        assert_eq!(err, MonitorError::NoCallback);
        assert_eq!(button.monitor_state(), MonitorState::Idle);
    }

    #[tokio::test]
    async fn test_begin_interrupt_before_begin_fails() {
        let (button, _line) = fake_button(Level::Low, LineConfig::default());
        button.on_edge(|_| {});

        let err = button
            .begin_interrupt(EdgeSelect::Both, WINDOW)
            .await
            .unwrap_err();
        assert_eq!(err, MonitorError::NotConfigured);
    }

    #[tokio::test]
    async fn test_interrupt_delivery_through_facade() {
        let (button, line) = fake_button(Level::Low, LineConfig::default());
        button.begin().unwrap();

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        button.on_edge(move |event| sink.lock().unwrap().push(event));

        line.push_edge(EdgeKind::Rising, 0);
        button
            .begin_interrupt(EdgeSelect::Both, WINDOW)
            .await
            .unwrap();
        assert_eq!(button.monitor_state(), MonitorState::Running);

        for _ in 0..200 {
            if !received.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(received.lock().unwrap().len(), 1);

        button.stop_interrupt().await;
        assert_eq!(button.monitor_state(), MonitorState::Idle);
    }

    #[tokio::test]
    async fn test_clean_twice_is_a_noop() {
        let (button, _line) = fake_button(Level::Low, LineConfig::default());
        button.begin().unwrap();
        button.on_edge(|_| {});
        button
            .begin_interrupt(EdgeSelect::Both, WINDOW)
            .await
            .unwrap();

        button.clean().await;
        assert!(!button.is_configured());
        assert_eq!(button.monitor_state(), MonitorState::Idle);

        // Second clean: nothing to stop, nothing to release, no failure.
        button.clean().await;
        assert!(!button.is_configured());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hold_action_samples_the_reader() {
        let (button, line) = fake_button(Level::High, LineConfig::default());
        button.begin().unwrap();

        // Held at the initial sample and still held after the countdown.
        let mut hold = button.hold_action();
        assert_eq!(hold.check().await, Ok(Some(Action::Shutdown)));

        // A fresh machine with the line released mid-countdown decides
        // reboot. Run the check on its own task so the level can change
        // after the initial sample.
        line.set_level(Level::High);
        let mut hold = button.hold_action();
        let check = tokio::spawn(async move { hold.check().await });
        tokio::task::yield_now().await;
        line.set_level(Level::Low);
        assert_eq!(check.await.unwrap(), Ok(Some(Action::Reboot)));
    }
}

//! Line Reader
//!
//! Owns one acquired GPIO input line and provides raw and
//! polarity-corrected reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::{ConfigError, ReadError};
use crate::line::{ButtonLine, CdevProvider, LineProvider};
use crate::types::{Level, LineConfig};

/// Reader for a single button input line
///
/// The acquired line is exclusively owned here; `release` is idempotent and
/// safe to call on a never-configured reader.
pub struct LineReader {
    config: LineConfig,
    line: Mutex<Option<Arc<dyn ButtonLine>>>,
    configured: AtomicBool,
}

impl LineReader {
    /// Create a reader for the given configuration; no hardware is touched
    /// until `configure`
    pub fn new(config: LineConfig) -> Self {
        Self {
            config,
            line: Mutex::new(None),
            configured: AtomicBool::new(false),
        }
    }

    /// The configuration this reader applies
    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Whether a line is currently acquired
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Relaxed)
    }

    /// Acquire the line through the character device backend
    pub fn configure(&self) -> Result<(), ConfigError> {
        self.configure_with(&CdevProvider)
    }

    /// Acquire the line through the given provider
    ///
    /// The offset is validated before the provider is consulted, so an
    /// out-of-range offset never reaches hardware.
    pub fn configure_with(&self, provider: &dyn LineProvider) -> Result<(), ConfigError> {
        self.config.validate()?;

        let mut slot = self.line.lock().unwrap();
        if slot.is_some() {
            return Err(ConfigError::AlreadyConfigured);
        }

        let line = provider.acquire(&self.config)?;
        *slot = Some(line);
        self.configured.store(true, Ordering::Relaxed);

        info!(
            "button line configured on {} offset {}",
            self.config.chip_path.display(),
            self.config.line_offset
        );
        Ok(())
    }

    /// Electrical level of the line, no polarity correction
    pub fn raw_level(&self) -> Result<Level, ReadError> {
        let slot = self.line.lock().unwrap();
        match slot.as_ref() {
            Some(line) => line.read_level(),
            None => Err(ReadError::NotConfigured),
        }
    }

    /// Logical pressed state: the raw level mapped through the configured
    /// polarity
    pub fn is_pressed(&self) -> Result<bool, ReadError> {
        Ok(self.config.polarity.is_active(self.raw_level()?))
    }

    /// The acquired line, shared with the monitor task
    pub(crate) fn acquired_line(&self) -> Option<Arc<dyn ButtonLine>> {
        self.line.lock().unwrap().clone()
    }

    /// Release the line; a no-op when never configured or already released
    pub fn release(&self) {
        let mut slot = self.line.lock().unwrap();
        if slot.take().is_some() {
            debug!(
                "button line released on {} offset {}",
                self.config.chip_path.display(),
                self.config.line_offset
            );
        }
        self.configured.store(false, Ordering::Relaxed);
    }
}

impl Drop for LineReader {
    fn drop(&mut self) {
        *self.line.lock().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::fake::{FakeLine, FakeProvider};
    use crate::types::{Bias, Polarity};

    fn reader(config: LineConfig) -> (LineReader, FakeProvider) {
        let line = FakeLine::new(Level::Low);
        (LineReader::new(config), FakeProvider::new(line))
    }

    #[test]
    fn test_reads_fail_before_configure() {
        let (reader, _provider) = reader(LineConfig::default());
        assert_eq!(reader.raw_level(), Err(ReadError::NotConfigured));
        assert_eq!(reader.is_pressed(), Err(ReadError::NotConfigured));
        assert!(!reader.is_configured());
    }

    #[test]
    fn test_invalid_offset_rejected_before_acquisition() {
        let (reader, provider) = reader(LineConfig::for_line("/dev/gpiochip0", 31));
        let err = reader.configure_with(&provider).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOffset { offset: 31, .. }));
        assert_eq!(provider.acquire_count(), 0);
        assert!(!reader.is_configured());
    }

    #[test]
    fn test_acquisition_failure_surfaces() {
        let line = FakeLine::new(Level::Low);
        let provider =
            FakeProvider::failing(line, ConfigError::AcquisitionFailed("busy".to_string()));
        let reader = LineReader::new(LineConfig::default());
        assert_eq!(
            reader.configure_with(&provider),
            Err(ConfigError::AcquisitionFailed("busy".to_string()))
        );
        assert!(!reader.is_configured());
    }

    #[test]
    fn test_configure_is_exclusive() {
        let (reader, provider) = reader(LineConfig::default());
        reader.configure_with(&provider).unwrap();
        assert_eq!(
            reader.configure_with(&provider),
            Err(ConfigError::AlreadyConfigured)
        );
        assert_eq!(provider.acquire_count(), 1);
    }

    #[test]
    fn test_logical_state_follows_polarity() {
        let line = FakeLine::new(Level::High);
        let provider = FakeProvider::new(line.clone());
        let reader = LineReader::new(LineConfig::default().with_polarity(Polarity::ActiveLow));
        reader.configure_with(&provider).unwrap();

        assert_eq!(reader.raw_level(), Ok(Level::High));
        assert_eq!(reader.is_pressed(), Ok(false));

        line.set_level(Level::Low);
        assert_eq!(reader.raw_level(), Ok(Level::Low));
        assert_eq!(reader.is_pressed(), Ok(true));
    }

    #[test]
    fn test_release_is_idempotent() {
        let (reader, provider) = reader(LineConfig::default().with_bias(Bias::PullUp));
        reader.release(); // never configured

        reader.configure_with(&provider).unwrap();
        assert!(reader.is_configured());

        reader.release();
        assert!(!reader.is_configured());
        reader.release(); // second release is a no-op
        assert_eq!(reader.raw_level(), Err(ReadError::NotConfigured));

        // The line can be acquired again after release
        reader.configure_with(&provider).unwrap();
        assert!(reader.is_configured());
    }
}

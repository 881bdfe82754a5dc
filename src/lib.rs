//! gpio-button - Debounced push-button input for Linux SBCs
//!
//! Turns a raw GPIO line on a Linux single-board computer into a
//! polarity-corrected logical "pressed" state and a stream of debounced edge
//! events delivered from a background monitoring task.
//!
//! # Features
//!
//! - Line acquisition with configurable bias (none, pull-up, pull-down)
//! - Polarity-aware logical reads, independent of bias
//! - Background edge monitor with kernel timestamps, trailing-edge debounce
//!   and a capturing callback object
//! - Hold-to-decide state machine for reboot/shutdown buttons
//!
//! # Hardware Support
//!
//! Uses the Linux GPIO character device (/dev/gpiochipX); one button owns
//! one line.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use gpio_button::{Bias, Button, EdgeSelect, LineConfig, Polarity};
//!
//! let config = LineConfig::for_line("/dev/gpiochip0", 17)
//!     .with_bias(Bias::PullUp)
//!     .with_polarity(Polarity::ActiveLow);
//!
//! let button = Button::new(config);
//! button.begin()?;
//! button.on_edge(|event| println!("{:?} at {:?}", event.kind, event.timestamp));
//! button.begin_interrupt(EdgeSelect::Both, Duration::from_millis(5)).await?;
//! // ...
//! button.clean().await;
//! ```

pub mod button;
pub mod debounce;
pub mod error;
pub mod hold;
pub mod line;
pub mod monitor;
pub mod reader;
pub mod types;

pub use button::Button;
pub use error::{ConfigError, MonitorError, ReadError};
pub use hold::{Action, HoldAction, HoldState};
pub use line::{ButtonLine, CdevProvider, LineProvider};
pub use monitor::{EdgeCallback, EdgeMonitor, MonitorState};
pub use reader::LineReader;
pub use types::{
    Bias, EdgeEvent, EdgeKind, EdgeSelect, EventTimestamp, Level, LineConfig, Polarity,
    DEFAULT_DEBOUNCE, DEFAULT_OFFSET_LIMIT,
};

//! Button data types and structures
//!
//! Defines the line configuration and the edge-event types shared by the
//! reader and the monitor. Polarity and bias are independent fields; the
//! legacy pull-up-implies-active-low rule is available only as an explicit
//! constructor-time helper.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Highest line offset accepted by default (the legacy platform bound).
pub const DEFAULT_OFFSET_LIMIT: u32 = 30;

/// Electrical level of a digital input line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Line reads low
    Low,
    /// Line reads high
    High,
}

/// Bias applied to an input line when floating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Bias {
    /// No pull resistor
    #[default]
    Disabled,
    /// Pull-up resistor
    PullUp,
    /// Pull-down resistor
    PullDown,
}

impl Bias {
    /// Map a legacy PUD integer (0=off, 1=down, 2=up) to a bias.
    ///
    /// Unknown values fall back to `Disabled`, as the legacy mapping did.
    pub fn from_legacy_pud(pud: u8) -> Self {
        match pud {
            1 => Self::PullDown,
            2 => Self::PullUp,
            _ => Self::Disabled,
        }
    }
}

/// Mapping from electrical level to logical "pressed"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Polarity {
    /// High level means pressed
    #[default]
    ActiveHigh,
    /// Low level means pressed
    ActiveLow,
}

impl Polarity {
    /// Legacy derivation: a pull-up wired button is active-low, anything
    /// else is active-high. Callers that want the old behavior apply this
    /// when building the config; the reader never derives polarity itself.
    pub fn implied_by(bias: Bias) -> Self {
        match bias {
            Bias::PullUp => Self::ActiveLow,
            Bias::PullDown | Bias::Disabled => Self::ActiveHigh,
        }
    }

    /// Whether the given electrical level counts as logically active.
    ///
    /// Pure mapping, no I/O.
    pub fn is_active(self, level: Level) -> bool {
        match self {
            Self::ActiveHigh => level == Level::High,
            Self::ActiveLow => level == Level::Low,
        }
    }
}

/// Direction of a line transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

/// Which edge directions a monitor delivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum EdgeSelect {
    /// Rising edges only
    Rising,
    /// Falling edges only
    Falling,
    /// Both directions
    #[default]
    Both,
}

impl EdgeSelect {
    /// Whether this selector includes the given edge direction
    pub fn matches(self, kind: EdgeKind) -> bool {
        match self {
            Self::Rising => kind == EdgeKind::Rising,
            Self::Falling => kind == EdgeKind::Falling,
            Self::Both => true,
        }
    }
}

/// Kernel-supplied event timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTimestamp {
    /// Whole seconds
    pub secs: u64,
    /// Nanoseconds within the second
    pub nanos: u32,
}

impl EventTimestamp {
    /// Build from a raw nanosecond count (the character-device event format)
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            secs: nanos / 1_000_000_000,
            nanos: (nanos % 1_000_000_000) as u32,
        }
    }

    /// Total nanoseconds
    pub fn as_nanos(&self) -> u64 {
        self.secs * 1_000_000_000 + u64::from(self.nanos)
    }
}

/// A single debounced-eligible transition reported by the kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Transition direction
    pub kind: EdgeKind,
    /// When the kernel observed the transition
    pub timestamp: EventTimestamp,
}

impl EdgeEvent {
    /// Whether this is a rising edge
    pub fn is_rising(&self) -> bool {
        self.kind == EdgeKind::Rising
    }
}

/// Configuration for a single button input line
///
/// Immutable once applied to hardware. `polarity` and `bias` are independent;
/// use [`Polarity::implied_by`] at construction time for the legacy coupling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LineConfig {
    /// GPIO chip device path (/dev/gpiochipX)
    pub chip_path: PathBuf,
    /// Line offset on the chip
    pub line_offset: u32,
    /// Logical polarity of the button
    pub polarity: Polarity,
    /// Input bias
    pub bias: Bias,
    /// Highest accepted line offset for this platform
    pub offset_limit: u32,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            chip_path: PathBuf::from("/dev/gpiochip0"),
            line_offset: 0,
            polarity: Polarity::ActiveHigh,
            bias: Bias::Disabled,
            offset_limit: DEFAULT_OFFSET_LIMIT,
        }
    }
}

impl LineConfig {
    /// Create a config for a specific chip and line
    pub fn for_line(chip_path: impl AsRef<Path>, line_offset: u32) -> Self {
        Self {
            chip_path: chip_path.as_ref().to_path_buf(),
            line_offset,
            ..Default::default()
        }
    }

    /// Set the input bias
    pub fn with_bias(mut self, bias: Bias) -> Self {
        self.bias = bias;
        self
    }

    /// Set the logical polarity
    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Set bias from a legacy PUD integer and derive polarity the legacy way
    pub fn with_legacy_pud(mut self, pud: u8) -> Self {
        self.bias = Bias::from_legacy_pud(pud);
        self.polarity = Polarity::implied_by(self.bias);
        self
    }

    /// Override the platform offset bound
    pub fn with_offset_limit(mut self, limit: u32) -> Self {
        self.offset_limit = limit;
        self
    }

    /// Validate the configuration without touching hardware
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_offset > self.offset_limit {
            return Err(ConfigError::InvalidOffset {
                offset: self.line_offset,
                limit: self.offset_limit,
            });
        }
        Ok(())
    }
}

/// Default window for mechanical switch bounce filtering
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(5);

//! Driver configuration.
//!
//! Uses `heapless::String` for the thread name so the config stays
//! allocation-free.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::config::DisplayConfig;
//! use led_marquee::protocol::PanelGrid;
//!
//! // Use defaults: one row of four panels, 20 ms ticks
//! let config = DisplayConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = DisplayConfig::default()
//!     .with_grid(PanelGrid::new(4, 4))
//!     .with_delay_ms(50)
//!     .with_intensity(8)
//!     .with_thread_name("marquee");
//! ```

use std::time::Duration;

use heapless::String as HString;

use crate::error::DisplayError;
use crate::protocol::{PanelGrid, MAX_INTENSITY};

/// Maximum length for short config strings (thread names)
pub const MAX_SHORT_STRING: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Default tick period in milliseconds.
pub const DEFAULT_DELAY_MS: u32 = 20;

/// Default intensity register value.
pub const DEFAULT_INTENSITY: u8 = 1;

/// Default number of ticks between full reconfigurations.
pub const DEFAULT_REFRESH_INTERVAL: u32 = 256;

// ============================================================================
// Helper for creating heapless strings
// ============================================================================

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Cut at the last char boundary that still fits
    let valid_end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|end| *end <= MAX_SHORT_STRING)
        .last()
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Display Config
// ============================================================================

/// Complete driver configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    /// Panel layout, fixed for the driver's lifetime
    pub grid: PanelGrid,
    /// Tick period in milliseconds
    pub delay_ms: u32,
    /// Initial intensity (0-15)
    pub intensity: u8,
    /// Ticks between full reconfigurations of the chain
    pub refresh_interval: u32,
    /// Name of the render thread
    pub thread_name: ShortString,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            grid: PanelGrid::default(),
            delay_ms: DEFAULT_DELAY_MS,
            intensity: DEFAULT_INTENSITY,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            thread_name: short_string("led-matrix"),
        }
    }
}

impl DisplayConfig {
    /// Set the panel grid
    pub fn with_grid(mut self, grid: PanelGrid) -> Self {
        self.grid = grid;
        self
    }

    /// Set the tick period
    pub fn with_delay_ms(mut self, ms: u32) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Set the initial intensity
    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }

    /// Set the reconfiguration interval in ticks
    pub fn with_refresh_interval(mut self, ticks: u32) -> Self {
        self.refresh_interval = ticks;
        self
    }

    /// Set the render thread name
    pub fn with_thread_name(mut self, name: &str) -> Self {
        self.thread_name = short_string(name);
        self
    }

    /// Tick period as a [`Duration`]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.delay_ms))
    }

    /// Checks every field; the driver refuses to start on error.
    pub fn validate(&self) -> Result<(), DisplayError> {
        self.grid.validate()?;
        if self.delay_ms == 0 {
            return Err(DisplayError::InvalidDelay);
        }
        if self.intensity > MAX_INTENSITY {
            return Err(DisplayError::InvalidIntensity(self.intensity));
        }
        if self.refresh_interval == 0 {
            return Err(DisplayError::InvalidRefreshInterval);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

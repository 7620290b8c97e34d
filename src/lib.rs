//! # led-marquee
//!
//! A threaded driver for cascaded MAX7219 LED-matrix panels, rendering
//! scrolling text rows or simple mouth animations.
//!
//! ## Features
//!
//! - **Panel addressing**: Byte-exact MAX7219 framing for any grid of up to 32 chained chips
//! - **Diffed repaints**: Only scan lines that changed since the last tick go on the bus
//! - **Text rows**: Per-row scrolling with time-to-live, slowdown and welcome-text fallback
//! - **Animations**: Resting, smile, cylon and speaking mouths as an alternative content provider
//! - **Self-healing**: Periodic reconfiguration reasserts the device state after bus glitches
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Bus transport and content provider abstractions
//! - `protocol` - Register map, chain order and frame encoding
//! - `framebuffer` - Canvas and the current/transmitted double buffer
//! - `layer` / `animation` - Content providers
//! - `scheduler` - Background render loop
//! - `driver` - The [`DisplayDriver`] facade tying everything together
//! - `hal` - Transports (mock and chain simulator for testing, SPI for hardware)
//!
//! ## Example
//!
//! ```rust
//! use led_marquee::{DisplayConfig, DisplayDriver, PanelGrid, Ttl};
//! use led_marquee::hal::SimulatedChain;
//!
//! let chain = SimulatedChain::new(PanelGrid::strip(4));
//! let driver = DisplayDriver::new(chain.clone(), DisplayConfig::default()).unwrap();
//!
//! driver.set_text(0, "HI").unwrap();
//! driver.repaint().unwrap();
//! assert!(chain.render().contains('#'));
//!
//! // Temporary message, back to "HI" after 3 ticks
//! driver.set_text_with_ttl(0, "BYE", Ttl::Ticks(3)).unwrap();
//! for _ in 0..3 {
//!     driver.repaint().unwrap();
//! }
//! assert_eq!(driver.text(0).unwrap(), "HI");
//! ```

#![warn(missing_docs)]

/// Animation content provider (mouth modes).
pub mod animation;
/// Shell-style command surface.
pub mod commands;
/// Driver configuration.
pub mod config;
/// Public display facade.
pub mod driver;
/// Error type.
pub mod error;
/// Canvas and diffing double buffer.
pub mod framebuffer;
/// Fixed 8x8 glyph table.
pub mod glyphs;
/// Bus transports: mock, simulator and SPI.
pub mod hal;
/// Scrolling text engine.
pub mod layer;
/// MAX7219 register map and panel addressing.
pub mod protocol;
/// Background render loop.
pub mod scheduler;
/// Transport and content provider traits.
pub mod traits;

mod sync;

/// JSON request types (serde-based).
#[cfg(feature = "serde")]
pub mod messages;

// Re-exports for convenience
pub use animation::{Animation, MouthMode};
pub use commands::{CommandOutcome, DisplayCommand, ParseError};
pub use config::DisplayConfig;
pub use driver::{DisplayDriver, DisplayStatus, RowStatus, Shift};
pub use error::DisplayError;
pub use framebuffer::{Canvas, FlushReport, FrameBuffer};
pub use layer::{TextLayer, TextLayers, Ttl};
pub use protocol::{PanelGrid, Register};
pub use scheduler::SchedulerState;
pub use traits::{BusError, BusTransport, ContentProvider};

// Message re-exports
#[cfg(feature = "serde")]
pub use messages::{SetDelayRequest, SetIntensityRequest, SetSlowdownRequest, SetTextRequest};

// Parsing function re-exports (serde-json-core based)
#[cfg(feature = "serde-json-core")]
pub use messages::{parse_command, status_to_json};

//! Bus transport implementations.
//!
//! This module contains concrete implementations of
//! [`crate::traits::BusTransport`].
//!
//! # Available Implementations
//!
//! - `mock`: Recording transport with failure injection for tests
//! - `sim`: MAX7219 chain emulator for desktop development
//! - `spi`: `embedded-hal` SPI device adapter (requires `spi` feature)

pub mod mock;
pub mod sim;

#[cfg(feature = "spi")]
pub mod spi;

pub use mock::*;
pub use sim::*;

#[cfg(feature = "spi")]
pub use spi::*;

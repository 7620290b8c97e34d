//! Trait definitions for the bus transport and row content strategies.
//!
//! This module defines the two seams that let led-marquee:
//! - Run against different transports (SPI device, simulator, mock)
//! - Paint different kinds of content with the same scheduler
//!
//! # Submodules
//!
//! - `bus`: [`BusTransport`] capability and [`BusError`]
//! - `content`: [`ContentProvider`] strategy for per-tick rasterization

pub mod bus;
pub mod content;

pub use bus::*;
pub use content::*;

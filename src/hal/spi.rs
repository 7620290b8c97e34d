//! `embedded-hal` SPI adapter.
//!
//! The chain latches on the rising edge of chip-select, so every frame must
//! go out as one [`SpiDevice::write`] (one CS assertion).

use embedded_hal::spi::{Error as _, SpiDevice};

use crate::traits::{BusError, BusTransport};

/// Transport over an `embedded-hal` 1.0 SPI device.
#[derive(Debug)]
pub struct SpiBus<D> {
    device: D,
}

impl<D: SpiDevice> SpiBus<D> {
    /// Wraps a configured SPI device (mode 0, up to 10 MHz).
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Returns the wrapped device.
    pub fn into_inner(self) -> D {
        self.device
    }
}

impl<D: SpiDevice + Send> BusTransport for SpiBus<D> {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        self.device
            .write(bytes)
            .map_err(|e| BusError::Device(format!("{:?}", e.kind())))
    }
}

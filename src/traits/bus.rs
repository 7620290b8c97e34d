//! Bus transport abstraction for the MAX7219 chain.
//!
//! The driver never opens the physical link itself. Whatever the host
//! platform provides (Linux spidev, an embedded-hal SPI device, a simulator)
//! only has to offer one capability: send N bytes as a single atomic
//! transfer, with chip-select held for the whole sequence so that the
//! cascaded chips latch their register/value pairs together.
//!
//! # Implementations
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`MockBus`](crate::hal::MockBus) | Records every transfer, injects failures |
//! | [`SimulatedChain`](crate::hal::SimulatedChain) | Emulates the chip registers of a chain |
//! | `SpiBus` | Any `embedded_hal::spi::SpiDevice` (requires `spi` feature) |

/// Error reported by a [`BusTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BusError {
    /// The underlying device returned an I/O error.
    Io(std::io::ErrorKind),
    /// Fewer bytes than requested were clocked out.
    ShortWrite {
        /// Bytes requested.
        expected: usize,
        /// Bytes actually written.
        written: usize,
    },
    /// Device-specific failure (e.g. an SPI error kind).
    Device(String),
}

impl std::fmt::Display for BusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(kind) => write!(f, "bus I/O error: {}", kind),
            Self::ShortWrite { expected, written } => {
                write!(f, "short bus write: {} of {} bytes", written, expected)
            }
            Self::Device(e) => write!(f, "bus device error: {}", e),
        }
    }
}

impl std::error::Error for BusError {}

impl From<std::io::Error> for BusError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.kind())
    }
}

/// Capability to push one byte sequence through the chip chain.
///
/// Every call must be a single transfer: the chain only latches on the
/// rising edge of chip-select, so splitting a frame would shift half of it
/// into the wrong chips.
///
/// # Example Implementation
///
/// ```rust
/// use led_marquee::traits::{BusError, BusTransport};
///
/// struct Loopback(Vec<u8>);
///
/// impl BusTransport for Loopback {
///     fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError> {
///         self.0.clear();
///         self.0.extend_from_slice(bytes);
///         Ok(())
///     }
/// }
/// ```
pub trait BusTransport: Send {
    /// Transmit `bytes` as one atomic transfer.
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError>;
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        (**self).transmit(bytes)
    }
}

//! Mock transport for testing without hardware.
//!
//! [`MockBus`] records every successful transfer and can be told to fail.
//! Clones share the same record, so a test can keep one handle while the
//! driver owns another.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::hal::MockBus;
//! use led_marquee::protocol::Register;
//! use led_marquee::traits::BusTransport;
//!
//! let mut bus = MockBus::new();
//! let tap = bus.clone();
//!
//! bus.transmit(&[0x0A, 0x03, 0x0A, 0x03]).unwrap();
//! assert_eq!(tap.broadcasts(Register::Intensity), vec![3]);
//!
//! // Simulate a flaky link
//! bus.fail_next(1);
//! assert!(bus.transmit(&[0x0C, 0x01]).is_err());
//! assert_eq!(tap.attempts(), 2);
//! assert_eq!(tap.transmissions().len(), 1);
//! ```

use std::sync::{Arc, Mutex};

use crate::protocol::Register;
use crate::sync::lock;
use crate::traits::{BusError, BusTransport};

#[derive(Debug, Default)]
struct MockBusState {
    transmissions: Vec<Vec<u8>>,
    attempts: usize,
    fail_next: usize,
    failing: bool,
}

/// Recording bus transport.
#[derive(Clone, Debug, Default)]
pub struct MockBus {
    state: Arc<Mutex<MockBusState>>,
}

impl MockBus {
    /// Creates an empty, healthy mock bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful transfers, oldest first.
    pub fn transmissions(&self) -> Vec<Vec<u8>> {
        lock(&self.state).transmissions.clone()
    }

    /// Number of `transmit` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        lock(&self.state).attempts
    }

    /// Forgets recorded transfers and attempts.
    pub fn reset(&self) {
        let mut state = lock(&self.state);
        state.transmissions.clear();
        state.attempts = 0;
    }

    /// Makes the next `count` transfers fail.
    pub fn fail_next(&self, count: usize) {
        lock(&self.state).fail_next = count;
    }

    /// Makes every transfer fail until cleared.
    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    /// Values of transfers that wrote `register` to every chip.
    pub fn broadcasts(&self, register: Register) -> Vec<u8> {
        let register = u8::from(register);
        lock(&self.state)
            .transmissions
            .iter()
            .filter(|frame| !frame.is_empty() && frame.chunks(2).all(|pair| pair[0] == register))
            .map(|frame| frame[1])
            .collect()
    }

    /// Transfers that wrote digit (scan-line) registers.
    pub fn scanline_frames(&self) -> Vec<Vec<u8>> {
        let digits = u8::from(Register::Digit0)..=u8::from(Register::Digit7);
        lock(&self.state)
            .transmissions
            .iter()
            .filter(|frame| frame.first().is_some_and(|reg| digits.contains(reg)))
            .cloned()
            .collect()
    }
}

impl BusTransport for MockBus {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        let mut state = lock(&self.state);
        state.attempts += 1;
        if state.failing {
            return Err(BusError::Io(std::io::ErrorKind::BrokenPipe));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(BusError::ShortWrite {
                expected: bytes.len(),
                written: 0,
            });
        }
        state.transmissions.push(bytes.to_vec());
        Ok(())
    }
}

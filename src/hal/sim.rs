//! MAX7219 chain emulator.
//!
//! [`SimulatedChain`] decodes every transfer the way a real cascade would
//! (pair *p* of a frame lands in the chip at chain position *p*) and keeps
//! each chip's registers. Tests use it to check the physical image,
//! including column mirroring; the demo binary renders it as ASCII art.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::hal::SimulatedChain;
//! use led_marquee::protocol::PanelGrid;
//! use led_marquee::traits::BusTransport;
//!
//! let mut chain = SimulatedChain::new(PanelGrid::strip(2));
//! chain.transmit(&[0x0C, 0x01, 0x0C, 0x01]).unwrap(); // power on
//! chain.transmit(&[0x08, 0x01, 0x08, 0x80]).unwrap(); // top scan line
//!
//! let art = chain.render();
//! assert_eq!(art.lines().next(), Some("#..............#"));
//! ```

use std::sync::{Arc, Mutex};

use crate::protocol::{chain_position, PanelGrid, Register, SCANLINES};
use crate::sync::lock;
use crate::traits::{BusError, BusTransport};

/// Register file of one emulated chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChipState {
    /// Digit registers by scan line (0 = top, written through `Digit7`).
    pub scanlines: [u8; SCANLINES],
    /// Decode-mode register.
    pub decode_mode: u8,
    /// Intensity register.
    pub intensity: u8,
    /// Scan-limit register.
    pub scan_limit: u8,
    /// True while in shutdown (the power-on state).
    pub shutdown: bool,
    /// True while display-test lights every LED.
    pub display_test: bool,
}

impl Default for ChipState {
    fn default() -> Self {
        Self {
            scanlines: [0; SCANLINES],
            decode_mode: 0,
            intensity: 0,
            scan_limit: 0,
            shutdown: true,
            display_test: false,
        }
    }
}

impl ChipState {
    fn write(&mut self, register: u8, value: u8) {
        match register {
            r if (u8::from(Register::Digit0)..=u8::from(Register::Digit7)).contains(&r) => {
                let line = usize::from(u8::from(Register::Digit7) - r);
                self.scanlines[line] = value;
            }
            r if r == u8::from(Register::DecodeMode) => self.decode_mode = value,
            r if r == u8::from(Register::Intensity) => self.intensity = value & 0x0F,
            r if r == u8::from(Register::ScanLimit) => self.scan_limit = value & 0x07,
            r if r == u8::from(Register::Shutdown) => self.shutdown = value & 0x01 == 0,
            r if r == u8::from(Register::DisplayTest) => self.display_test = value & 0x01 != 0,
            _ => {}
        }
    }

    /// True when LED (`line`, `x`) is lit, x = 0 leftmost.
    pub fn lit(&self, line: usize, x: usize) -> bool {
        if self.display_test {
            return true;
        }
        if self.shutdown || line > usize::from(self.scan_limit) {
            return false;
        }
        self.scanlines[line] & (0x80 >> x) != 0
    }
}

/// Emulated cascade of MAX7219 chips.
///
/// Clones share the same chips.
#[derive(Clone, Debug)]
pub struct SimulatedChain {
    grid: PanelGrid,
    chips: Arc<Mutex<Vec<ChipState>>>,
}

impl SimulatedChain {
    /// Creates a powered-down chain for `grid`.
    pub fn new(grid: PanelGrid) -> Self {
        Self {
            grid,
            chips: Arc::new(Mutex::new(vec![ChipState::default(); grid.panels()])),
        }
    }

    /// Grid the chain is wired as.
    pub fn grid(&self) -> PanelGrid {
        self.grid
    }

    /// Registers of the chip behind panel (`row`, `col`).
    pub fn chip(&self, row: usize, col: usize) -> Option<ChipState> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        lock(&self.chips)
            .get(chain_position(&self.grid, row, col))
            .copied()
    }

    /// True when every chip is out of shutdown.
    pub fn is_powered(&self) -> bool {
        lock(&self.chips).iter().all(|chip| !chip.shutdown)
    }

    /// Renders the visible image, one text line per scan line, `#` for lit.
    pub fn render(&self) -> String {
        let chips = lock(&self.chips);
        let mut out = String::with_capacity(self.grid.panels() * SCANLINES * 9);
        for row in 0..self.grid.rows {
            for line in 0..SCANLINES {
                for col in 0..self.grid.cols {
                    let chip = &chips[chain_position(&self.grid, row, col)];
                    for x in 0..8 {
                        out.push(if chip.lit(line, x) { '#' } else { '.' });
                    }
                }
                out.push('\n');
            }
        }
        out
    }
}

impl BusTransport for SimulatedChain {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), BusError> {
        if bytes.len() != self.grid.frame_len() {
            return Err(BusError::Device(format!(
                "frame of {} bytes on a chain of {} chips",
                bytes.len(),
                self.grid.panels()
            )));
        }
        let mut chips = lock(&self.chips);
        for (chip, pair) in chips.iter_mut().zip(bytes.chunks_exact(2)) {
            chip.write(pair[0], pair[1]);
        }
        Ok(())
    }
}

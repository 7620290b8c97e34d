//! MAX7219 register map and panel addressing for a cascaded chain.
//!
//! Chips in a cascade share data and chip-select lines: every byte pair
//! clocked in pushes the previous pairs one chip further down the chain, and
//! all chips latch together when chip-select rises. A single transfer must
//! therefore carry exactly one register/value pair per chip, and addressing
//! one chip's scan line always costs a full-chain frame.
//!
//! # Chain order
//!
//! Panels are wired row by row. Within a row the chain runs right to left,
//! so the frame lists a row's columns from high to low:
//!
//! ```text
//!   grid 2x3            chain position
//!   (0,0)(0,1)(0,2)     2 1 0
//!   (1,0)(1,1)(1,2)     5 4 3
//! ```
//!
//! Everything here is pure and allocation free.

use crate::error::DisplayError;

/// Scan lines (digit registers) per chip.
pub const SCANLINES: usize = 8;

/// Largest supported chain.
pub const MAX_PANELS: usize = 32;

/// Largest supported number of panel rows.
pub const MAX_ROWS: usize = 8;

/// Bytes in the largest frame (one register/value pair per chip).
pub const MAX_FRAME_LEN: usize = MAX_PANELS * 2;

/// Highest value accepted by the intensity register.
pub const MAX_INTENSITY: u8 = 15;

/// Scan-limit value enabling all eight digits.
pub const SCAN_LIMIT_ALL: u8 = 7;

/// One bus transfer.
pub type Frame = heapless::Vec<u8, MAX_FRAME_LEN>;

/// MAX7219 register addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    /// No-op, used to skip chips in a chain.
    Noop = 0x00,
    /// Scan line 7 (bottom).
    Digit0 = 0x01,
    /// Digit 1.
    Digit1 = 0x02,
    /// Digit 2.
    Digit2 = 0x03,
    /// Digit 3.
    Digit3 = 0x04,
    /// Digit 4.
    Digit4 = 0x05,
    /// Digit 5.
    Digit5 = 0x06,
    /// Digit 6.
    Digit6 = 0x07,
    /// Scan line 0 (top).
    Digit7 = 0x08,
    /// BCD decode enable per digit; always 0 for matrices.
    DecodeMode = 0x09,
    /// PWM brightness, 0-15.
    Intensity = 0x0A,
    /// Number of digits scanned minus one.
    ScanLimit = 0x0B,
    /// 0 = shutdown, 1 = normal operation.
    Shutdown = 0x0C,
    /// 1 lights every LED; must be 0 in normal operation.
    DisplayTest = 0x0F,
}

impl From<Register> for u8 {
    fn from(register: Register) -> u8 {
        register as u8
    }
}

/// Fixed grid of panels, one MAX7219 per cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PanelGrid {
    /// Panel rows (text rows).
    pub rows: usize,
    /// Panels per row (visible characters per text row).
    pub cols: usize,
}

impl Default for PanelGrid {
    fn default() -> Self {
        Self::strip(4)
    }
}

impl PanelGrid {
    /// Creates a `rows` x `cols` grid.
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Creates a single-row strip of `cols` panels.
    pub const fn strip(cols: usize) -> Self {
        Self { rows: 1, cols }
    }

    /// Number of chips in the chain.
    #[inline]
    pub const fn panels(&self) -> usize {
        self.rows * self.cols
    }

    /// Bytes per bus transfer.
    #[inline]
    pub const fn frame_len(&self) -> usize {
        self.panels() * 2
    }

    /// Index of a panel in row-major cell storage.
    #[inline]
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Checks that the grid can be driven by a single chain.
    pub fn validate(&self) -> Result<(), DisplayError> {
        if self.rows == 0 || self.cols == 0 || self.rows > MAX_ROWS || self.panels() > MAX_PANELS
        {
            return Err(DisplayError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Checks a row index.
    pub fn check_row(&self, row: usize) -> Result<(), DisplayError> {
        if row >= self.rows {
            return Err(DisplayError::InvalidRow {
                row,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Checks a (row, column) cell.
    pub fn check_cell(&self, row: usize, col: usize) -> Result<(), DisplayError> {
        self.check_row(row)?;
        if col >= self.cols {
            return Err(DisplayError::InvalidColumn {
                col,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

/// Digit register holding `line` (0 = top scan line).
///
/// Lines are addressed high to low: line 0 is `Digit7`, line 7 is `Digit0`.
#[inline]
pub const fn scanline_register(line: usize) -> u8 {
    Register::Digit7 as u8 - line as u8
}

/// Position of panel (`row`, `col`) in the transmit order.
#[inline]
pub const fn chain_position(grid: &PanelGrid, row: usize, col: usize) -> usize {
    row * grid.cols + (grid.cols - 1 - col)
}

/// Panel (`row`, `col`) at chain position `position`.
#[inline]
pub const fn chain_cell(grid: &PanelGrid, position: usize) -> (usize, usize) {
    let row = position / grid.cols;
    let col = grid.cols - 1 - position % grid.cols;
    (row, col)
}

/// Builds the frame writing scan line `line` of every panel.
///
/// `cells` is row-major panel storage of `grid.panels()` entries. The
/// resulting frame is `grid.frame_len()` bytes long for a valid grid.
pub fn encode_scanline(grid: &PanelGrid, line: usize, cells: &[[u8; SCANLINES]]) -> Frame {
    let register = scanline_register(line);
    let mut frame = Frame::new();
    for position in 0..grid.panels() {
        let (row, col) = chain_cell(grid, position);
        let value = cells
            .get(grid.index(row, col))
            .map(|panel| panel[line])
            .unwrap_or(0);
        if frame.push(register).is_err() || frame.push(value).is_err() {
            break;
        }
    }
    frame
}

/// Builds the frame writing the same register/value pair to every chip.
pub fn encode_broadcast(grid: &PanelGrid, register: Register, value: u8) -> Frame {
    let mut frame = Frame::new();
    for _ in 0..grid.panels() {
        if frame.push(register.into()).is_err() || frame.push(value).is_err() {
            break;
        }
    }
    frame
}

/// Static register setup re-issued at start-up and periodically.
pub const fn configuration_sequence(intensity: u8) -> [(Register, u8); 5] {
    [
        (Register::DecodeMode, 0),
        (Register::Intensity, intensity),
        (Register::ScanLimit, SCAN_LIMIT_ALL),
        (Register::Shutdown, 1),
        (Register::DisplayTest, 0),
    ]
}

/// Maps an 8x8 glyph (bit 0 = leftmost pixel) to digit register values
/// (bit 7 = leftmost LED).
#[inline]
pub fn glyph_to_digits(glyph: &[u8; SCANLINES]) -> [u8; SCANLINES] {
    (*glyph).map(u8::reverse_bits)
}

/// Splits a 32-pixel scan line (bit 31 = leftmost) into four panel bytes.
#[inline]
pub const fn split_scanline(bits: u32) -> [u8; 4] {
    bits.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scanline_registers_count_down_from_digit7() {
        assert_eq!(scanline_register(0), 0x08);
        assert_eq!(scanline_register(7), 0x01);
    }

    #[test]
    fn chain_order_mirrors_columns_within_row() {
        let grid = PanelGrid::new(2, 3);
        assert_eq!(chain_position(&grid, 0, 2), 0);
        assert_eq!(chain_position(&grid, 0, 0), 2);
        assert_eq!(chain_position(&grid, 1, 2), 3);
        assert_eq!(chain_position(&grid, 1, 0), 5);

        for p in 0..grid.panels() {
            let (row, col) = chain_cell(&grid, p);
            assert_eq!(chain_position(&grid, row, col), p);
        }
    }

    #[test]
    fn scanline_frame_has_one_pair_per_chip() {
        let grid = PanelGrid::strip(4);
        let mut cells = [[0u8; SCANLINES]; 4];
        for (i, panel) in cells.iter_mut().enumerate() {
            panel[3] = 0x10 + i as u8;
        }

        let frame = encode_scanline(&grid, 3, &cells);
        assert_eq!(
            frame.as_slice(),
            &[0x05, 0x13, 0x05, 0x12, 0x05, 0x11, 0x05, 0x10]
        );
    }

    #[test]
    fn scanline_frame_for_grid_walks_rows_in_order() {
        let grid = PanelGrid::new(2, 2);
        let cells = [[1u8; SCANLINES], [2; SCANLINES], [3; SCANLINES], [4; SCANLINES]];

        let frame = encode_scanline(&grid, 0, &cells);
        assert_eq!(frame.len(), grid.frame_len());
        let values: Vec<u8> = frame.chunks(2).map(|pair| pair[1]).collect();
        assert_eq!(values, vec![2, 1, 4, 3]);
    }

    #[test]
    fn broadcast_repeats_pair() {
        let grid = PanelGrid::new(4, 4);
        let frame = encode_broadcast(&grid, Register::Intensity, 9);
        assert_eq!(frame.len(), 32);
        assert!(frame.chunks(2).all(|pair| pair == [0x0A, 9]));
    }

    #[test]
    fn configuration_sequence_is_bit_exact() {
        let seq = configuration_sequence(3);
        let raw: Vec<(u8, u8)> = seq.iter().map(|(r, v)| (u8::from(*r), *v)).collect();
        assert_eq!(
            raw,
            vec![(0x09, 0), (0x0A, 3), (0x0B, 7), (0x0C, 1), (0x0F, 0)]
        );
    }

    #[test]
    fn glyph_columns_are_reversed_into_digits() {
        let glyph = [0x01, 0x80, 0x03, 0, 0, 0, 0, 0xFF];
        let digits = glyph_to_digits(&glyph);
        assert_eq!(digits[0], 0x80);
        assert_eq!(digits[1], 0x01);
        assert_eq!(digits[2], 0xC0);
        assert_eq!(digits[7], 0xFF);
    }

    #[test]
    fn grid_validation() {
        assert!(PanelGrid::strip(4).validate().is_ok());
        assert!(PanelGrid::new(4, 4).validate().is_ok());
        assert!(PanelGrid::new(0, 4).validate().is_err());
        assert!(PanelGrid::new(1, 0).validate().is_err());
        assert!(PanelGrid::new(1, 33).validate().is_err());
        assert!(PanelGrid::new(9, 1).validate().is_err());
    }

    #[test]
    fn cell_checks_report_the_offending_index() {
        let grid = PanelGrid::new(2, 4);
        assert_eq!(
            grid.check_row(2),
            Err(DisplayError::InvalidRow { row: 2, rows: 2 })
        );
        assert_eq!(
            grid.check_cell(1, 4),
            Err(DisplayError::InvalidColumn { col: 4, cols: 4 })
        );
        assert!(grid.check_cell(1, 3).is_ok());
    }

    #[test]
    fn split_scanline_is_msb_first() {
        assert_eq!(split_scanline(0x8000_0001), [0x80, 0, 0, 0x01]);
    }
}

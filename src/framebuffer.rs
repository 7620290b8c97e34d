//! Pixel storage and the diffing double buffer.
//!
//! A [`Canvas`] holds eight scan-line bytes per panel in device order
//! (bit 7 = leftmost LED). The [`FrameBuffer`] pairs the canvas the content
//! provider just painted with a snapshot of what was last pushed to the
//! bus, and transmits only the scan lines that differ.
//!
//! Because the chips share one chain, a dirty scan line on any panel costs a
//! full-chain frame. Diffing therefore bounds traffic to the number of dirty
//! scan lines (at most eight per tick) and skips the bus entirely when
//! nothing changed.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::framebuffer::FrameBuffer;
//! use led_marquee::hal::MockBus;
//! use led_marquee::protocol::PanelGrid;
//!
//! let mut bus = MockBus::new();
//! let mut fb = FrameBuffer::new(PanelGrid::strip(4));
//!
//! // First flush always repaints every scan line
//! assert_eq!(fb.flush(&mut bus).frames, 8);
//!
//! // Nothing changed, nothing sent
//! assert_eq!(fb.flush(&mut bus).frames, 0);
//!
//! fb.current_mut().set_panel(0, 1, [0, 0, 0xFF, 0, 0, 0, 0, 0]);
//! assert_eq!(fb.flush(&mut bus).frames, 1);
//! ```

use crate::glyphs::Glyph;
use crate::protocol::{encode_scanline, glyph_to_digits, split_scanline, PanelGrid, SCANLINES};
use crate::traits::BusTransport;

/// Digit register values of one panel, scan line 0 first.
pub type PanelBits = [u8; SCANLINES];

/// Pixel state of every panel in the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    grid: PanelGrid,
    cells: Vec<PanelBits>,
}

impl Canvas {
    /// Creates a blank canvas.
    pub fn new(grid: PanelGrid) -> Self {
        Self {
            grid,
            cells: vec![[0; SCANLINES]; grid.panels()],
        }
    }

    /// Grid this canvas covers.
    #[inline]
    pub fn grid(&self) -> PanelGrid {
        self.grid
    }

    /// Row-major panel storage.
    #[inline]
    pub fn cells(&self) -> &[PanelBits] {
        &self.cells
    }

    /// Bits of panel (`row`, `col`), or `None` outside the grid.
    pub fn panel(&self, row: usize, col: usize) -> Option<&PanelBits> {
        if row >= self.grid.rows || col >= self.grid.cols {
            return None;
        }
        self.cells.get(self.grid.index(row, col))
    }

    /// Replaces panel (`row`, `col`). Out-of-grid writes are ignored.
    pub fn set_panel(&mut self, row: usize, col: usize, bits: PanelBits) {
        if row >= self.grid.rows || col >= self.grid.cols {
            return;
        }
        let index = self.grid.index(row, col);
        self.cells[index] = bits;
    }

    /// Paints a glyph (bit 0 leftmost) into panel (`row`, `col`).
    #[inline]
    pub fn set_glyph(&mut self, row: usize, col: usize, glyph: &Glyph) {
        self.set_panel(row, col, glyph_to_digits(glyph));
    }

    /// Paints 32-pixel scan lines (bit 31 leftmost) across the first four
    /// panels of `row`.
    pub fn set_row_bits(&mut self, row: usize, scanlines: &[u32; SCANLINES]) {
        for (line, bits) in scanlines.iter().enumerate() {
            for (col, byte) in split_scanline(*bits).into_iter().enumerate() {
                if row < self.grid.rows && col < self.grid.cols {
                    let index = self.grid.index(row, col);
                    self.cells[index][line] = byte;
                }
            }
        }
    }

    /// Blanks every panel.
    pub fn clear(&mut self) {
        self.cells.fill([0; SCANLINES]);
    }

    /// True when no LED is lit.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|panel| panel.iter().all(|b| *b == 0))
    }

    /// True when scan line `line` differs from `other` on any panel.
    fn scanline_differs(&self, other: &Canvas, line: usize) -> bool {
        self.cells
            .iter()
            .zip(other.cells.iter())
            .any(|(a, b)| a[line] != b[line])
    }

    fn copy_scanline_from(&mut self, other: &Canvas, line: usize) {
        for (dst, src) in self.cells.iter_mut().zip(other.cells.iter()) {
            dst[line] = src[line];
        }
    }
}

/// Outcome of one [`FrameBuffer::flush`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Scan-line frames handed to the bus.
    pub frames: usize,
    /// Frames the bus reported as failed.
    pub failures: usize,
}

/// Current/transmitted double buffer.
#[derive(Debug)]
pub struct FrameBuffer {
    current: Canvas,
    transmitted: Canvas,
    force_full: bool,
}

impl FrameBuffer {
    /// Creates a frame buffer whose first flush repaints everything.
    pub fn new(grid: PanelGrid) -> Self {
        let current = Canvas::new(grid);
        let mut transmitted = Canvas::new(grid);
        transmitted.cells.fill([0xFF; SCANLINES]);
        Self {
            current,
            transmitted,
            force_full: true,
        }
    }

    /// Canvas that will be sent on the next flush.
    #[inline]
    pub fn current(&self) -> &Canvas {
        &self.current
    }

    /// Mutable access to the pending canvas.
    #[inline]
    pub fn current_mut(&mut self) -> &mut Canvas {
        &mut self.current
    }

    /// What the chain is believed to show.
    #[inline]
    pub fn transmitted(&self) -> &Canvas {
        &self.transmitted
    }

    /// Forces the next flush to resend every scan line.
    #[inline]
    pub fn invalidate(&mut self) {
        self.force_full = true;
    }

    /// True when the next flush resends everything.
    #[inline]
    pub fn needs_full_repaint(&self) -> bool {
        self.force_full
    }

    /// Scan lines the next flush would transmit.
    pub fn dirty_scanlines(&self) -> [bool; SCANLINES] {
        core::array::from_fn(|line| {
            self.force_full || self.current.scanline_differs(&self.transmitted, line)
        })
    }

    /// Transmits every dirty scan line and records it as sent.
    ///
    /// A failed transfer is logged and still recorded: the periodic
    /// reconfiguration invalidates the snapshot and reasserts the image.
    pub fn flush<B: BusTransport + ?Sized>(&mut self, bus: &mut B) -> FlushReport {
        let grid = self.current.grid;
        let mut report = FlushReport::default();

        for (line, dirty) in self.dirty_scanlines().into_iter().enumerate() {
            if !dirty {
                continue;
            }
            let frame = encode_scanline(&grid, line, &self.current.cells);
            report.frames += 1;
            if let Err(e) = bus.transmit(&frame) {
                report.failures += 1;
                log::warn!("scan line {} transmit failed: {}", line, e);
            }
            self.transmitted.copy_scanline_from(&self.current, line);
        }

        self.force_full = false;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::glyph_for;
    use crate::hal::MockBus;

    #[test]
    fn canvas_ignores_out_of_range_writes() {
        let mut canvas = Canvas::new(PanelGrid::strip(2));
        canvas.set_panel(0, 5, [1; SCANLINES]);
        canvas.set_panel(3, 0, [1; SCANLINES]);
        assert!(canvas.is_blank());
        assert!(canvas.panel(0, 2).is_none());
    }

    #[test]
    fn set_glyph_stores_digit_order() {
        let mut canvas = Canvas::new(PanelGrid::strip(4));
        canvas.set_glyph(0, 2, glyph_for('H'));
        assert_eq!(
            canvas.panel(0, 2),
            Some(&glyph_to_digits(glyph_for('H')))
        );
        assert_eq!(canvas.panel(0, 1), Some(&[0; SCANLINES]));
    }

    #[test]
    fn row_bits_fill_four_panels() {
        let mut canvas = Canvas::new(PanelGrid::new(2, 4));
        let mut lines = [0u32; SCANLINES];
        lines[4] = 0x8000_00FF;
        canvas.set_row_bits(1, &lines);

        assert_eq!(canvas.panel(1, 0).map(|p| p[4]), Some(0x80));
        assert_eq!(canvas.panel(1, 3).map(|p| p[4]), Some(0xFF));
        assert!(canvas.panel(0, 0).is_some_and(|p| *p == [0; SCANLINES]));
    }

    #[test]
    fn row_bits_on_narrow_grid_drop_extra_panels() {
        let mut canvas = Canvas::new(PanelGrid::strip(2));
        canvas.set_row_bits(0, &[u32::MAX; SCANLINES]);
        assert_eq!(canvas.panel(0, 1), Some(&[0xFF; SCANLINES]));
    }

    #[test]
    fn first_flush_repaints_all_scanlines() {
        let mut fb = FrameBuffer::new(PanelGrid::strip(4));
        let mut bus = MockBus::new();

        assert!(fb.needs_full_repaint());
        let report = fb.flush(&mut bus);
        assert_eq!(report.frames, SCANLINES);
        assert_eq!(report.failures, 0);
        assert!(!fb.needs_full_repaint());
        assert_eq!(fb.transmitted(), fb.current());
    }

    #[test]
    fn unchanged_canvas_sends_nothing() {
        let mut fb = FrameBuffer::new(PanelGrid::strip(4));
        let mut bus = MockBus::new();
        fb.flush(&mut bus);
        let sent = bus.transmissions().len();

        let report = fb.flush(&mut bus);
        assert_eq!(report.frames, 0);
        assert_eq!(bus.transmissions().len(), sent);
    }

    #[test]
    fn only_dirty_scanlines_are_sent() {
        let mut fb = FrameBuffer::new(PanelGrid::new(2, 2));
        let mut bus = MockBus::new();
        fb.flush(&mut bus);
        bus.reset();

        let mut bits = [0u8; SCANLINES];
        bits[1] = 0x0F;
        bits[6] = 0xF0;
        fb.current_mut().set_panel(1, 0, bits);

        assert_eq!(
            fb.dirty_scanlines(),
            [false, true, false, false, false, false, true, false]
        );
        let report = fb.flush(&mut bus);
        assert_eq!(report.frames, 2);

        let sent = bus.transmissions();
        assert_eq!(sent[0].len(), 8);
        assert_eq!(sent[0][0], 0x07);
        assert_eq!(sent[1][0], 0x02);
    }

    #[test]
    fn invalidate_forces_full_repaint() {
        let mut fb = FrameBuffer::new(PanelGrid::strip(1));
        let mut bus = MockBus::new();
        fb.flush(&mut bus);

        fb.invalidate();
        assert_eq!(fb.flush(&mut bus).frames, SCANLINES);
        assert_eq!(fb.flush(&mut bus).frames, 0);
    }

    #[test]
    fn failed_transfers_are_counted_and_snapshot_advances() {
        let mut fb = FrameBuffer::new(PanelGrid::strip(1));
        let mut bus = MockBus::new();
        bus.fail_next(3);

        let report = fb.flush(&mut bus);
        assert_eq!(report.frames, SCANLINES);
        assert_eq!(report.failures, 3);
        assert_eq!(fb.flush(&mut bus).frames, 0);
    }
}

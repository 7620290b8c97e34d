//! Public display facade.
//!
//! [`DisplayDriver`] owns the bus, the frame buffer and the render thread.
//! All methods take `&self`, so a driver can be shared across threads
//! behind an `Arc`. Setters hold the state lock only for the mutation and
//! never across a bus transfer.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::{DisplayConfig, DisplayDriver, Ttl};
//! use led_marquee::hal::MockBus;
//!
//! let driver = DisplayDriver::new(MockBus::new(), DisplayConfig::default()).unwrap();
//! driver.set_text(0, "HELLO WORLD").unwrap();
//! driver.set_text_with_ttl(0, "NEW MSG", Ttl::Ticks(250)).unwrap();
//! driver.set_slowdown_factor(0, 2).unwrap();
//!
//! driver.start().unwrap();
//! // ... the render thread scrolls the text ...
//! driver.stop();
//! driver.join();
//! ```

use std::time::Duration;

use crate::animation::{Animation, MouthMode};
use crate::config::DisplayConfig;
use crate::error::DisplayError;
use crate::framebuffer::FlushReport;
use crate::glyphs::Glyph;
use crate::layer::{TextLayers, Ttl, MAX_TEXT_LEN};
use crate::protocol::{
    glyph_to_digits, split_scanline, PanelGrid, MAX_INTENSITY, MAX_ROWS, SCANLINES,
};
use crate::scheduler::{Renderer, Scheduler, SchedulerState, Shared};
use crate::sync::lock;
use crate::traits::{BusTransport, ContentProvider};

/// Horizontal shift applied by [`DisplayDriver::draw_shifted`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shift {
    /// Move pixels this many columns to the left.
    Left(u8),
    /// Move pixels this many columns to the right.
    Right(u8),
}

impl Shift {
    fn apply(self, glyph: &Glyph) -> Glyph {
        // Glyph bit 0 is the leftmost pixel
        (*glyph).map(|bits| match self {
            Self::Left(n) => bits.checked_shr(u32::from(n)).unwrap_or(0),
            Self::Right(n) => bits.checked_shl(u32::from(n)).unwrap_or(0),
        })
    }
}

/// Per-row snapshot for status reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowStatus {
    /// Text currently shown.
    pub text: heapless::String<MAX_TEXT_LEN>,
    /// Remaining lifetime of the text.
    pub ttl: Ttl,
    /// Ticks per scroll step.
    pub slowdown_factor: u32,
}

/// Driver snapshot for status reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayStatus {
    /// Render thread lifecycle.
    pub scheduler: SchedulerState,
    /// Tick period in milliseconds.
    pub delay_ms: u64,
    /// Intensity register value.
    pub intensity: u8,
    /// One entry per panel row.
    pub rows: heapless::Vec<RowStatus, MAX_ROWS>,
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "scheduler: {}", self.scheduler.as_str())?;
        writeln!(f, "delay: {} ms", self.delay_ms)?;
        write!(f, "intensity: {}", self.intensity)?;
        for (row, status) in self.rows.iter().enumerate() {
            write!(
                f,
                "\nrow {}: \"{}\" ttl={} sf={}",
                row, status.text, status.ttl, status.slowdown_factor
            )?;
        }
        Ok(())
    }
}

/// MAX7219 chain driver with a background render thread.
///
/// `C` is the content provider painted every tick: [`TextLayers`] for
/// scrolling text (the default) or [`Animation`] for mouth animations.
/// It is fixed at construction.
pub struct DisplayDriver<B, C = TextLayers> {
    scheduler: Scheduler<B, C>,
    config: DisplayConfig,
}

impl<B, C> DisplayDriver<B, C>
where
    B: BusTransport + 'static,
    C: ContentProvider + 'static,
{
    /// Creates a driver painting `content`.
    ///
    /// Validates `config`, configures every chip and blanks its digits.
    /// Any bus failure here is fatal.
    pub fn with_provider(bus: B, config: DisplayConfig, content: C) -> Result<Self, DisplayError> {
        config.validate()?;
        let mut renderer = Renderer::new(bus, &config);
        renderer.configure(config.intensity)?;
        renderer.blank()?;
        log::info!(
            "display ready: {}x{} panels, {} ms ticks",
            config.grid.rows,
            config.grid.cols,
            config.delay_ms
        );

        let shared = Shared::new(renderer, content, &config);
        Ok(Self {
            scheduler: Scheduler::new(shared, config.thread_name.clone()),
            config,
        })
    }

    /// Panel layout.
    #[inline]
    pub fn grid(&self) -> PanelGrid {
        self.config.grid
    }

    /// Configuration the driver was built with.
    #[inline]
    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    // ========================================================================
    // Scheduler control
    // ========================================================================

    /// Starts the render thread. No-op when already running.
    pub fn start(&self) -> Result<(), DisplayError> {
        self.scheduler.start()?;
        log::info!("render scheduler started");
        Ok(())
    }

    /// Asks the render thread to exit. Safe to call repeatedly.
    pub fn stop(&self) {
        self.scheduler.stop();
    }

    /// Waits for the render thread to exit. No-op when not started.
    pub fn join(&self) {
        self.scheduler.join();
    }

    /// Render thread lifecycle.
    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// True while the render thread is ticking.
    pub fn is_running(&self) -> bool {
        self.scheduler_state() == SchedulerState::Running
    }

    /// Runs one render tick on the calling thread.
    ///
    /// Refused while the render thread exists.
    pub fn repaint(&self) -> Result<FlushReport, DisplayError> {
        if self.scheduler_state() != SchedulerState::Stopped {
            return Err(DisplayError::SchedulerRunning);
        }
        Ok(self.scheduler.shared().render_once())
    }

    // ========================================================================
    // Device parameters
    // ========================================================================

    /// Sets the intensity (0-15).
    ///
    /// Written to the chips immediately when the scheduler is stopped,
    /// otherwise by the next tick. A failed immediate write leaves the
    /// previous level in place.
    pub fn set_intensity(&self, level: u8) -> Result<(), DisplayError> {
        if level > MAX_INTENSITY {
            return Err(DisplayError::InvalidIntensity(level));
        }
        let shared = self.scheduler.shared();
        if self.scheduler_state() == SchedulerState::Stopped {
            let mut renderer = lock(&shared.renderer);
            renderer.write_intensity(level)?;
            lock(&shared.state).intensity = level;
        } else {
            lock(&shared.state).intensity = level;
        }
        log::debug!("intensity set to {}", level);
        Ok(())
    }

    /// Current intensity.
    pub fn intensity(&self) -> u8 {
        lock(&self.scheduler.shared().state).intensity
    }

    /// Sets the tick period; takes effect from the next tick.
    pub fn set_delay(&self, delay: Duration) -> Result<(), DisplayError> {
        if delay.is_zero() {
            return Err(DisplayError::InvalidDelay);
        }
        lock(&self.scheduler.shared().state).delay = delay;
        log::debug!("tick delay set to {:?}", delay);
        Ok(())
    }

    /// Current tick period.
    pub fn delay(&self) -> Duration {
        lock(&self.scheduler.shared().state).delay
    }

    // ========================================================================
    // Content
    // ========================================================================

    /// Blanks all content and drops every overlay.
    pub fn clear(&self) {
        let mut state = lock(&self.scheduler.shared().state);
        state.content.clear();
        state.overlays.fill(None);
    }

    /// Runs `f` with the content provider under the state lock.
    ///
    /// Keep `f` short: the render thread waits for it.
    pub fn with_content<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut C) -> R,
    {
        let mut state = lock(&self.scheduler.shared().state);
        f(&mut state.content)
    }

    /// Pins a glyph (bit 0 leftmost) over panel (`row`, `col`).
    ///
    /// The overlay stays until the row's text is set or the display is
    /// cleared.
    pub fn draw(&self, row: usize, col: usize, glyph: &Glyph) -> Result<(), DisplayError> {
        self.grid().check_cell(row, col)?;
        let index = self.grid().index(row, col);
        lock(&self.scheduler.shared().state).overlays[index] = Some(glyph_to_digits(glyph));
        Ok(())
    }

    /// Pins a shifted glyph over panel (`row`, `col`).
    ///
    /// With `merge` the shifted pixels are OR-ed onto the panel's existing
    /// overlay instead of replacing it.
    pub fn draw_shifted(
        &self,
        row: usize,
        col: usize,
        shift: Shift,
        merge: bool,
        glyph: &Glyph,
    ) -> Result<(), DisplayError> {
        self.grid().check_cell(row, col)?;
        let index = self.grid().index(row, col);
        let mut bits = glyph_to_digits(&shift.apply(glyph));

        let mut state = lock(&self.scheduler.shared().state);
        if merge {
            if let Some(existing) = state.overlays[index] {
                for (b, e) in bits.iter_mut().zip(existing) {
                    *b |= e;
                }
            }
        }
        state.overlays[index] = Some(bits);
        Ok(())
    }

    /// Pins 32-pixel scan lines (bit 31 leftmost) over the first four
    /// panels of `row`.
    pub fn draw_row(&self, row: usize, scanlines: &[u32; SCANLINES]) -> Result<(), DisplayError> {
        let grid = self.grid();
        grid.check_row(row)?;

        let mut panels = [[0u8; SCANLINES]; 4];
        for (line, bits) in scanlines.iter().enumerate() {
            for (col, byte) in split_scanline(*bits).into_iter().enumerate() {
                panels[col][line] = byte;
            }
        }

        let mut state = lock(&self.scheduler.shared().state);
        for (col, bits) in panels.into_iter().enumerate().take(grid.cols) {
            state.overlays[grid.index(row, col)] = Some(bits);
        }
        Ok(())
    }
}

// ============================================================================
// Text engine
// ============================================================================

impl<B: BusTransport + 'static> DisplayDriver<B, TextLayers> {
    /// Creates a scrolling-text driver.
    pub fn new(bus: B, config: DisplayConfig) -> Result<Self, DisplayError> {
        let layers = TextLayers::new(config.grid);
        Self::with_provider(bus, config, layers)
    }

    /// Sets the text of `row` with no time limit.
    pub fn set_text(&self, row: usize, text: &str) -> Result<(), DisplayError> {
        self.set_text_with_ttl(row, text, Ttl::Forever)
    }

    /// Sets the text of `row`; after `ttl` ticks it reverts to the welcome
    /// text.
    pub fn set_text_with_ttl(&self, row: usize, text: &str, ttl: Ttl) -> Result<(), DisplayError> {
        let grid = self.grid();
        let mut state = lock(&self.scheduler.shared().state);
        state.content.set_text(row, text, ttl)?;
        state.clear_overlays(&grid, row);
        log::debug!("row {}: text set ({} chars, ttl {})", row, text.chars().count(), ttl);
        Ok(())
    }

    /// Restores the welcome text on every row.
    pub fn set_welcome_text(&self) {
        lock(&self.scheduler.shared().state)
            .content
            .set_welcome_text();
    }

    /// Assigns the welcome text of `row`, showing it now if `apply`.
    pub fn set_welcome_text_for(
        &self,
        row: usize,
        text: &str,
        apply: bool,
    ) -> Result<(), DisplayError> {
        lock(&self.scheduler.shared().state)
            .content
            .set_welcome_text_for(row, text, apply)
    }

    /// Sets ticks per scroll step for `row`.
    pub fn set_slowdown_factor(&self, row: usize, factor: u32) -> Result<(), DisplayError> {
        lock(&self.scheduler.shared().state)
            .content
            .set_slowdown_factor(row, factor)?;
        log::debug!("row {}: slowdown factor {}", row, factor);
        Ok(())
    }

    /// Text of `row`.
    pub fn text(&self, row: usize) -> Result<String, DisplayError> {
        self.with_content(|layers| layers.text(row).map(str::to_owned))
    }

    /// Welcome text of `row`.
    pub fn welcome_text(&self, row: usize) -> Result<String, DisplayError> {
        self.with_content(|layers| layers.welcome_text(row).map(str::to_owned))
    }

    /// Remaining lifetime of `row`'s text.
    pub fn ttl(&self, row: usize) -> Result<Ttl, DisplayError> {
        self.with_content(|layers| layers.ttl(row))
    }

    /// Ticks per scroll step for `row`.
    pub fn slowdown_factor(&self, row: usize) -> Result<u32, DisplayError> {
        self.with_content(|layers| layers.slowdown_factor(row))
    }

    /// Snapshot of the driver and every row.
    pub fn status(&self) -> DisplayStatus {
        let scheduler = self.scheduler_state();
        let state = lock(&self.scheduler.shared().state);

        let mut rows = heapless::Vec::new();
        for layer in state.content.layers() {
            let mut text = heapless::String::new();
            // Layer text never exceeds MAX_TEXT_LEN ASCII bytes
            let _ = text.push_str(layer.text());
            let _ = rows.push(RowStatus {
                text,
                ttl: layer.ttl(),
                slowdown_factor: layer.slowdown_factor(),
            });
        }

        DisplayStatus {
            scheduler,
            delay_ms: u64::try_from(state.delay.as_millis()).unwrap_or(u64::MAX),
            intensity: state.intensity,
            rows,
        }
    }
}

// ============================================================================
// Animation engine
// ============================================================================

impl<B: BusTransport + 'static> DisplayDriver<B, Animation> {
    /// Creates a mouth-animation driver in [`MouthMode::Resting`].
    pub fn animated(bus: B, config: DisplayConfig) -> Result<Self, DisplayError> {
        let animation = Animation::new(config.grid);
        Self::with_provider(bus, config, animation)
    }

    /// Switches animation mode and drops every overlay.
    pub fn set_mode(&self, mode: MouthMode) {
        let mut state = lock(&self.scheduler.shared().state);
        state.content.set_mode(mode);
        state.overlays.fill(None);
        log::debug!("mouth mode {}", mode.as_str());
    }

    /// Current animation mode.
    pub fn mode(&self) -> MouthMode {
        self.with_content(|animation| animation.mode())
    }

    /// Scrolls `text` across row 0, one column every `slowdown` ticks.
    pub fn display_text(&self, text: &str, slowdown: u32) -> Result<(), DisplayError> {
        let mut state = lock(&self.scheduler.shared().state);
        state.content.display_text(text, slowdown)?;
        state.overlays.fill(None);
        Ok(())
    }
}

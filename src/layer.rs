//! Scrolling text engine.
//!
//! One [`TextLayer`] per panel row holds the row's text, its scroll cursor,
//! a time-to-live and a slowdown factor. [`TextLayers`] owns one layer per
//! row and is the default [`ContentProvider`] behind the driver.
//!
//! # Tick order
//!
//! Every scheduler tick each layer runs, in order:
//!
//! 1. **Time-to-live**: a finite ttl counts down; on reaching zero the row
//!    falls back to its welcome text with ttl [`Ttl::Forever`].
//! 2. **Slowdown**: text wider than the row bumps a counter; when the counter
//!    reaches the slowdown factor the cursor advances one column.
//! 3. **Wrap**: a cursor past the end of the text restarts at `-width`, so
//!    the text re-enters from the right edge.
//! 4. **Rasterize**: visible column `c` shows the character at `cursor + c`,
//!    or blank outside the text.
//!
//! Text that fits the row never scrolls and keeps its cursor at 0.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::layer::{TextLayer, Ttl};
//!
//! let mut layer = TextLayer::new(4);
//! layer.set_text("HELLO", Ttl::Forever).unwrap();
//! assert_eq!(layer.cursor(), -4); // enters from the right
//!
//! for _ in 0..4 {
//!     layer.advance();
//! }
//! assert_eq!(layer.cursor(), 0);
//! assert_eq!(layer.window_text(), "HELL");
//! ```
//!
//! # Welcome text
//!
//! The first non-empty text set on a row becomes its welcome text unless
//! one was assigned explicitly with [`TextLayer::set_welcome_text`].
//!
//! [`ContentProvider`]: crate::traits::ContentProvider

use crate::error::DisplayError;
use crate::framebuffer::Canvas;
use crate::glyphs::{code_of, glyph};
use crate::protocol::PanelGrid;
use crate::traits::ContentProvider;

/// Longest text a layer holds, in characters.
pub const MAX_TEXT_LEN: usize = 256;

/// Text stored as 7-bit character codes.
pub type LayerText = heapless::Vec<u8, MAX_TEXT_LEN>;

/// Remaining lifetime of a row's text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Ttl {
    /// Never expires.
    #[default]
    Forever,
    /// Expires after this many ticks (at least one).
    Ticks(u32),
}

impl Ttl {
    /// Remaining ticks, or `None` for [`Ttl::Forever`].
    pub fn remaining(&self) -> Option<u32> {
        match self {
            Self::Forever => None,
            Self::Ticks(n) => Some(*n),
        }
    }

    /// Rejects `Ticks(0)`.
    pub fn validate(&self) -> Result<(), DisplayError> {
        match self {
            Self::Ticks(0) => Err(DisplayError::InvalidTtl),
            _ => Ok(()),
        }
    }
}

impl From<Option<u32>> for Ttl {
    fn from(ticks: Option<u32>) -> Self {
        ticks.map_or(Self::Forever, Self::Ticks)
    }
}

impl std::fmt::Display for Ttl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forever => write!(f, "forever"),
            Self::Ticks(n) => write!(f, "{}", n),
        }
    }
}

/// Encodes `text` into 7-bit codes.
fn encode(text: &str) -> Result<LayerText, DisplayError> {
    let len = text.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(DisplayError::TextTooLong {
            len,
            max: MAX_TEXT_LEN,
        });
    }
    let mut codes = LayerText::new();
    for c in text.chars() {
        // Length checked above
        let _ = codes.push(code_of(c));
    }
    Ok(codes)
}

fn as_str(codes: &LayerText) -> &str {
    // 7-bit codes are always valid UTF-8
    core::str::from_utf8(codes).unwrap_or_default()
}

/// Scroll state of one panel row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayer {
    width: usize,
    text: LayerText,
    welcome: LayerText,
    welcome_explicit: bool,
    cursor: i32,
    ttl: Ttl,
    slowdown: u32,
    counter: u32,
}

impl TextLayer {
    /// Creates an empty layer `width` characters wide.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            text: LayerText::new(),
            welcome: LayerText::new(),
            welcome_explicit: false,
            cursor: 0,
            ttl: Ttl::Forever,
            slowdown: 1,
            counter: 0,
        }
    }

    /// Visible width in characters.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Current text.
    pub fn text(&self) -> &str {
        as_str(&self.text)
    }

    /// Current text as 7-bit codes.
    #[inline]
    pub fn codes(&self) -> &[u8] {
        &self.text
    }

    /// Fallback text restored when the ttl runs out.
    pub fn welcome_text(&self) -> &str {
        as_str(&self.welcome)
    }

    /// Scroll cursor: text index shown in the leftmost column.
    #[inline]
    pub fn cursor(&self) -> i32 {
        self.cursor
    }

    /// Remaining lifetime of the current text.
    #[inline]
    pub fn ttl(&self) -> Ttl {
        self.ttl
    }

    /// Ticks per one-column scroll step.
    #[inline]
    pub fn slowdown_factor(&self) -> u32 {
        self.slowdown
    }

    /// True when the text is wider than the row.
    #[inline]
    pub fn scrolls(&self) -> bool {
        self.text.len() > self.width
    }

    fn width_i32(&self) -> i32 {
        i32::try_from(self.width).unwrap_or(i32::MAX)
    }

    fn reseed(&mut self) {
        self.cursor = if self.scrolls() { -self.width_i32() } else { 0 };
        self.counter = 0;
    }

    /// Replaces the text and restarts scrolling.
    ///
    /// On error the layer is unchanged.
    pub fn set_text(&mut self, text: &str, ttl: Ttl) -> Result<(), DisplayError> {
        ttl.validate()?;
        let codes = encode(text)?;
        if !self.welcome_explicit && self.welcome.is_empty() && !codes.is_empty() {
            self.welcome = codes.clone();
        }
        self.text = codes;
        self.ttl = ttl;
        self.reseed();
        Ok(())
    }

    /// Assigns the welcome text explicitly, showing it now if `apply`.
    pub fn set_welcome_text(&mut self, text: &str, apply: bool) -> Result<(), DisplayError> {
        self.welcome = encode(text)?;
        self.welcome_explicit = true;
        if apply {
            self.restore_welcome();
        }
        Ok(())
    }

    /// Shows the welcome text with ttl [`Ttl::Forever`].
    pub fn restore_welcome(&mut self) {
        self.text = self.welcome.clone();
        self.ttl = Ttl::Forever;
        self.reseed();
    }

    /// Sets ticks per scroll step.
    pub fn set_slowdown_factor(&mut self, factor: u32) -> Result<(), DisplayError> {
        if factor == 0 {
            return Err(DisplayError::InvalidSlowdownFactor(factor));
        }
        self.slowdown = factor;
        self.counter = 0;
        Ok(())
    }

    /// Blanks the text. The welcome text and slowdown factor are kept.
    pub fn clear(&mut self) {
        self.text.clear();
        self.ttl = Ttl::Forever;
        self.reseed();
    }

    /// Runs the ttl, slowdown and wrap steps of one tick.
    pub fn advance(&mut self) {
        if let Ttl::Ticks(n) = self.ttl {
            if n <= 1 {
                log::debug!("ttl expired, restoring welcome text");
                self.restore_welcome();
            } else {
                self.ttl = Ttl::Ticks(n - 1);
            }
        }

        if !self.scrolls() {
            return;
        }

        self.counter += 1;
        if self.counter >= self.slowdown {
            self.counter = 0;
            self.cursor += 1;
        }
        if self.cursor > i32::try_from(self.text.len()).unwrap_or(i32::MAX) {
            self.cursor = -self.width_i32();
        }
    }

    /// Character codes in the visible columns, 0 where no character shows.
    pub fn window(&self) -> impl Iterator<Item = u8> + '_ {
        (0..self.width).map(move |col| {
            let index = i64::from(self.cursor) + col as i64;
            usize::try_from(index)
                .ok()
                .and_then(|i| self.text.get(i).copied())
                .unwrap_or(0)
        })
    }

    /// Visible characters as a string, blanks as spaces.
    pub fn window_text(&self) -> String {
        self.window()
            .map(|code| if code == 0 { ' ' } else { char::from(code) })
            .collect()
    }

    /// Paints the visible columns into panel row `row`.
    pub fn rasterize(&self, row: usize, canvas: &mut Canvas) {
        for (col, code) in self.window().enumerate() {
            canvas.set_glyph(row, col, glyph(code));
        }
    }
}

/// One [`TextLayer`] per panel row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLayers {
    grid: PanelGrid,
    layers: Vec<TextLayer>,
}

impl TextLayers {
    /// Creates empty layers for every row of `grid`.
    pub fn new(grid: PanelGrid) -> Self {
        Self {
            grid,
            layers: (0..grid.rows).map(|_| TextLayer::new(grid.cols)).collect(),
        }
    }

    /// Grid the layers cover.
    #[inline]
    pub fn grid(&self) -> PanelGrid {
        self.grid
    }

    /// All layers, top row first.
    #[inline]
    pub fn layers(&self) -> &[TextLayer] {
        &self.layers
    }

    /// Layer of `row`.
    pub fn layer(&self, row: usize) -> Result<&TextLayer, DisplayError> {
        self.grid.check_row(row)?;
        Ok(&self.layers[row])
    }

    fn layer_mut(&mut self, row: usize) -> Result<&mut TextLayer, DisplayError> {
        self.grid.check_row(row)?;
        Ok(&mut self.layers[row])
    }

    /// Sets the text of `row`.
    pub fn set_text(&mut self, row: usize, text: &str, ttl: Ttl) -> Result<(), DisplayError> {
        self.layer_mut(row)?.set_text(text, ttl)
    }

    /// Restores every row's welcome text.
    pub fn set_welcome_text(&mut self) {
        self.layers.iter_mut().for_each(TextLayer::restore_welcome);
    }

    /// Assigns the welcome text of `row`, showing it now if `apply`.
    pub fn set_welcome_text_for(
        &mut self,
        row: usize,
        text: &str,
        apply: bool,
    ) -> Result<(), DisplayError> {
        self.layer_mut(row)?.set_welcome_text(text, apply)
    }

    /// Sets the slowdown factor of `row`.
    pub fn set_slowdown_factor(&mut self, row: usize, factor: u32) -> Result<(), DisplayError> {
        self.layer_mut(row)?.set_slowdown_factor(factor)
    }

    /// Text of `row`.
    pub fn text(&self, row: usize) -> Result<&str, DisplayError> {
        Ok(self.layer(row)?.text())
    }

    /// Welcome text of `row`.
    pub fn welcome_text(&self, row: usize) -> Result<&str, DisplayError> {
        Ok(self.layer(row)?.welcome_text())
    }

    /// Ttl of `row`.
    pub fn ttl(&self, row: usize) -> Result<Ttl, DisplayError> {
        Ok(self.layer(row)?.ttl())
    }

    /// Slowdown factor of `row`.
    pub fn slowdown_factor(&self, row: usize) -> Result<u32, DisplayError> {
        Ok(self.layer(row)?.slowdown_factor())
    }

    /// Scroll cursor of `row`.
    pub fn cursor(&self, row: usize) -> Result<i32, DisplayError> {
        Ok(self.layer(row)?.cursor())
    }

    /// Advances every row by one tick without painting.
    pub fn advance(&mut self) {
        self.layers.iter_mut().for_each(TextLayer::advance);
    }

    /// Paints every row into `canvas`.
    pub fn rasterize(&self, canvas: &mut Canvas) {
        for (row, layer) in self.layers.iter().enumerate() {
            layer.rasterize(row, canvas);
        }
    }
}

impl ContentProvider for TextLayers {
    fn tick(&mut self, canvas: &mut Canvas) {
        self.advance();
        self.rasterize(canvas);
    }

    fn clear(&mut self) {
        self.layers.iter_mut().for_each(TextLayer::clear);
    }
}

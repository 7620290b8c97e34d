//! Single-row mouth animations.
//!
//! [`Animation`] drives the first four panels of row 0 as one 32x8 bitmap
//! and is an alternative [`ContentProvider`] to the text engine. Each
//! [`MouthMode`] owns a frame-cycle generator:
//!
//! | Mode | Frames | Step every | Motion |
//! |------|--------|------------|--------|
//! | `Resting` | 4 | 20 ticks | ping-pong, skips frame 0 on the way back |
//! | `Smile` | 6 | 20 ticks | ping-pong |
//! | `Speaking` | 5 | 5 ticks | ping-pong |
//! | `Cylon` | - | 1 tick | single column bouncing across 32 columns |
//! | `Text` | - | slowdown | scrolling [`TextLayer`] |
//!
//! Frames hold 32-bit scan lines, bit 31 the leftmost LED.
//!
//! # Example
//!
//! ```rust
//! use led_marquee::animation::{Animation, MouthMode};
//! use led_marquee::framebuffer::Canvas;
//! use led_marquee::protocol::PanelGrid;
//! use led_marquee::traits::ContentProvider;
//!
//! let grid = PanelGrid::strip(4);
//! let mut mouth = Animation::new(grid);
//! mouth.set_mode(MouthMode::Smile);
//!
//! let mut canvas = Canvas::new(grid);
//! mouth.tick(&mut canvas);
//! assert!(!canvas.is_blank());
//! ```
//!
//! [`ContentProvider`]: crate::traits::ContentProvider

use crate::error::DisplayError;
use crate::framebuffer::Canvas;
use crate::layer::{TextLayer, Ttl};
use crate::protocol::{PanelGrid, SCANLINES};
use crate::traits::ContentProvider;

/// One 32x8 frame.
pub type Bitmap = [u32; SCANLINES];

/// Columns covered by a bitmap.
pub const BITMAP_WIDTH: u32 = 32;

static RESTING: [Bitmap; 4] = [
    [0, 0, 0, 0x0007_e000, 0x03ff_ffc0, 0x0007_e000, 0, 0],
    [0, 0, 0, 0x0003_c000, 0x07ff_ffe0, 0x0003_c000, 0, 0],
    [0, 0, 0, 0x0001_8000, 0x0fff_fff0, 0x0001_8000, 0, 0],
    [0, 0, 0, 0, 0x1fff_fff8, 0, 0, 0],
];

#[rustfmt::skip]
static SMILE: [Bitmap; 6] = [
    [
        0xc000_0003, 0xc000_0003, 0x3000_000c, 0x3000_000c,
        0x0c00_0030, 0x0c00_0030, 0x03ff_ffc0, 0x03ff_ffc0,
    ],
    [
        0, 0xc000_0003, 0x3000_000c, 0x3000_000c,
        0x0c00_0030, 0x0c00_0030, 0x03ff_ffc0, 0x03ff_ffc0,
    ],
    [0, 0, 0, 0x3000_000c, 0x0c00_0030, 0x0c00_0030, 0x03ff_ffc0, 0x03ff_ffc0],
    [0, 0, 0, 0, 0x0c00_0030, 0x0c00_0030, 0x03ff_ffc0, 0x03ff_ffc0],
    [0, 0, 0, 0, 0, 0x0c00_0030, 0x03ff_ffc0, 0x03ff_ffc0],
    [0, 0, 0, 0, 0, 0, 0x03ff_ffc0, 0x03ff_ffc0],
];

#[rustfmt::skip]
static SPEAKING: [Bitmap; 5] = [
    [
        0, 0x3fff_fffc, 0x3000_000c, 0x3000_000c,
        0x3000_000c, 0x3000_000c, 0x3fff_fffc, 0,
    ],
    [0, 0, 0x3fff_fffc, 0x3000_000c, 0x3000_000c, 0x3000_000c, 0x3fff_fffc, 0],
    [0, 0, 0x3fff_fffc, 0x3000_000c, 0x3000_000c, 0x3fff_fffc, 0, 0],
    [0, 0, 0, 0x3fff_fffc, 0x3000_000c, 0x3fff_fffc, 0, 0],
    [0, 0, 0, 0x3fff_fffc, 0x3fff_fffc, 0, 0, 0],
];

/// Animation modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MouthMode {
    /// Idle mouth, slowly opening and closing.
    #[default]
    Resting,
    /// Smile growing and shrinking.
    Smile,
    /// Single column sweeping left and right.
    Cylon,
    /// Mouth moving as if talking.
    Speaking,
    /// Free text scrolling across the row.
    Text,
}

impl MouthMode {
    /// All modes, in declaration order.
    pub const ALL: [MouthMode; 5] = [
        Self::Resting,
        Self::Smile,
        Self::Cylon,
        Self::Speaking,
        Self::Text,
    ];

    /// Lower-case mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resting => "resting",
            Self::Smile => "smile",
            Self::Cylon => "cylon",
            Self::Speaking => "speaking",
            Self::Text => "text",
        }
    }
}

impl std::str::FromStr for MouthMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Ping-pong walk over a frame table.
///
/// Shows `frames[index]` every `period` ticks, then steps. Past the last
/// frame it turns around; below zero it restarts at `rebound`.
#[derive(Clone, Debug)]
pub struct FrameCycle {
    frames: &'static [Bitmap],
    period: u32,
    rebound: usize,
    index: usize,
    forward: bool,
}

impl FrameCycle {
    /// Creates a cycle starting at frame 0, moving forward.
    pub const fn new(frames: &'static [Bitmap], period: u32, rebound: usize) -> Self {
        Self {
            frames,
            period,
            rebound,
            index: 0,
            forward: true,
        }
    }

    /// Index of the frame shown on the next step.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the frame for tick `cycle`, or `None` between steps.
    pub fn step(&mut self, cycle: u32) -> Option<&'static Bitmap> {
        if self.period == 0 || cycle % self.period != 0 {
            return None;
        }
        let frame = self.frames.get(self.index)?;
        let last = self.frames.len().saturating_sub(1);

        if self.forward {
            self.index += 1;
            if self.index >= last {
                self.index = last;
                self.forward = false;
            }
        } else if self.index == 0 {
            self.index = self.rebound;
            self.forward = true;
        } else {
            self.index -= 1;
        }
        Some(frame)
    }
}

/// Bouncing single-column sweep.
#[derive(Clone, Debug, Default)]
pub struct CylonSweep {
    x: u32,
    reverse: bool,
}

impl CylonSweep {
    /// Column lit on the next step, 0 = rightmost.
    #[inline]
    pub fn column(&self) -> u32 {
        self.x
    }

    /// Returns the frame for tick `cycle`; tick 0 draws nothing.
    pub fn step(&mut self, cycle: u32) -> Option<Bitmap> {
        if cycle == 0 {
            return None;
        }
        let frame = [1u32 << self.x; SCANLINES];

        if self.reverse {
            if self.x == 0 {
                self.reverse = false;
            } else {
                self.x -= 1;
            }
        } else if self.x + 1 >= BITMAP_WIDTH {
            self.reverse = true;
        } else {
            self.x += 1;
        }
        Some(frame)
    }
}

#[derive(Clone, Debug)]
enum Generator {
    Frames(FrameCycle),
    Cylon(CylonSweep),
    Text,
}

impl Generator {
    fn for_mode(mode: MouthMode) -> Self {
        match mode {
            MouthMode::Resting => Self::Frames(FrameCycle::new(&RESTING, 20, 1)),
            MouthMode::Smile => Self::Frames(FrameCycle::new(&SMILE, 20, 0)),
            MouthMode::Speaking => Self::Frames(FrameCycle::new(&SPEAKING, 5, 0)),
            MouthMode::Cylon => Self::Cylon(CylonSweep::default()),
            MouthMode::Text => Self::Text,
        }
    }
}

/// Mouth animation content provider.
#[derive(Clone, Debug)]
pub struct Animation {
    grid: PanelGrid,
    mode: MouthMode,
    generator: Generator,
    frame: Bitmap,
    text: TextLayer,
    cycle: u32,
}

impl Animation {
    /// Creates an animation in [`MouthMode::Resting`].
    pub fn new(grid: PanelGrid) -> Self {
        Self {
            grid,
            mode: MouthMode::Resting,
            generator: Generator::for_mode(MouthMode::Resting),
            frame: [0; SCANLINES],
            text: TextLayer::new(grid.cols),
            cycle: 0,
        }
    }

    /// Current mode.
    #[inline]
    pub fn mode(&self) -> MouthMode {
        self.mode
    }

    /// Switches mode, restarting its frame cycle.
    pub fn set_mode(&mut self, mode: MouthMode) {
        self.mode = mode;
        self.generator = Generator::for_mode(mode);
        self.cycle = 0;
    }

    /// Scrolls `text` on row 0 and switches to [`MouthMode::Text`].
    pub fn display_text(&mut self, text: &str, slowdown: u32) -> Result<(), DisplayError> {
        let mut layer = TextLayer::new(self.grid.cols);
        layer.set_slowdown_factor(slowdown)?;
        layer.set_text(text, Ttl::Forever)?;
        self.text = layer;
        self.set_mode(MouthMode::Text);
        Ok(())
    }

    /// Text shown in [`MouthMode::Text`].
    pub fn text(&self) -> &TextLayer {
        &self.text
    }

    /// Last bitmap produced by a frame generator.
    #[inline]
    pub fn frame(&self) -> &Bitmap {
        &self.frame
    }
}

impl ContentProvider for Animation {
    fn tick(&mut self, canvas: &mut Canvas) {
        let cycle = self.cycle;
        self.cycle = self.cycle.wrapping_add(1);

        match &mut self.generator {
            Generator::Frames(frames) => {
                if let Some(next) = frames.step(cycle) {
                    self.frame = *next;
                }
            }
            Generator::Cylon(sweep) => {
                if let Some(next) = sweep.step(cycle) {
                    self.frame = next;
                }
            }
            Generator::Text => {
                self.text.advance();
                self.text.rasterize(0, canvas);
                return;
            }
        }
        canvas.set_row_bits(0, &self.frame);
    }

    fn clear(&mut self) {
        self.frame = [0; SCANLINES];
        self.text.clear();
    }
}

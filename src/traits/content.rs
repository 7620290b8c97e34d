//! Row content providers.
//!
//! The render scheduler does not know what it is painting. Each tick it
//! hands a blank [`Canvas`] to a [`ContentProvider`], which advances its own
//! state by one step and rasterizes into the canvas. Two providers ship with
//! the crate:
//!
//! - [`TextLayers`](crate::layer::TextLayers): multi-row scrolling text with
//!   per-row time-to-live and slowdown
//! - [`Animation`](crate::animation::Animation): single-row mouth animations
//!   (resting, smile, cylon scan, speaking, free text)

use crate::framebuffer::Canvas;

/// Strategy that fills the canvas once per scheduler tick.
///
/// Implementations are mutated by caller threads through the driver facade
/// and advanced by the scheduler thread, always under the driver's state
/// lock. `tick` must not block or perform I/O.
pub trait ContentProvider: Send {
    /// Advance one tick and rasterize into `canvas`.
    ///
    /// The canvas is blank on entry.
    fn tick(&mut self, canvas: &mut Canvas);

    /// Drop all content so that subsequent ticks render a blank display.
    fn clear(&mut self);
}

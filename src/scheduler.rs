//! Background render loop.
//!
//! The scheduler owns the only thread that touches the bus after
//! construction. Each tick it:
//!
//! 1. Locks the shared state, blanks the canvas, lets the content provider
//!    advance and rasterize, applies draw overlays and copies the intensity.
//! 2. Unlocks, then every `refresh_interval` ticks (tick 0 included)
//!    re-issues the static configuration and invalidates the frame buffer,
//!    or writes a changed intensity.
//! 3. Flushes dirty scan lines.
//!
//! # Locks
//!
//! | Lock | Guards | Held during I/O |
//! |------|--------|-----------------|
//! | `state` | content, overlays, delay, intensity, running flag | never |
//! | `renderer` | bus, frame buffer, tick counter | yes |
//!
//! When both are needed the renderer lock is taken first.
//!
//! # Timing
//!
//! The wake-up deadline is computed at the top of each iteration, before
//! any work, so render time does not stretch the period. The wait ends
//! early when [`Scheduler::stop`] clears the running flag and notifies the
//! condition variable.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{DisplayConfig, ShortString};
use crate::error::DisplayError;
use crate::framebuffer::{FlushReport, FrameBuffer, PanelBits};
use crate::protocol::{
    configuration_sequence, encode_broadcast, encode_scanline, PanelGrid, Register, SCANLINES,
};
use crate::sync::lock;
use crate::traits::{BusError, BusTransport, ContentProvider};

/// Lifecycle of the render thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SchedulerState {
    /// No render thread.
    Stopped,
    /// Render thread ticking.
    Running,
    /// Stop requested, thread not yet exited.
    Stopping,
}

impl SchedulerState {
    /// Lower-case state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

/// State shared between callers and the render thread.
pub(crate) struct State<C> {
    pub(crate) content: C,
    pub(crate) overlays: Vec<Option<PanelBits>>,
    pub(crate) delay: Duration,
    pub(crate) intensity: u8,
    /// Cleared by `stop()`; the loop exits at its next check.
    pub(crate) running: bool,
    /// True from `start()` until the render thread has written its shutdown.
    pub(crate) alive: bool,
}

impl<C> State<C> {
    fn new(content: C, config: &DisplayConfig) -> Self {
        Self {
            content,
            overlays: vec![None; config.grid.panels()],
            delay: config.delay(),
            intensity: config.intensity,
            running: false,
            alive: false,
        }
    }

    /// Drops the overlays of `row`.
    pub(crate) fn clear_overlays(&mut self, grid: &PanelGrid, row: usize) {
        let start = grid.index(row, 0);
        for overlay in self.overlays.iter_mut().skip(start).take(grid.cols) {
            *overlay = None;
        }
    }
}

/// Bus side of a tick: transport, frame buffer and tick counter.
pub(crate) struct Renderer<B> {
    bus: B,
    grid: PanelGrid,
    frame: FrameBuffer,
    tick: u32,
    refresh_interval: u32,
    intensity: u8,
    powered: bool,
}

impl<B: BusTransport> Renderer<B> {
    pub(crate) fn new(bus: B, config: &DisplayConfig) -> Self {
        Self {
            bus,
            grid: config.grid,
            frame: FrameBuffer::new(config.grid),
            tick: 0,
            refresh_interval: config.refresh_interval,
            intensity: config.intensity,
            powered: false,
        }
    }

    fn broadcast(&mut self, register: Register, value: u8) -> Result<(), BusError> {
        self.bus.transmit(&encode_broadcast(&self.grid, register, value))
    }

    /// Writes the static register setup to every chip.
    pub(crate) fn configure(&mut self, intensity: u8) -> Result<(), BusError> {
        for (register, value) in configuration_sequence(intensity) {
            self.broadcast(register, value)?;
        }
        self.intensity = intensity;
        self.powered = true;
        Ok(())
    }

    /// Zeroes every digit register.
    pub(crate) fn blank(&mut self) -> Result<(), BusError> {
        let cells = vec![[0u8; SCANLINES]; self.grid.panels()];
        for line in 0..SCANLINES {
            self.bus.transmit(&encode_scanline(&self.grid, line, &cells))?;
        }
        Ok(())
    }

    /// Writes the intensity register to every chip.
    pub(crate) fn write_intensity(&mut self, intensity: u8) -> Result<(), BusError> {
        self.broadcast(Register::Intensity, intensity)?;
        self.intensity = intensity;
        Ok(())
    }

    /// Puts every chip into shutdown. The next tick reconfigures.
    pub(crate) fn shutdown(&mut self) {
        self.powered = false;
        if let Err(e) = self.broadcast(Register::Shutdown, 0) {
            log::warn!("shutdown write failed: {}", e);
        }
    }

    /// Ticks completed so far.
    pub(crate) fn ticks(&self) -> u32 {
        self.tick
    }

    /// Runs one render tick against `state`.
    pub(crate) fn tick<C: ContentProvider>(&mut self, state: &Mutex<State<C>>) -> FlushReport {
        let intensity = {
            let mut state = lock(state);
            let canvas = self.frame.current_mut();
            canvas.clear();
            state.content.tick(canvas);
            for (index, overlay) in state.overlays.iter().enumerate() {
                if let Some(bits) = overlay {
                    canvas.set_panel(index / self.grid.cols, index % self.grid.cols, *bits);
                }
            }
            state.intensity
        };

        if !self.powered || self.tick % self.refresh_interval == 0 {
            log::debug!("tick {}: reconfiguring chain", self.tick);
            if let Err(e) = self.configure(intensity) {
                log::warn!("reconfiguration failed: {}", e);
            }
            self.frame.invalidate();
        } else if intensity != self.intensity {
            if let Err(e) = self.write_intensity(intensity) {
                log::warn!("intensity write failed: {}", e);
            }
        }

        let report = self.frame.flush(&mut self.bus);
        self.tick = self.tick.wrapping_add(1);
        report
    }
}

/// Everything the render thread needs, behind one `Arc`.
pub(crate) struct Shared<B, C> {
    pub(crate) state: Mutex<State<C>>,
    pub(crate) wake: Condvar,
    pub(crate) renderer: Mutex<Renderer<B>>,
}

impl<B: BusTransport, C: ContentProvider> Shared<B, C> {
    pub(crate) fn new(renderer: Renderer<B>, content: C, config: &DisplayConfig) -> Self {
        Self {
            state: Mutex::new(State::new(content, config)),
            wake: Condvar::new(),
            renderer: Mutex::new(renderer),
        }
    }

    /// Runs one tick on the calling thread.
    pub(crate) fn render_once(&self) -> FlushReport {
        lock(&self.renderer).tick(&self.state)
    }
}

/// Clears `alive` and wakes waiters when the render thread ends, panics included.
struct ExitMarker<'a, B, C>(&'a Shared<B, C>);

impl<B, C> Drop for ExitMarker<'_, B, C> {
    fn drop(&mut self) {
        lock(&self.0.state).alive = false;
        self.0.wake.notify_all();
    }
}

fn run<B: BusTransport, C: ContentProvider>(shared: Arc<Shared<B, C>>) {
    let _exit = ExitMarker(&shared);
    log::info!("render loop started");
    loop {
        let delay = {
            let state = lock(&shared.state);
            if !state.running {
                break;
            }
            state.delay
        };
        let deadline = Instant::now() + delay;

        shared.render_once();

        let state = lock(&shared.state);
        let remaining = deadline.saturating_duration_since(Instant::now());
        let (state, _) = shared
            .wake
            .wait_timeout_while(state, remaining, |s| s.running)
            .unwrap_or_else(PoisonError::into_inner);
        if !state.running {
            break;
        }
    }
    let mut renderer = lock(&shared.renderer);
    renderer.shutdown();
    log::info!("render loop exited after {} ticks", renderer.ticks());
}

/// Start/stop control of the render thread.
pub(crate) struct Scheduler<B, C> {
    shared: Arc<Shared<B, C>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    thread_name: ShortString,
}

impl<B, C> Scheduler<B, C>
where
    B: BusTransport + 'static,
    C: ContentProvider + 'static,
{
    pub(crate) fn new(shared: Shared<B, C>, thread_name: ShortString) -> Self {
        Self {
            shared: Arc::new(shared),
            handle: Mutex::new(None),
            thread_name,
        }
    }

    pub(crate) fn shared(&self) -> &Shared<B, C> {
        &self.shared
    }

    /// Spawns the render thread unless it is already running.
    ///
    /// A thread that is still stopping is waited for first, on the condition
    /// variable rather than the handle lock.
    pub(crate) fn start(&self) -> Result<(), DisplayError> {
        {
            let mut state = self
                .shared
                .wake
                .wait_while(lock(&self.shared.state), |s| s.alive && !s.running)
                .unwrap_or_else(PoisonError::into_inner);
            if state.alive {
                return Ok(());
            }
            state.alive = true;
            state.running = true;
        }

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.thread_name.as_str().to_owned())
            .spawn(move || run(shared));

        match spawned {
            Ok(h) => {
                let stale = lock(&self.handle).replace(h);
                // The previous thread has already cleared `alive`
                if let Some(stale) = stale {
                    join_quietly(stale);
                }
                Ok(())
            }
            Err(e) => {
                {
                    let mut state = lock(&self.shared.state);
                    state.running = false;
                    state.alive = false;
                }
                self.shared.wake.notify_all();
                Err(DisplayError::Spawn(e.kind()))
            }
        }
    }

    /// Asks the render thread to exit and wakes it. Safe to call repeatedly.
    pub(crate) fn stop(&self) {
        lock(&self.shared.state).running = false;
        self.shared.wake.notify_all();
    }

    /// Waits for the render thread to exit. No-op when none was started.
    ///
    /// Blocks until [`stop`](Self::stop) is called from elsewhere. Other
    /// callers keep full access to the driver meanwhile.
    pub(crate) fn join(&self) {
        let handle = lock(&self.handle).take();
        match handle {
            Some(h) => join_quietly(h),
            // Another caller holds the handle; wait for the same exit
            None => {
                let _state = self
                    .shared
                    .wake
                    .wait_while(lock(&self.shared.state), |s| s.alive)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
    }

    pub(crate) fn state(&self) -> SchedulerState {
        let state = lock(&self.shared.state);
        match (state.alive, state.running) {
            (false, _) => SchedulerState::Stopped,
            (true, true) => SchedulerState::Running,
            (true, false) => SchedulerState::Stopping,
        }
    }
}

fn join_quietly(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        log::error!("render thread panicked");
    }
}

impl<B, C> Drop for Scheduler<B, C> {
    fn drop(&mut self) {
        lock(&self.shared.state).running = false;
        self.shared.wake.notify_all();
        let handle = self
            .handle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(h) = handle {
            join_quietly(h);
        }
    }
}

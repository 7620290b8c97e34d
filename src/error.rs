//! Error type shared by the driver, the text engine and the configuration.
//!
//! Configuration errors are reported at the call site and leave the previous
//! state untouched. Transport errors are only surfaced during construction;
//! once the scheduler runs, bus failures are logged and healed by the
//! periodic reconfiguration.

use crate::traits::BusError;

/// Errors returned by the display driver API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayError {
    /// Row index outside the panel grid.
    InvalidRow {
        /// Requested row.
        row: usize,
        /// Number of rows in the grid.
        rows: usize,
    },
    /// Panel column outside the panel grid.
    InvalidColumn {
        /// Requested column.
        col: usize,
        /// Number of columns in the grid.
        cols: usize,
    },
    /// Intensity above the 0-15 register range.
    InvalidIntensity(u8),
    /// Slowdown factor of zero.
    InvalidSlowdownFactor(u32),
    /// Finite time-to-live of zero ticks.
    InvalidTtl,
    /// Zero tick period.
    InvalidDelay,
    /// Grid with no panels, too many rows, or a chain longer than supported.
    InvalidGrid {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },
    /// Periodic reconfiguration interval of zero ticks.
    InvalidRefreshInterval,
    /// Text longer than a layer can hold.
    TextTooLong {
        /// Length of the rejected text in characters.
        len: usize,
        /// Maximum supported length.
        max: usize,
    },
    /// Bus failure while configuring the chain.
    Transport(BusError),
    /// The scheduler thread could not be spawned.
    Spawn(std::io::ErrorKind),
    /// Operation not allowed while the scheduler thread is running.
    SchedulerRunning,
}

impl From<BusError> for DisplayError {
    fn from(e: BusError) -> Self {
        Self::Transport(e)
    }
}

impl std::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRow { row, rows } => {
                write!(f, "row {} out of range (grid has {} rows)", row, rows)
            }
            Self::InvalidColumn { col, cols } => {
                write!(f, "column {} out of range (grid has {} columns)", col, cols)
            }
            Self::InvalidIntensity(v) => write!(f, "intensity {} out of range 0-15", v),
            Self::InvalidSlowdownFactor(k) => write!(f, "slowdown factor {} must be >= 1", k),
            Self::InvalidTtl => write!(f, "time-to-live must be at least one tick"),
            Self::InvalidDelay => write!(f, "tick delay must be non-zero"),
            Self::InvalidGrid { rows, cols } => write!(f, "unsupported panel grid {}x{}", rows, cols),
            Self::InvalidRefreshInterval => write!(f, "refresh interval must be non-zero"),
            Self::TextTooLong { len, max } => {
                write!(f, "text of {} characters exceeds {} characters", len, max)
            }
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Spawn(kind) => write!(f, "failed to spawn render thread: {}", kind),
            Self::SchedulerRunning => write!(f, "render scheduler is running"),
        }
    }
}

impl std::error::Error for DisplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

//! Command surface consumed by shells and message handlers.
//!
//! A [`DisplayCommand`] is what an outside layer (an interactive shell, a
//! mesh-radio message handler, a JSON API) asks the display to do. Commands
//! can be built directly, parsed from a shell line, or converted from the
//! JSON request types in [`messages`](crate::messages).
//!
//! # Shell syntax
//!
//! | Line | Command |
//! |------|---------|
//! | `led [row] text...` | [`DisplayCommand::SetText`] with no time limit |
//! | `ledttl <row> <ticks> text...` | [`DisplayCommand::SetText`] expiring after `ticks` |
//! | `ledsf <row> <k>` | [`DisplayCommand::SetSlowdown`] |
//! | `leddelay <ms>` | [`DisplayCommand::SetDelay`] |
//! | `ledbright <level>` | [`DisplayCommand::SetIntensity`] |
//! | `ledclear` | [`DisplayCommand::Clear`] |
//! | `ledwelcome` | [`DisplayCommand::Welcome`] |
//! | `ledstatus` | [`DisplayCommand::Status`] |
//!
//! Words after the arguments are joined with single spaces. A text of
//! exactly `""` stands for the empty string. In `led`, a leading number is
//! taken as the row only when it is below [`MAX_ROWS`] and more words follow
//! it; any other number is part of the text.
//!
//! ```rust
//! use led_marquee::{DisplayCommand, Ttl};
//!
//! let cmd: DisplayCommand = "led 1 hello   world".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     DisplayCommand::SetText { row: 1, text: "hello world".into(), ttl: Ttl::Forever }
//! );
//!
//! // A lone number is text for row 0
//! let cmd: DisplayCommand = "led 42".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     DisplayCommand::SetText { row: 0, text: "42".into(), ttl: Ttl::Forever }
//! );
//!
//! // So is a number that cannot be a row
//! let cmd: DisplayCommand = "led 2024 happy new year".parse().unwrap();
//! assert_eq!(
//!     cmd,
//!     DisplayCommand::SetText { row: 0, text: "2024 happy new year".into(), ttl: Ttl::Forever }
//! );
//! ```

use std::str::FromStr;
use std::time::Duration;

use crate::driver::{DisplayDriver, DisplayStatus};
use crate::error::DisplayError;
use crate::layer::Ttl;
use crate::protocol::MAX_ROWS;
use crate::traits::BusTransport;

// ============================================================================
// Commands
// ============================================================================

/// Request to change or query the display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayCommand {
    /// Replace the text of a row.
    SetText {
        /// Panel row.
        row: usize,
        /// New text.
        text: String,
        /// Lifetime before reverting to the welcome text.
        ttl: Ttl,
    },
    /// Change ticks per scroll step of a row.
    SetSlowdown {
        /// Panel row.
        row: usize,
        /// Ticks per step (at least 1).
        factor: u32,
    },
    /// Change the tick period, in milliseconds.
    SetDelay(u32),
    /// Change the intensity (0-15).
    SetIntensity(u8),
    /// Blank every row.
    Clear,
    /// Restore every row's welcome text.
    Welcome,
    /// Report delay, intensity and per-row state.
    Status,
}

/// Result of applying a [`DisplayCommand`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The display state was changed.
    Applied,
    /// Snapshot requested by [`DisplayCommand::Status`].
    Status(DisplayStatus),
}

impl DisplayCommand {
    /// Parses one shell line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?;
        let args: Vec<&str> = words.collect();

        match name {
            "led" => {
                if args.is_empty() {
                    return Err(ParseError::MissingArgument("text"));
                }
                let (row, text) = match args.split_first() {
                    Some((first, rest)) if !rest.is_empty() => match first.parse::<usize>() {
                        Ok(row) if row < MAX_ROWS => (row, rest),
                        _ => (0, args.as_slice()),
                    },
                    _ => (0, args.as_slice()),
                };
                Ok(Self::SetText {
                    row,
                    text: join_text(text),
                    ttl: Ttl::Forever,
                })
            }
            "ledttl" => {
                let row = number(&args, 0, "row")?;
                let ticks = number(&args, 1, "ticks")?;
                let text = args.get(2..).unwrap_or_default();
                if text.is_empty() {
                    return Err(ParseError::MissingArgument("text"));
                }
                Ok(Self::SetText {
                    row,
                    text: join_text(text),
                    ttl: Ttl::Ticks(ticks),
                })
            }
            "ledsf" => Ok(Self::SetSlowdown {
                row: number(&args, 0, "row")?,
                factor: number(&args, 1, "factor")?,
            }),
            "leddelay" => Ok(Self::SetDelay(number(&args, 0, "ms")?)),
            "ledbright" => Ok(Self::SetIntensity(number(&args, 0, "level")?)),
            "ledclear" => Ok(Self::Clear),
            "ledwelcome" => Ok(Self::Welcome),
            "ledstatus" => Ok(Self::Status),
            other => Err(ParseError::UnknownCommand(other.to_owned())),
        }
    }

    /// Applies the command to a text driver.
    ///
    /// Invalid arguments are rejected by the driver and leave it unchanged.
    pub fn apply<B: BusTransport + 'static>(
        &self,
        driver: &DisplayDriver<B>,
    ) -> Result<CommandOutcome, DisplayError> {
        match self {
            Self::SetText { row, text, ttl } => driver.set_text_with_ttl(*row, text, *ttl)?,
            Self::SetSlowdown { row, factor } => driver.set_slowdown_factor(*row, *factor)?,
            Self::SetDelay(ms) => driver.set_delay(Duration::from_millis(u64::from(*ms)))?,
            Self::SetIntensity(level) => driver.set_intensity(*level)?,
            Self::Clear => driver.clear(),
            Self::Welcome => driver.set_welcome_text(),
            Self::Status => return Ok(CommandOutcome::Status(driver.status())),
        }
        Ok(CommandOutcome::Applied)
    }
}

impl FromStr for DisplayCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn join_text(words: &[&str]) -> String {
    let text = words.join(" ");
    if text == "\"\"" {
        String::new()
    } else {
        text
    }
}

fn number<T: FromStr>(args: &[&str], index: usize, name: &'static str) -> Result<T, ParseError> {
    let raw = args.get(index).ok_or(ParseError::MissingArgument(name))?;
    raw.parse().map_err(|_| ParseError::InvalidNumber {
        name,
        value: (*raw).to_owned(),
    })
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Why a shell line could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Blank line.
    Empty,
    /// First word is not a display command.
    UnknownCommand(String),
    /// A required argument is absent.
    MissingArgument(&'static str),
    /// An argument is not a valid number.
    InvalidNumber {
        /// Argument name.
        name: &'static str,
        /// Text that failed to parse.
        value: String,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::UnknownCommand(name) => write!(f, "unknown command '{}'", name),
            Self::MissingArgument(name) => write!(f, "missing argument <{}>", name),
            Self::InvalidNumber { name, value } => {
                write!(f, "invalid <{}>: '{}' is not a number", name, value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

// ============================================================================
// Tests
// ============================================================================

//! JSON request types for network-facing command handlers.
//!
//! These types use `heapless` strings and can be deserialized with
//! `serde-json-core`, so a firmware message handler needs no allocator to
//! decode them. Each converts into a [`DisplayCommand`].
//!
//! # Example
//!
//! ```
//! use led_marquee::messages::SetTextRequest;
//! use led_marquee::{DisplayCommand, Ttl};
//!
//! #[cfg(feature = "serde-json-core")]
//! {
//!     let json = br#"{"row": 1, "text": "HELLO", "ttl": 30}"#;
//!     let (req, _): (SetTextRequest, _) = serde_json_core::from_slice(json).unwrap();
//!     let cmd = DisplayCommand::from(req);
//!     assert_eq!(
//!         cmd,
//!         DisplayCommand::SetText { row: 1, text: "HELLO".into(), ttl: Ttl::Ticks(30) }
//!     );
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::commands::DisplayCommand;
use crate::layer::{Ttl, MAX_TEXT_LEN};

// ============================================================================
// Request Types
// ============================================================================

/// Request to set a row's text.
///
/// # JSON Examples
///
/// Permanent text on row 0:
/// ```json
/// {"row": 0, "text": "HELLO"}
/// ```
///
/// Text reverting to the welcome text after 250 ticks:
/// ```json
/// {"row": 2, "text": "PUMP ON", "ttl": 250}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTextRequest {
    /// Panel row
    pub row: usize,
    /// New text
    pub text: heapless::String<MAX_TEXT_LEN>,
    /// Lifetime in ticks (absent = forever)
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl SetTextRequest {
    /// Create a request for permanent text. Text beyond the capacity is dropped.
    pub fn new(row: usize, text: &str) -> Self {
        let mut s = heapless::String::new();
        for c in text.chars() {
            if s.push(c).is_err() {
                break;
            }
        }
        Self {
            row,
            text: s,
            ttl: None,
        }
    }

    /// Set the lifetime in ticks.
    pub fn with_ttl(mut self, ticks: u32) -> Self {
        self.ttl = Some(ticks);
        self
    }
}

/// Request to change a row's slowdown factor.
///
/// ```json
/// {"row": 0, "factor": 2}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSlowdownRequest {
    /// Panel row
    pub row: usize,
    /// Ticks per scroll step
    pub factor: u32,
}

/// Request to change the tick period.
///
/// ```json
/// {"delay_ms": 50}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDelayRequest {
    /// Tick period in milliseconds
    pub delay_ms: u32,
}

/// Request to change the intensity.
///
/// ```json
/// {"intensity": 4}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetIntensityRequest {
    /// Intensity (0-15)
    pub intensity: u8,
}

// ============================================================================
// Conversions
// ============================================================================

impl From<SetTextRequest> for DisplayCommand {
    fn from(req: SetTextRequest) -> Self {
        Self::SetText {
            row: req.row,
            text: req.text.as_str().to_owned(),
            ttl: Ttl::from(req.ttl),
        }
    }
}

impl From<SetSlowdownRequest> for DisplayCommand {
    fn from(req: SetSlowdownRequest) -> Self {
        Self::SetSlowdown {
            row: req.row,
            factor: req.factor,
        }
    }
}

impl From<SetDelayRequest> for DisplayCommand {
    fn from(req: SetDelayRequest) -> Self {
        Self::SetDelay(req.delay_ms)
    }
}

impl From<SetIntensityRequest> for DisplayCommand {
    fn from(req: SetIntensityRequest) -> Self {
        Self::SetIntensity(req.intensity)
    }
}

// ============================================================================
// Parsing Functions (using serde-json-core)
// ============================================================================

/// Parse a set-text request from JSON bytes.
///
/// # Example
///
/// ```
/// use led_marquee::messages::parse_text_request;
///
/// let req = parse_text_request(br#"{"row": 0, "text": "HI", "ttl": 30}"#).unwrap();
/// assert_eq!(req.text.as_str(), "HI");
/// assert_eq!(req.ttl, Some(30));
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_text_request(json: &[u8]) -> Option<SetTextRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a slowdown request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_slowdown_request(json: &[u8]) -> Option<SetSlowdownRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse a delay request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_delay_request(json: &[u8]) -> Option<SetDelayRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse an intensity request from JSON bytes.
#[cfg(feature = "serde-json-core")]
pub fn parse_intensity_request(json: &[u8]) -> Option<SetIntensityRequest> {
    serde_json_core::from_slice(json).ok().map(|(req, _)| req)
}

/// Parse any of the request types above into a command.
///
/// Tries each shape in turn, most specific first.
///
/// ```
/// use led_marquee::messages::parse_command;
/// use led_marquee::DisplayCommand;
///
/// assert_eq!(parse_command(br#"{"intensity": 4}"#), Some(DisplayCommand::SetIntensity(4)));
/// assert_eq!(parse_command(br#"{"nonsense": true}"#), None);
/// ```
#[cfg(feature = "serde-json-core")]
pub fn parse_command(json: &[u8]) -> Option<DisplayCommand> {
    parse_text_request(json)
        .map(DisplayCommand::from)
        .or_else(|| parse_slowdown_request(json).map(DisplayCommand::from))
        .or_else(|| parse_delay_request(json).map(DisplayCommand::from))
        .or_else(|| parse_intensity_request(json).map(DisplayCommand::from))
}

/// Serialize a status snapshot into a JSON string of capacity `N`.
///
/// Returns `None` when the snapshot does not fit.
#[cfg(feature = "serde-json-core")]
pub fn status_to_json<const N: usize>(
    status: &crate::driver::DisplayStatus,
) -> Option<heapless::String<N>> {
    serde_json_core::to_string(status).ok()
}

//! Display frame composition for the 16×2 character panels.
//!
//! Each tick the loop rebuilds both lines from scratch.  A sub-cycle
//! counter alternates between two views:
//!
//! ```text
//!  tick  1..=5        6..=10       11..=15  ...
//!        ┌──────────┐ ┌──────────┐ ┌──────────┐
//!        │  Live    │ │  Status  │ │  Live    │
//!        └──────────┘ └──────────┘ └──────────┘
//! ```
//!
//! | Layout        | Live view                    | Status view              |
//! |---------------|------------------------------|--------------------------|
//! | `ClockHeader` | clock / ` Current: 73.45`    | clock / ` Heat | Set: 72`|
//! | `Labelled`    | ` Humidity: ` / `45.12`      | ` Drying ` / ` Set to: 40`|

pub mod hd44780;

use core::fmt::Write;

use chrono::{DateTime, Local};

use crate::domain::{DisplayLayout, DomainProfile};
use crate::fsm::StateId;

/// Columns per panel line.
pub const COLUMNS: usize = 16;

/// One panel line, truncated to [`COLUMNS`].
pub type DisplayLine = heapless::String<COLUMNS>;

/// Which of the two alternating views a tick shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The measured value.
    Live,
    /// Current state and setpoint.
    Status,
}

impl View {
    /// View for a 1-based tick number with `subcycle` ticks per view.
    pub fn for_tick(tick: u64, subcycle: u32) -> Self {
        let subcycle = u64::from(subcycle.max(1));
        if (tick.saturating_sub(1) / subcycle) % 2 == 0 {
            Self::Live
        } else {
            Self::Status
        }
    }
}

/// Everything a frame is built from.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs {
    pub view: View,
    pub state: StateId,
    /// Latest converted reading, if any read has succeeded yet.
    pub reading: Option<f32>,
    pub setpoint: i32,
    pub now: DateTime<Local>,
}

/// A composed two-line frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayFrame {
    pub line1: DisplayLine,
    pub line2: DisplayLine,
}

impl DisplayFrame {
    /// Build the frame for `profile`'s layout.
    pub fn compose(profile: &DomainProfile, inputs: &FrameInputs) -> Self {
        match profile.layout {
            DisplayLayout::ClockHeader => {
                let line1 = fit(&inputs.now.format("%b %d  %H:%M:%S").to_string());
                let line2 = match inputs.view {
                    View::Live => fit_fmt(format_args!(" Current: {}", Reading(inputs.reading))),
                    View::Status => fit_fmt(format_args!(
                        " {} | Set: {}",
                        profile.state_title(inputs.state),
                        inputs.setpoint
                    )),
                };
                Self { line1, line2 }
            }
            DisplayLayout::Labelled => match inputs.view {
                View::Live => Self {
                    line1: fit_fmt(format_args!(" {}: ", profile.metric_label)),
                    line2: fit_fmt(format_args!("{}", Reading(inputs.reading))),
                },
                View::Status => Self {
                    line1: fit_fmt(format_args!(" {} ", profile.state_title(inputs.state))),
                    line2: fit_fmt(format_args!(" Set to: {}", inputs.setpoint)),
                },
            },
        }
    }
}

/// Reading rendered with two decimals, or dashes before the first sample.
struct Reading(Option<f32>);

impl core::fmt::Display for Reading {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => f.write_str("--.--"),
        }
    }
}

/// Truncate `s` to the panel width on a char boundary.
pub fn fit(s: &str) -> DisplayLine {
    let mut line = DisplayLine::new();
    for c in s.chars() {
        if c == '\n' || line.push(c).is_err() {
            break;
        }
    }
    line
}

fn fit_fmt(args: core::fmt::Arguments<'_>) -> DisplayLine {
    let mut buf: heapless::String<64> = heapless::String::new();
    // Overflow past 64 bytes only loses text the panel could not show anyway.
    let _ = buf.write_fmt(args);
    fit(&buf)
}

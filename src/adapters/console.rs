//! Line-oriented console input for the host binary.
//!
//! Stands in for the five push buttons.  One command per line:
//!
//! | Line       | Effect                                   |
//! |------------|------------------------------------------|
//! | `t+` `t-`  | temperature setpoint up / down           |
//! | `tc`       | cycle the temperature controller state   |
//! | `h+` `h-`  | humidity setpoint up / down              |
//! | `hc`       | cycle the humidity controller state      |
//! | `t=23.5`   | simulated sensor temperature (°C)        |
//! | `h=55`     | simulated sensor humidity (%RH)          |

use std::io::BufRead;

use log::{info, warn};

use super::sim::SimKnobs;
use crate::app::input::{InputHandler, Press};
use crate::domain::Domain;

/// One parsed console line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConsoleCommand {
    Press(Domain, Press),
    SetTemperatureC(f32),
    SetHumidityPct(f32),
}

/// Parse a console line; `None` for anything unrecognised.
pub fn parse_line(line: &str) -> Option<ConsoleCommand> {
    let line = line.trim();
    let (domain, rest) = match line.as_bytes().first()? {
        b't' | b'T' => (Domain::Temperature, &line[1..]),
        b'h' | b'H' => (Domain::Humidity, &line[1..]),
        _ => return None,
    };
    match rest {
        "+" => Some(ConsoleCommand::Press(domain, Press::Increment)),
        "-" => Some(ConsoleCommand::Press(domain, Press::Decrement)),
        "c" | "C" => Some(ConsoleCommand::Press(domain, Press::Cycle)),
        _ => {
            let value: f32 = rest.strip_prefix('=')?.trim().parse().ok()?;
            Some(match domain {
                Domain::Temperature => ConsoleCommand::SetTemperatureC(value),
                Domain::Humidity => ConsoleCommand::SetHumidityPct(value),
            })
        }
    }
}

pub struct ConsoleInput {
    temperature: InputHandler,
    humidity: InputHandler,
    knobs: Option<SimKnobs>,
}

impl ConsoleInput {
    pub fn new(temperature: InputHandler, humidity: InputHandler, knobs: Option<SimKnobs>) -> Self {
        Self {
            temperature,
            humidity,
            knobs,
        }
    }

    /// Apply one parsed command.
    pub fn apply(&self, cmd: ConsoleCommand) {
        match cmd {
            ConsoleCommand::Press(Domain::Temperature, press) => {
                self.temperature.handle(press);
            }
            ConsoleCommand::Press(Domain::Humidity, press) => {
                self.humidity.handle(press);
            }
            ConsoleCommand::SetTemperatureC(c) => match &self.knobs {
                Some(k) => k.set_temperature_c(c),
                None => warn!("CONSOLE: no simulated sensor to set"),
            },
            ConsoleCommand::SetHumidityPct(rh) => match &self.knobs {
                Some(k) => k.set_humidity_pct(rh),
                None => warn!("CONSOLE: no simulated sensor to set"),
            },
        }
    }

    /// Read lines until EOF.
    pub fn run<R: BufRead>(self, reader: R) {
        for line in reader.lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Some(cmd) => self.apply(cmd),
                None if line.trim().is_empty() => {}
                None => warn!("CONSOLE: unrecognised '{}'", line.trim()),
            }
        }
        info!("CONSOLE: input closed");
    }

    /// Read stdin on a detached thread.  The thread is left blocked in
    /// `read` at shutdown; the process exit reclaims it.
    pub fn spawn_stdin(self) -> std::io::Result<()> {
        std::thread::Builder::new()
            .name("console".into())
            .spawn(move || self.run(std::io::stdin().lock()))
            .map(drop)
    }
}

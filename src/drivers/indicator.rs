//! PWM status indicator (single LED channel).
//!
//! Three drive modes:
//!
//! | Mode      | Duty                                   |
//! |-----------|----------------------------------------|
//! | `Off`     | 0 %                                    |
//! | `Solid`   | 100 %                                  |
//! | `Pulsing` | triangular ramp 0 → 100 % → 0 over the |
//! |           | configured period, stepped per tick    |
//!
//! The ramp is recomputed from the tick number on every
//! [`refresh`](IndicatorPort::refresh), so a missed tick only skips a step.
//! The ramp only advances once per tick, so the period is stretched to at
//! least [`MIN_PULSE_TICKS`] ticks; at the default 1 s tick a pulse takes 8 s.

use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::IndicatorPort;
use crate::error::ActuatorError;
use crate::fsm::context::IndicatorMode;

/// Default breathing period (ms).
pub const PULSE_PERIOD_MS: u32 = 2_000;

/// Fewest ticks one pulse may span.
pub const MIN_PULSE_TICKS: u32 = 8;

pub struct PwmIndicator<P> {
    pwm: P,
    mode: IndicatorMode,
    period_ms: u32,
    tick_ms: u32,
}

impl<P: SetDutyCycle> PwmIndicator<P> {
    pub fn new(pwm: P, tick_ms: u32) -> Self {
        Self::with_period(pwm, tick_ms, PULSE_PERIOD_MS)
    }

    pub fn with_period(pwm: P, tick_ms: u32, period_ms: u32) -> Self {
        Self {
            pwm,
            mode: IndicatorMode::Off,
            period_ms: period_ms.max(tick_ms.saturating_mul(MIN_PULSE_TICKS)).max(2),
            tick_ms,
        }
    }

    pub fn mode(&self) -> IndicatorMode {
        self.mode
    }

    fn write(&mut self, brightness: u8) -> Result<(), ActuatorError> {
        self.pwm
            .set_duty_cycle_fraction(u16::from(brightness), 255)
            .map_err(|_| ActuatorError::PwmWriteFailed)
    }
}

impl<P: SetDutyCycle> IndicatorPort for PwmIndicator<P> {
    fn set_mode(&mut self, mode: IndicatorMode) -> Result<(), ActuatorError> {
        match mode {
            IndicatorMode::Off => self.write(0)?,
            IndicatorMode::Solid => self.write(255)?,
            // Start each pulse from dark.
            IndicatorMode::Pulsing => self.write(0)?,
        }
        self.mode = mode;
        Ok(())
    }

    fn refresh(&mut self, tick: u64) -> Result<(), ActuatorError> {
        if self.mode != IndicatorMode::Pulsing {
            return Ok(());
        }
        let phase_ms = (tick * u64::from(self.tick_ms)) % u64::from(self.period_ms);
        self.write(triangle_brightness(phase_ms as u32, self.period_ms))
    }
}

/// Triangular brightness wave: 0 at phase 0, 255 at half period, back to 0.
pub fn triangle_brightness(phase_ms: u32, period_ms: u32) -> u8 {
    let pos = (phase_ms % period_ms) as u64;
    let half = period_ms as u64 / 2;
    if pos < half {
        ((pos * 255) / half) as u8
    } else {
        (((period_ms as u64 - pos) * 255) / half).min(255) as u8
    }
}

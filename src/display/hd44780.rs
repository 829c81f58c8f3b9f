//! HD44780 16×2 character LCD driver (4-bit parallel mode).
//!
//! Six GPIOs: RS, EN and D4–D7.  R/W is tied low, so the driver never
//! reads the busy flag and instead waits the datasheet worst case after
//! each instruction.
//!
//! ## Dual-target design
//!
//! Generic over `embedded-hal` 1.0 `OutputPin` and `DelayNs`, so the same
//! driver runs against real GPIO or against recording pins in tests.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::debug;

use super::COLUMNS;
use crate::app::ports::DisplayPort;
use crate::error::DisplayError;

// ── Instruction set ───────────────────────────────────────────

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_DISPLAY_OFF: u8 = 0x08;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of the first column of each line.
const LINE_ADDR: [u8; 2] = [0x00, 0x40];

/// Execution time of ordinary instructions (µs).
const INSTR_DELAY_US: u32 = 50;
/// Execution time of clear/home (µs).
const CLEAR_DELAY_US: u32 = 2_000;

pub struct Hd44780<P, D> {
    rs: P,
    en: P,
    data: [P; 4],
    delay: D,
    torn_down: bool,
}

impl<P: OutputPin, D: DelayNs> Hd44780<P, D> {
    /// Take the pins and run the 4-bit initialisation sequence.
    pub fn new(rs: P, en: P, data: [P; 4], delay: D) -> Result<Self, DisplayError> {
        let mut lcd = Self {
            rs,
            en,
            data,
            delay,
            torn_down: false,
        };
        lcd.init()?;
        Ok(lcd)
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        self.delay.delay_ms(50);
        pin(self.rs.set_low())?;
        pin(self.en.set_low())?;

        // Force 8-bit mode three times, then switch to 4-bit.
        self.write_nibble(0x03)?;
        self.delay.delay_us(4_500);
        self.write_nibble(0x03)?;
        self.delay.delay_us(150);
        self.write_nibble(0x03)?;
        self.delay.delay_us(150);
        self.write_nibble(0x02)?;
        self.delay.delay_us(INSTR_DELAY_US);

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.command(CMD_ENTRY_MODE_INC)?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_us(CLEAR_DELAY_US);
        debug!("HD44780: initialised");
        Ok(())
    }

    fn command(&mut self, byte: u8) -> Result<(), DisplayError> {
        pin(self.rs.set_low())?;
        self.write_byte(byte)
    }

    fn data_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        pin(self.rs.set_high())?;
        self.write_byte(byte)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.write_nibble(byte >> 4)?;
        self.write_nibble(byte & 0x0F)?;
        self.delay.delay_us(INSTR_DELAY_US);
        Ok(())
    }

    fn write_nibble(&mut self, nibble: u8) -> Result<(), DisplayError> {
        for (bit, line) in self.data.iter_mut().enumerate() {
            pin(line.set_state(((nibble >> bit) & 1 == 1).into()))?;
        }
        pin(self.en.set_high())?;
        self.delay.delay_us(1);
        pin(self.en.set_low())?;
        self.delay.delay_us(1);
        Ok(())
    }

    fn write_line(&mut self, row: usize, text: &str) -> Result<(), DisplayError> {
        self.command(CMD_SET_DDRAM | LINE_ADDR[row])?;
        let mut written = 0;
        for b in text.bytes().take(COLUMNS) {
            // The CGROM only covers ASCII reliably.
            self.data_byte(if b.is_ascii() { b } else { b'?' })?;
            written += 1;
        }
        // Pad instead of clearing to avoid flicker.
        for _ in written..COLUMNS {
            self.data_byte(b' ')?;
        }
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), DisplayError> {
        if self.torn_down {
            Err(DisplayError::TornDown)
        } else {
            Ok(())
        }
    }
}

impl<P: OutputPin, D: DelayNs> DisplayPort for Hd44780<P, D> {
    fn render(&mut self, line1: &str, line2: &str) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.write_line(0, line1)?;
        self.write_line(1, line2)
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_us(CLEAR_DELAY_US);
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), DisplayError> {
        self.ensure_live()?;
        self.command(CMD_CLEAR)?;
        self.delay.delay_us(CLEAR_DELAY_US);
        self.command(CMD_DISPLAY_OFF)?;
        pin(self.rs.set_low())?;
        pin(self.en.set_low())?;
        for line in &mut self.data {
            pin(line.set_low())?;
        }
        self.torn_down = true;
        debug!("HD44780: released");
        Ok(())
    }
}

fn pin<E>(r: Result<(), E>) -> Result<(), DisplayError> {
    r.map_err(|_| DisplayError::PinWriteFailed)
}

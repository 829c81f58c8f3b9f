//! Domain profiles: what distinguishes the temperature controller from the
//! humidity controller.
//!
//! Both run the same FSM and loop; a profile only supplies names, labels,
//! unit conversion and the display layout.

use crate::fsm::StateId;

/// Which physical quantity a profile reads from the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Sensor reports °C.
    TemperatureC,
    /// Sensor reports %RH.
    RelativeHumidity,
}

/// How the two display lines are arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayLayout {
    /// Wall clock on line 1; line 2 alternates reading and status.
    ClockHeader,
    /// Both lines alternate between a labelled reading and a status view.
    Labelled,
}

/// Static description of one controlled quantity.
#[derive(Debug)]
pub struct DomainProfile {
    /// Short name used in logs and thread names.
    pub name: &'static str,
    /// Serial/telemetry id for each state, indexed by `StateId as usize`.
    pub state_ids: [&'static str; StateId::COUNT],
    /// Capitalised state names for the display status view.
    pub state_titles: [&'static str; StateId::COUNT],
    /// Label for the measured value in serial frames.
    pub metric_label: &'static str,
    /// Label for the target in serial frames (`Target <label>`).
    pub target_label: &'static str,
    pub quantity: Quantity,
    pub layout: DisplayLayout,
}

impl DomainProfile {
    /// Convert a raw sensor value into the controlled unit.
    pub fn convert(&self, raw: f32) -> f32 {
        match self.quantity {
            Quantity::TemperatureC => raw * 9.0 / 5.0 + 32.0,
            Quantity::RelativeHumidity => raw,
        }
    }

    pub fn state_id(&self, state: StateId) -> &'static str {
        self.state_ids[state as usize]
    }

    pub fn state_title(&self, state: StateId) -> &'static str {
        self.state_titles[state as usize]
    }
}

pub static TEMPERATURE: DomainProfile = DomainProfile {
    name: "temperature",
    state_ids: ["off", "heat", "cool"],
    state_titles: ["Off", "Heat", "Cool"],
    metric_label: "Current Temp",
    target_label: "Temp",
    quantity: Quantity::TemperatureC,
    layout: DisplayLayout::ClockHeader,
};

pub static HUMIDITY: DomainProfile = DomainProfile {
    name: "humidity",
    state_ids: ["off", "drying", "humidifying"],
    state_titles: ["Off", "Drying", "Humidifying"],
    metric_label: "Humidity",
    target_label: "Hum",
    quantity: Quantity::RelativeHumidity,
    layout: DisplayLayout::Labelled,
};

/// The two controlled quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Temperature,
    Humidity,
}

impl Domain {
    pub fn profile(self) -> &'static DomainProfile {
        match self {
            Self::Temperature => &TEMPERATURE,
            Self::Humidity => &HUMIDITY,
        }
    }
}

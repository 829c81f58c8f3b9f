//! PlantSitter controller library.
//!
//! Two independent setpoint controllers (temperature and humidity) share
//! one sensor and one serial port.  The pure-logic modules are exposed for
//! integration testing; hardware comes in through the port traits in
//! [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod display;
pub mod domain;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod setpoint;
pub mod telemetry;

//! Application core: controllers, loops and their supervision.
//!
//! This module holds the behaviour of the PlantSitter: the per-domain
//! [`controller::Controller`], the fixed-period [`control_loop::ControlLoop`]
//! that drives it, button [`input`] handling, and the [`supervisor`] that
//! runs everything on threads and stops it again.  All interaction with
//! hardware happens through **port traits** defined in [`ports`], keeping
//! this layer testable without real peripherals.

pub mod commands;
pub mod control_loop;
pub mod controller;
pub mod events;
pub mod input;
pub mod ports;
pub mod stop;
pub mod supervisor;

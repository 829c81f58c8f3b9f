//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                   |
//! |----------------|--------------------|-------------------------------|
//! | `clock`        | Clock              | host wall clock (chrono)      |
//! | `console`      | (none)             | stdin lines → InputHandlers   |
//! | `log_sink`     | EventSink          | `log` facade                  |
//! | `memory_store` | StoreConnector     | in-process time-series store  |
//! | `serial`       | Transport          | any `io::Write` (stdout)      |
//! | `shared`       | (none)             | mutex guard for shared ports  |
//! | `signal`       | (none)             | SIGINT / SIGTERM              |
//! | `sim`          | SensorPort         | atomics-backed fake sensor    |
//! |                | IndicatorPort      | log output                    |
//! |                | DisplayPort        | log output                    |
//!
//! Real peripherals live in [`crate::drivers`] and [`crate::display`].

pub mod clock;
pub mod console;
pub mod log_sink;
pub mod memory_store;
pub mod serial;
pub mod shared;
pub mod signal;
pub mod sim;

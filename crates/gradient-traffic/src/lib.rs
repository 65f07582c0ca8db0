//! gradient-traffic — traffic-split computation and application.
//!
//! # Components
//!
//! - **`split`** — pure allocation logic (promote splits, rollback pins)
//! - **`controller`** — applies allocations with a single remote write

pub mod controller;
pub mod error;
pub mod split;

pub use controller::TrafficController;
pub use error::{TrafficError, TrafficResult};

pub mod analysis;
pub mod builtin;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod factory;
pub mod indicators;
pub mod instrument;
pub mod population;
pub mod progress;
pub mod report;
pub mod results;
pub mod runner;
// cmd and reports are modules of the binary crate (main.rs).

pub use controller::Controller;
pub use error::{ControllerError, ControllerResult};

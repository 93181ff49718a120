//! Shared CLI argument types

mod common;
mod controller;
mod global;

pub use common::OutputFormat;
pub use controller::ControllerArgs;
pub use global::GlobalOptions;

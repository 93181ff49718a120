//! Display models for CLI output
//!
//! Rows that turn controller models and cache state into table-friendly
//! records.

pub mod display;

pub use display::{
    AlarmDisplay, CacheEntryDisplay, ClientDisplay, DeviceDisplay, HealthDisplay, LinkDisplay,
};

//! Display model implementations for table and JSON output

mod alarm;
mod cache;
mod common;
mod device;
mod health;
mod station;

pub use alarm::AlarmDisplay;
pub use cache::CacheEntryDisplay;
pub use device::{DeviceDisplay, LinkDisplay};
pub use health::HealthDisplay;
pub use station::ClientDisplay;

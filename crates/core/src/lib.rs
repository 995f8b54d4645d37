//! Domain model for the axewatch Bitaxe notifier.
//!
//! - [`types`]: device configuration, status readings and tracked state.
//! - [`difficulty`]: the [`Difficulty`] value type and its SI-suffix parser.
//! - [`tracker`]: pure per-device event detection ([`tracker::evaluate`]).
//! - [`notification`]: subject/body rendering for detected events.

pub mod difficulty;
pub mod error;
pub mod notification;
pub mod tracker;
pub mod types;

pub use difficulty::Difficulty;
pub use error::CoreError;
pub use notification::Notification;
pub use tracker::{evaluate, DeviceEvent, NotifyConfig};
pub use types::{DeviceConfig, DeviceState, StatusReading};

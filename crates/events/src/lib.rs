//! Outbound notification delivery for axewatch.
//!
//! - [`Notifier`]: the seam the poll loop sends through.
//! - [`delivery`]: concrete channels (SMTP email).

pub mod delivery;
pub mod notifier;

pub use delivery::email::{EmailConfig, EmailDelivery, SendError};
pub use notifier::Notifier;

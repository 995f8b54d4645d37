//! External delivery channels for device notifications.

pub mod email;

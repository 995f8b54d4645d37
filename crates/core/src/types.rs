//! Device configuration, per-poll status readings and tracked state.

use crate::difficulty::Difficulty;

/// A configured Bitaxe. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// 1-based position in the configuration (`BITAXE_<N>_*`).
    pub index: usize,
    /// Host or `host:port` of the device's web interface.
    pub ip: String,
    /// Human-readable name used in logs and email subjects.
    pub name: String,
}

impl DeviceConfig {
    pub fn new(index: usize, ip: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            ip: ip.into(),
            name: name.into(),
        }
    }

    /// Name used when `BITAXE_<N>_NAME` is not set.
    pub fn default_name(index: usize) -> String {
        format!("Bitaxe {index}")
    }

    /// URL of the AxeOS system info endpoint.
    pub fn status_url(&self) -> String {
        format!("http://{}/api/system/info", self.ip)
    }

    /// `"<name> (<ip>)"`, used to label errors.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.ip)
    }
}

/// One status snapshot fetched from a device.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReading {
    /// ASIC temperature in degrees Celsius.
    pub temperature: f64,
    pub is_overheating: bool,
    pub best_difficulty: Difficulty,
    pub session_best_difficulty: Difficulty,
}

/// What the tracker remembers about a device between polls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    /// Whether the device was overheating at the last reading. Tracked even
    /// when overheat notifications are disabled.
    pub in_overheat: bool,
    /// Highest all-time best difficulty observed. Never decreases.
    pub best_difficulty_seen: Difficulty,
    /// Mirrors the device's session counter, including resets.
    pub session_best_difficulty_seen: Difficulty,
}

impl DeviceState {
    /// State seeded from a device's first successful reading.
    ///
    /// Everything already on the device is adopted silently, including an
    /// overheat in progress. Only later transitions are reported.
    pub fn baseline(reading: &StatusReading) -> Self {
        Self {
            in_overheat: reading.is_overheating,
            best_difficulty_seen: reading.best_difficulty,
            session_best_difficulty_seen: reading.session_best_difficulty,
        }
    }
}

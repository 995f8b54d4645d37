//! Per-device event detection.
//!
//! [`evaluate`] compares a fresh [`StatusReading`] against the
//! [`DeviceState`] remembered from earlier polls and returns the updated
//! state together with the events worth notifying about. It performs no
//! I/O, so the poll loop owns all state and this module stays trivially
//! testable.

use crate::difficulty::Difficulty;
use crate::types::{DeviceState, StatusReading};

/// Which notification categories are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyConfig {
    pub on_overheat: bool,
    pub on_new_best: bool,
    pub on_new_session_best: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            on_overheat: true,
            on_new_best: true,
            on_new_session_best: true,
        }
    }
}

/// A condition that transitioned into "notify" state.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The device entered overheat mode.
    Overheat { temperature: f64 },
    /// A new all-time best difficulty.
    NewBestDifficulty {
        previous: Difficulty,
        current: Difficulty,
    },
    /// A new best difficulty for the current device session.
    NewSessionBest {
        previous: Difficulty,
        current: Difficulty,
    },
}

impl DeviceEvent {
    /// Stable identifier for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceEvent::Overheat { .. } => "overheat",
            DeviceEvent::NewBestDifficulty { .. } => "new_best_difficulty",
            DeviceEvent::NewSessionBest { .. } => "new_session_best",
        }
    }
}

/// Evaluate one reading against the remembered state.
///
/// State is always updated to mirror the device; `config` only decides
/// whether a transition is reported.
pub fn evaluate(
    state: &DeviceState,
    reading: &StatusReading,
    config: &NotifyConfig,
) -> (DeviceState, Vec<DeviceEvent>) {
    let mut next = state.clone();
    let mut events = Vec::new();

    // Overheat fires on entry and rearms once the device cools down.
    if reading.is_overheating {
        if !state.in_overheat && config.on_overheat {
            events.push(DeviceEvent::Overheat {
                temperature: reading.temperature,
            });
        }
        next.in_overheat = true;
    } else {
        next.in_overheat = false;
    }

    if reading.best_difficulty > state.best_difficulty_seen {
        if config.on_new_best {
            events.push(DeviceEvent::NewBestDifficulty {
                previous: state.best_difficulty_seen,
                current: reading.best_difficulty,
            });
        }
        next.best_difficulty_seen = reading.best_difficulty;
    }

    // A lower session value means the device restarted its session.
    if reading.session_best_difficulty > state.session_best_difficulty_seen {
        if config.on_new_session_best {
            events.push(DeviceEvent::NewSessionBest {
                previous: state.session_best_difficulty_seen,
                current: reading.session_best_difficulty,
            });
        }
        next.session_best_difficulty_seen = reading.session_best_difficulty;
    } else if reading.session_best_difficulty < state.session_best_difficulty_seen {
        next.session_best_difficulty_seen = reading.session_best_difficulty;
    }

    (next, events)
}

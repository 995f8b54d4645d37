//! Plain-text email content for detected device events.

use chrono::{DateTime, Utc};

use crate::tracker::DeviceEvent;
use crate::types::DeviceConfig;

/// A rendered notification, ready to hand to a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Render the subject and body for `event` on `device`.
    pub fn for_event(
        device: &DeviceConfig,
        event: &DeviceEvent,
        detected_at: DateTime<Utc>,
    ) -> Self {
        let name = &device.name;
        let (subject, summary) = match event {
            DeviceEvent::Overheat { temperature } => (
                format!("{name}: Overheated"),
                format!("Overheat mode is active on {name} (temperature {temperature:.1}°C)."),
            ),
            DeviceEvent::NewBestDifficulty { previous, current } => (
                format!("{name}: New Best Difficulty"),
                format!("{name} achieved {current} all-time best (previous {previous})."),
            ),
            DeviceEvent::NewSessionBest { previous, current } => (
                format!("{name}: New Best Session Difficulty"),
                format!("{name} achieved {current} since system boot (previous {previous})."),
            ),
        };

        let body = format!(
            "{summary}\n\nDevice: {}\nDetected: {}",
            device.ip,
            detected_at.to_rfc3339()
        );

        Self { subject, body }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::difficulty::Difficulty;

    fn device() -> DeviceConfig {
        DeviceConfig::new(1, "10.0.0.7", "Shed Axe")
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn overheat_subject_names_device() {
        let n = Notification::for_event(&device(), &DeviceEvent::Overheat { temperature: 96.4 }, at());
        assert_eq!(n.subject, "Shed Axe: Overheated");
        assert!(n.body.starts_with("Overheat mode is active on Shed Axe (temperature 96.4°C)."));
        assert!(n.body.contains("Device: 10.0.0.7"));
        assert!(n.body.contains("Detected: 2024-05-01T12:30:00+00:00"));
    }

    #[test]
    fn best_difficulty_body_shows_old_and_new() {
        let event = DeviceEvent::NewBestDifficulty {
            previous: Difficulty::new(1_500_000),
            current: Difficulty::new(4_290_000_000),
        };
        let n = Notification::for_event(&device(), &event, at());
        assert_eq!(n.subject, "Shed Axe: New Best Difficulty");
        assert!(n
            .body
            .starts_with("Shed Axe achieved 4.29G all-time best (previous 1.50M)."));
    }

    #[test]
    fn session_best_body_mentions_boot() {
        let event = DeviceEvent::NewSessionBest {
            previous: Difficulty::new(50),
            current: Difficulty::new(80),
        };
        let n = Notification::for_event(&device(), &event, at());
        assert_eq!(n.subject, "Shed Axe: New Best Session Difficulty");
        assert!(n.body.starts_with("Shed Axe achieved 80 since system boot (previous 50)."));
    }
}

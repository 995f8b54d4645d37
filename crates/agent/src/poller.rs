//! The poll loop.
//!
//! [`Poller`] owns every piece of mutable state in the agent: the
//! per-device [`DeviceState`] map. Each cycle visits devices in
//! configuration order, fetches a reading, runs it through
//! [`axewatch_core::evaluate`] and sends one notification per emitted
//! event. Failures are logged and confined to the device (fetch) or the
//! single message (send) they belong to.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use axewatch_core::{evaluate, DeviceConfig, DeviceEvent, DeviceState, Notification, NotifyConfig};
use axewatch_events::Notifier;

use crate::client::StatusSource;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Sleeping until the next tick.
    Idle,
    /// Fetching and evaluating device status.
    Polling,
    /// Sending notifications for a device's events.
    Notifying,
}

/// Outcome counts for one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub devices_polled: usize,
    pub devices_failed: usize,
    pub events: usize,
    pub notifications_sent: usize,
    pub notifications_failed: usize,
}

/// Drives polling, event detection and notification for all devices.
pub struct Poller<S, N> {
    source: S,
    notifier: N,
    devices: Vec<DeviceConfig>,
    /// Keyed by device address. A device has no entry until its first
    /// successful reading.
    states: HashMap<String, DeviceState>,
    notify: NotifyConfig,
    recipient: String,
    interval: Duration,
    phase: PollPhase,
}

impl<S, N> Poller<S, N>
where
    S: StatusSource,
    N: Notifier,
{
    pub fn new(
        source: S,
        notifier: N,
        devices: Vec<DeviceConfig>,
        notify: NotifyConfig,
        recipient: impl Into<String>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            devices,
            states: HashMap::new(),
            notify,
            recipient: recipient.into(),
            interval,
            phase: PollPhase::Idle,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    /// Tracked state for the device at `ip`, if it has been read yet.
    pub fn state_for(&self, ip: &str) -> Option<&DeviceState> {
        self.states.get(ip)
    }

    /// Run cycles until `cancel` fires.
    ///
    /// The first cycle starts immediately. Cancellation is honoured both
    /// while sleeping and mid-cycle; an abandoned cycle never leaves a
    /// device half-updated because each device's state is replaced in a
    /// single assignment.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Shutdown requested, abandoning in-flight poll cycle");
                    break;
                }
                report = self.poll_cycle() => {
                    tracing::debug!(?report, "Poll cycle complete");
                }
            }
        }

        self.phase = PollPhase::Idle;
        tracing::info!("Poll loop stopped");
    }

    /// Poll every device once.
    pub async fn poll_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        for idx in 0..self.devices.len() {
            self.phase = PollPhase::Polling;
            let device = &self.devices[idx];

            let reading = match self.source.fetch_status(device).await {
                Ok(reading) => reading,
                Err(e) => {
                    tracing::warn!(
                        device = %device.name,
                        error = %e,
                        "Failed to get system info, will retry next interval"
                    );
                    report.devices_failed += 1;
                    continue;
                }
            };
            report.devices_polled += 1;

            tracing::debug!(
                device = %device.name,
                temperature = reading.temperature,
                overheat = reading.is_overheating,
                best = %reading.best_difficulty,
                session_best = %reading.session_best_difficulty,
                "Status reading"
            );

            let previous = match self.states.get(&device.ip) {
                Some(state) => state.clone(),
                None => {
                    tracing::info!(
                        device = %device.name,
                        best = %reading.best_difficulty,
                        session_best = %reading.session_best_difficulty,
                        "Initial difficulty baseline"
                    );
                    DeviceState::baseline(&reading)
                }
            };

            let (next, events) = evaluate(&previous, &reading, &self.notify);
            log_transitions(device, &previous, &next);
            self.states.insert(device.ip.clone(), next);

            report.events += events.len();
            if events.is_empty() {
                continue;
            }

            self.phase = PollPhase::Notifying;
            for event in &events {
                log_event(device, event);
                let notification = Notification::for_event(device, event, Utc::now());
                match self
                    .notifier
                    .send_notification(&notification.subject, &notification.body, &self.recipient)
                    .await
                {
                    Ok(()) => report.notifications_sent += 1,
                    Err(e) => {
                        report.notifications_failed += 1;
                        if e.is_rejection() {
                            tracing::error!(
                                device = %device.name,
                                event = event.kind(),
                                error = %e,
                                "Failed to send email: SMTP user or app password not accepted"
                            );
                        } else {
                            tracing::error!(
                                device = %device.name,
                                event = event.kind(),
                                error = %e,
                                "Failed to send email"
                            );
                        }
                    }
                }
            }
        }

        self.phase = PollPhase::Idle;
        report
    }
}

fn log_event(device: &DeviceConfig, event: &DeviceEvent) {
    match event {
        DeviceEvent::Overheat { temperature } => {
            tracing::warn!(device = %device.name, temperature, "Overheat mode activated");
        }
        DeviceEvent::NewBestDifficulty { previous, current } => {
            tracing::info!(
                device = %device.name,
                previous = %previous,
                current = %current,
                "New best difficulty"
            );
        }
        DeviceEvent::NewSessionBest { previous, current } => {
            tracing::info!(
                device = %device.name,
                previous = %previous,
                current = %current,
                "New best session difficulty"
            );
        }
    }
}

/// Log state changes that do not produce events.
fn log_transitions(device: &DeviceConfig, previous: &DeviceState, next: &DeviceState) {
    if previous.in_overheat && !next.in_overheat {
        tracing::info!(device = %device.name, "Overheat mode deactivated");
    }
    if next.session_best_difficulty_seen < previous.session_best_difficulty_seen {
        tracing::info!(
            device = %device.name,
            previous = %previous.session_best_difficulty_seen,
            current = %next.session_best_difficulty_seen,
            "Session best difficulty reset"
        );
    }
}

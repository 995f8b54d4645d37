//! HTTP client for the AxeOS status endpoint.
//!
//! [`DeviceClient`] issues one bounded-timeout `GET /api/system/info` per
//! call and maps the firmware's JSON into a [`StatusReading`]. It never
//! retries; the poll loop simply tries again next cycle.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use axewatch_core::{DeviceConfig, Difficulty, StatusReading};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Why a status fetch failed. Every variant names the device.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Nothing answered at the configured address.
    #[error("{device}: connection refused, please check the IP address: {source}")]
    Connect {
        device: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{device}: request timed out after {timeout_secs}s")]
    Timeout { device: String, timeout_secs: u64 },

    /// Any other transport failure.
    #[error("{device}: HTTP request failed: {source}")]
    Request {
        device: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{device}: device returned HTTP {status}")]
    HttpStatus { device: String, status: u16 },

    /// The response was not the JSON we expect.
    #[error("{device}: malformed status response: {reason}")]
    Malformed { device: String, reason: String },
}

impl FetchError {
    /// Label of the device the fetch was for.
    pub fn device(&self) -> &str {
        match self {
            FetchError::Connect { device, .. }
            | FetchError::Timeout { device, .. }
            | FetchError::Request { device, .. }
            | FetchError::HttpStatus { device, .. }
            | FetchError::Malformed { device, .. } => device,
        }
    }
}

// ---------------------------------------------------------------------------
// StatusSource
// ---------------------------------------------------------------------------

/// Anything that can produce a fresh status reading for a device.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, device: &DeviceConfig) -> Result<StatusReading, FetchError>;
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// The subset of `/api/system/info` the notifier uses.
#[derive(Debug, Deserialize)]
struct SystemInfo {
    temp: f64,
    #[serde(deserialize_with = "flag_or_code")]
    overheat_mode: bool,
    #[serde(rename = "bestDiff")]
    best_diff: Difficulty,
    #[serde(rename = "bestSessionDiff")]
    best_session_diff: Difficulty,
}

/// Firmware versions disagree on whether `overheat_mode` is a bool or 0/1.
fn flag_or_code<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawFlag {
        Bool(bool),
        Code(i64),
    }

    Ok(match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(flag) => flag,
        RawFlag::Code(code) => code != 0,
    })
}

/// Parse a raw status body into a reading.
pub fn parse_system_info(device: &DeviceConfig, body: &str) -> Result<StatusReading, FetchError> {
    let info: SystemInfo = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        device: device.label(),
        reason: e.to_string(),
    })?;

    Ok(StatusReading {
        temperature: info.temp,
        is_overheating: info.overheat_mode,
        best_difficulty: info.best_diff,
        session_best_difficulty: info.best_session_diff,
    })
}

// ---------------------------------------------------------------------------
// DeviceClient
// ---------------------------------------------------------------------------

/// Fetches status from real devices over HTTP.
pub struct DeviceClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl DeviceClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, device: &DeviceConfig, err: reqwest::Error) -> FetchError {
        let device = device.label();
        if err.is_timeout() {
            FetchError::Timeout {
                device,
                timeout_secs: self.timeout.as_secs(),
            }
        } else if err.is_connect() {
            FetchError::Connect { device, source: err }
        } else {
            FetchError::Request { device, source: err }
        }
    }
}

#[async_trait]
impl StatusSource for DeviceClient {
    async fn fetch_status(&self, device: &DeviceConfig) -> Result<StatusReading, FetchError> {
        let url = device.status_url();
        tracing::debug!(device = %device.name, %url, "Fetching device status");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.classify(device, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                device: device.label(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.classify(device, e))?;
        parse_system_info(device, &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

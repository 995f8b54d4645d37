//! Agent configuration loaded from environment variables.
//!
//! Everything is read once at startup. Devices are declared as numbered
//! pairs (`BITAXE_1_IP`, `BITAXE_1_NAME`, `BITAXE_2_IP`, ...) and collected
//! in order until the first missing index.
//!
//! | Variable                                | Required | Default          |
//! |-----------------------------------------|----------|------------------|
//! | `BITAXE_<N>_IP`                         | N=1      | --               |
//! | `BITAXE_<N>_NAME`                       | no       | `Bitaxe <N>`     |
//! | `GMAIL_USER`                            | yes      | --               |
//! | `GMAIL_APP_PASSWORD`                    | yes      | --               |
//! | `RECIPIENT`                             | yes      | --               |
//! | `SMTP_HOST`                             | no       | `smtp.gmail.com` |
//! | `SMTP_PORT`                             | no       | `587`            |
//! | `SMTP_FROM`                             | no       | `GMAIL_USER`     |
//! | `POLLING_INTERVAL_SECONDS`              | no       | `60`             |
//! | `REQUEST_TIMEOUT_SECONDS`               | no       | `5`              |
//! | `NOTIFY_ON_OVERHEAT`                    | no       | `true`           |
//! | `NOTIFY_ON_NEW_BEST_DIFFICULTY`         | no       | `true`           |
//! | `NOTIFY_ON_NEW_BEST_SESSION_DIFFICULTY` | no       | `true`           |

use std::collections::HashSet;
use std::time::Duration;

use axewatch_core::{DeviceConfig, NotifyConfig};
use axewatch_events::EmailConfig;

/// Default seconds between poll cycles.
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;

/// Default timeout for a single device status request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

const REQUIRED_VARS: [&str; 4] = ["BITAXE_1_IP", "GMAIL_USER", "GMAIL_APP_PASSWORD", "RECIPIENT"];

/// Startup configuration errors. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Missing or empty \".env\" file. Copy \".env.example\" to \".env\" and replace the values with your own"
    )]
    MissingEnvFile,

    #[error("Missing required environment variable(s): {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {var} ('{value}'): {reason}")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("Device address {ip} is configured more than once")]
    DuplicateDevice { ip: String },
}

/// Fully validated agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Devices to poll, in configuration order. Never empty.
    pub devices: Vec<DeviceConfig>,
    pub email: EmailConfig,
    pub recipient: String,
    pub polling_interval: Duration,
    pub request_timeout: Duration,
    pub notify: NotifyConfig,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|var| get(**var).is_none())
            .map(|var| var.to_string())
            .collect();
        if missing.len() == REQUIRED_VARS.len() {
            return Err(ConfigError::MissingEnvFile);
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let devices = load_devices(&get)?;

        let user = get("GMAIL_USER").unwrap_or_default();
        let password = get("GMAIL_APP_PASSWORD").unwrap_or_default();
        let recipient = get("RECIPIENT").unwrap_or_default();

        let mut email = EmailConfig::gmail(user, password);
        if let Some(host) = get("SMTP_HOST") {
            email.smtp_host = host;
        }
        if let Some(port) = get("SMTP_PORT") {
            email.smtp_port = port.parse().map_err(|_| ConfigError::Invalid {
                var: "SMTP_PORT".into(),
                value: port.clone(),
                reason: "must be a port number".into(),
            })?;
        }
        if let Some(from) = get("SMTP_FROM") {
            email.from_address = from;
        }

        let polling_interval = positive_secs(
            "POLLING_INTERVAL_SECONDS",
            get("POLLING_INTERVAL_SECONDS"),
            DEFAULT_POLLING_INTERVAL_SECS,
        )?;
        let request_timeout = positive_secs(
            "REQUEST_TIMEOUT_SECONDS",
            get("REQUEST_TIMEOUT_SECONDS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        let notify = NotifyConfig {
            on_overheat: flag("NOTIFY_ON_OVERHEAT", get("NOTIFY_ON_OVERHEAT"))?,
            on_new_best: flag(
                "NOTIFY_ON_NEW_BEST_DIFFICULTY",
                get("NOTIFY_ON_NEW_BEST_DIFFICULTY"),
            )?,
            on_new_session_best: flag(
                "NOTIFY_ON_NEW_BEST_SESSION_DIFFICULTY",
                get("NOTIFY_ON_NEW_BEST_SESSION_DIFFICULTY"),
            )?,
        };

        Ok(Self {
            devices,
            email,
            recipient,
            polling_interval,
            request_timeout,
            notify,
        })
    }
}

/// Collect `BITAXE_<N>_IP` / `BITAXE_<N>_NAME` pairs until the first gap.
fn load_devices<G>(get: &G) -> Result<Vec<DeviceConfig>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let mut devices = Vec::new();
    let mut seen = HashSet::new();

    for index in 1.. {
        let ip_var = format!("BITAXE_{index}_IP");
        let Some(ip) = get(&ip_var) else {
            break;
        };
        validate_address(&ip_var, &ip)?;
        if !seen.insert(ip.clone()) {
            return Err(ConfigError::DuplicateDevice { ip });
        }

        let name = get(&format!("BITAXE_{index}_NAME"))
            .unwrap_or_else(|| DeviceConfig::default_name(index));
        devices.push(DeviceConfig::new(index, ip, name));
    }

    Ok(devices)
}

fn validate_address(var: &str, ip: &str) -> Result<(), ConfigError> {
    let reason = if ip.contains("://") {
        Some("must be a bare host or host:port, without a URL scheme")
    } else if ip.contains(char::is_whitespace) || ip.contains('/') {
        Some("must not contain whitespace or '/'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ConfigError::Invalid {
            var: var.to_string(),
            value: ip.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn positive_secs(var: &str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::Invalid {
            var: var.to_string(),
            value,
            reason: "must be a whole number of seconds greater than zero".into(),
        }),
    }
}

/// Parse a notification toggle. Unset means enabled.
fn flag(var: &str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(true);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var: var.to_string(),
            value,
            reason: "expected true or false".into(),
        }),
    }
}

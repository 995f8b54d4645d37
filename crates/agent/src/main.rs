//! `axewatch-agent` -- Bitaxe status notifier daemon.
//!
//! Polls every configured Bitaxe's AxeOS API on a fixed interval and
//! emails the configured recipient when a device enters overheat mode or
//! reports a new all-time or session best difficulty.
//!
//! Configuration is read from the environment (optionally via a `.env`
//! file); see [`axewatch_agent::config`] for the full variable list.
//! Exits 0 on SIGINT/SIGTERM and 1 on a configuration error.

use axewatch_agent::client::DeviceClient;
use axewatch_agent::config::AgentConfig;
use axewatch_agent::logging;
use axewatch_agent::poller::Poller;
use axewatch_events::EmailDelivery;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    logging::init();

    tracing::info!("Starting axewatch");

    let config = AgentConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    tracing::info!(
        devices = config.devices.len(),
        interval_secs = config.polling_interval.as_secs(),
        notify_on_overheat = config.notify.on_overheat,
        notify_on_new_best = config.notify.on_new_best,
        notify_on_new_session_best = config.notify.on_new_session_best,
        "Monitoring Bitaxe(s)",
    );
    for device in &config.devices {
        tracing::info!(index = device.index, name = %device.name, ip = %device.ip, "Configured device");
    }

    let client = DeviceClient::new(config.request_timeout).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build HTTP client");
        std::process::exit(1);
    });

    let mailer = EmailDelivery::new(config.email.clone());
    tracing::info!(
        smtp_host = %mailer.config().smtp_host,
        smtp_port = mailer.config().smtp_port,
        recipient = %config.recipient,
        "Email delivery configured",
    );

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
    });

    let mut poller = Poller::new(
        client,
        mailer,
        config.devices,
        config.notify,
        config.recipient,
        config.polling_interval,
    );
    poller.run(cancel).await;

    tracing::info!("Stopped by user");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), shutting down");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

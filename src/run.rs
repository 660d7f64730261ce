//! Application execution logic.
//!
//! Builds the registry from configuration, logs every rendered event and
//! runs the auto-update loop until a shutdown signal arrives.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::signal;

use mcsw::config::ValidatedConfig;
use mcsw::probe::{ProbeResult, ServerProbe};
use mcsw::protocol::{Target, TargetParseError};
use mcsw::registry::{Registry, RegistryError};
use mcsw::status::{MessageTemplates, ServerEntry, StatusEvent};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The auto-update loop could not be started.
    #[error("Failed to start auto-update: {0}")]
    AutoUpdate(#[source] RegistryError),

    /// The `ping` address does not parse.
    #[error("Invalid server address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: TargetParseError,
    },

    /// The one-shot ping reached nothing.
    #[error("{target} is offline: {reason}")]
    Offline { target: String, reason: String },
}

/// Runs the watcher until Ctrl+C / SIGTERM.
///
/// # Errors
///
/// Returns an error if the auto-update loop cannot start.
///
/// Excluded from coverage - requires signal handling.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig) -> Result<(), RunError> {
    let registry = build_registry(&config);
    let messages = Arc::new(config.messages);
    registry.subscribe(move |entry, events| log_events(entry, events, messages.as_ref()));

    tracing::info!(
        "Watching {} server(s), updating every {}s",
        registry.entries().len(),
        config.interval.as_secs()
    );
    registry
        .start_auto_update(config.interval)
        .await
        .map_err(RunError::AutoUpdate)?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping...");
    registry.stop_auto_update().await;
    Ok(())
}

/// Probes one server once and prints the outcome.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server is offline.
pub async fn ping_once(address: &str, timeout: Duration) -> Result<(), RunError> {
    let target: Target = address
        .parse()
        .map_err(|source| RunError::InvalidAddress {
            address: address.to_string(),
            source,
        })?;

    let probe = ServerProbe::new(target.clone());
    let result = probe.probe(timeout).await;
    if !result.succeeded() {
        return Err(RunError::Offline {
            target: target.to_string(),
            reason: result.to_string(),
        });
    }

    println!("{}", describe_result(&target, &result));
    Ok(())
}

/// Creates the registry and one entry per configured server.
fn build_registry(config: &ValidatedConfig) -> Registry {
    let registry = Registry::with_settings(config.registry);
    for server in &config.servers {
        registry.add_entry_with(
            server.target.host(),
            server.target.port(),
            server.force_new,
            server.label.clone(),
            server.notify,
        );
    }
    registry
}

fn log_events(entry: &ServerEntry, events: &[StatusEvent], messages: &impl MessageTemplates) {
    for line in render_events(entry.label(), events, messages) {
        tracing::info!("{line}");
    }
}

/// Renders each event as `[label] message`.
fn render_events(
    label: &str,
    events: &[StatusEvent],
    messages: &impl MessageTemplates,
) -> Vec<String> {
    events
        .iter()
        .map(|event| format!("[{label}] {}", messages.render(event)))
        .collect()
}

/// Multi-line report of a successful ping.
fn describe_result(target: &Target, result: &ProbeResult) -> String {
    let mut lines = vec![
        target.to_string(),
        format!("  motd:    {}", mcsw::protocol::strip_formatting(result.display_motd())),
        format!("  version: {}", result.version()),
        format!(
            "  players: {}/{}",
            result.online_players(),
            result.max_players()
        ),
        format!("  ping:    {} ms", result.ping().as_millis()),
    ];
    lines.extend(
        result
            .sample()
            .iter()
            .map(|player| format!("    - {} ({})", player.name, player.id)),
    );
    lines.join("\n")
}

/// Returns a future that completes when a shutdown signal is received.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}

//! TCP listener for register/unregister commands
//!
//! The host's service-invocation surface: listens for line-delimited
//! commands (`register <PACKAGE_ID>` / `unregister <PACKAGE_ID>`) and
//! forwards them to the command worker. Unknown lines are logged and
//! ignored.

use crate::services::commands::TrackingCommand;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Command listener configuration
#[derive(Debug, Clone)]
pub struct CommandListenerConfig {
    pub bind_address: String,
    pub port: u16,
    pub enabled: bool,
}

impl Default for CommandListenerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 25840, enabled: true }
    }
}

/// Start the command listener.
///
/// Commands are forwarded with `try_send` so a slow worker never blocks a
/// connection handler.
pub async fn start_command_listener(
    config: CommandListenerConfig,
    command_tx: mpsc::Sender<TrackingCommand>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if !config.enabled {
        info!("command_listener_disabled");
        return Ok(());
    }

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(addr = %addr, "command_listener_started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("command_listener_shutdown");
                    return Ok(());
                }
            }
            result = listener.accept() => {
                match result {
                    Ok((socket, addr)) => {
                        let tx = command_tx.clone();
                        tokio::spawn(async move {
                            handle_connection(socket, addr, tx).await;
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "command_listener_accept_failed");
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    socket: tokio::net::TcpStream,
    addr: SocketAddr,
    command_tx: mpsc::Sender<TrackingCommand>,
) {
    let peer = addr.to_string();
    debug!(peer = %peer, "command_connection_accepted");

    let reader = BufReader::new(socket);
    let mut lines = reader.lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<TrackingCommand>() {
            Ok(command) => command,
            Err(e) => {
                warn!(peer = %peer, line = %line, error = %e, "command_rejected");
                continue;
            }
        };

        info!(peer = %peer, command = %command, "command_received");

        match command_tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(peer = %peer, "command_dropped: channel full");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(peer = %peer, "command_channel_closed");
                break;
            }
        }
    }

    debug!(peer = %peer, "command_connection_closed");
}

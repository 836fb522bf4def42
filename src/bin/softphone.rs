//! Interactive softphone client for the harness server.
//!
//! Connects the controller to a running harness server through the
//! simulated signaling cloud and exposes the UI controls as line commands.

use std::env;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use dialprobe::client::{SimulatedCloud, SoftphoneController};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let server = env::var("SERVER_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let backend = Arc::new(SimulatedCloud::new(format!("{server}/voice")));
    let mut controller = SoftphoneController::new(backend, format!("{server}/token"));

    // Failure here is already logged and reflected in the UI status; the
    // user can retry with `precision on`/`precision off` once the server
    // is reachable.
    let _ = controller.initialize().await;

    println!("Commands: connect, disconnect, precision on|off, status, logs, clear, quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "connect" => {
                let _ = controller.connect().await;
            }
            "disconnect" => controller.disconnect(),
            "precision on" => {
                let _ = controller.set_improved_signaling(true).await;
            }
            "precision off" => {
                let _ = controller.set_improved_signaling(false).await;
            }
            "status" => {
                let snapshot = controller.ui().snapshot();
                println!(
                    "Status: {} (connect {}, disconnect {})",
                    snapshot.status.label(),
                    if snapshot.connect_enabled {
                        "enabled"
                    } else {
                        "disabled"
                    },
                    if snapshot.disconnect_enabled {
                        "enabled"
                    } else {
                        "disabled"
                    },
                );
            }
            "logs" => {
                for entry in controller.logs().entries() {
                    println!("[{}] {}", entry.timestamp, entry.message);
                }
            }
            "clear" => controller.clear_logs(),
            "quit" | "exit" => break,
            "" => {}
            other => println!("Unknown command: {other}"),
        }
    }

    Ok(())
}

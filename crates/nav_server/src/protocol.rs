//! Line protocol: request dispatch and the serve loop.

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use nav_core::error::PlanError;
use nav_core::wire::{plan_request, PlanResponse};

use crate::ServerConfig;

/// Health-probe request line.
pub const STATUS_REQUEST: &str = "STATUS";

/// Health-probe reply payload.
pub const STATUS_REPLY: &str = "Server Connected!";

/// Errors surfaced by the serve loop.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Listener or connection IO failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One reply line, always JSON.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Reply {
    Status {
        /// Health message.
        status: String,
    },
    Plan(PlanResponse),
    Error {
        /// Human-readable rejection reason.
        error: String,
    },
}

/// Map one request line to its reply.
///
/// Planner errors become error replies, never connection drops; the
/// planner itself is pure and synchronous, so this is a plain function.
#[must_use]
pub fn handle_line(line: &str) -> String {
    let reply = dispatch(line.trim());
    serde_json::to_string(&reply).unwrap_or_else(|e| {
        tracing::error!("Failed to serialize reply: {e}");
        format!("{{\"error\":\"internal: {e}\"}}")
    })
}

fn dispatch(line: &str) -> Reply {
    if line == STATUS_REQUEST {
        return Reply::Status {
            status: STATUS_REPLY.to_string(),
        };
    }

    match plan_request(line) {
        Ok(response) => {
            tracing::info!(
                commands = response.total_commands,
                "Planned request"
            );
            Reply::Plan(response)
        }
        Err(e @ (PlanError::MalformedRequest(_) | PlanError::MisalignedObstacle { .. })) => {
            tracing::warn!("Rejected request: {e}");
            Reply::Error {
                error: e.to_string(),
            }
        }
        Err(e) => {
            tracing::error!("Planning failed: {e}");
            Reply::Error {
                error: e.to_string(),
            }
        }
    }
}

/// Accept connections and answer one JSON line per request line.
///
/// # Errors
///
/// Returns an error if the listener cannot bind; per-connection failures
/// are logged and dropped.
pub async fn serve(config: ServerConfig) -> Result<(), ServeError> {
    let listener = TcpListener::bind(config.listen_addr()).await?;
    tracing::info!("Listening on {}", config.listen_addr());

    loop {
        let (stream, peer) = listener.accept().await?;
        tracing::debug!(%peer, "Connection accepted");
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream).await {
                tracing::warn!(%peer, "Connection error: {e}");
            }
        });
    }
}

async fn handle_connection(stream: TcpStream) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let mut reply = handle_line(&line);
        reply.push('\n');
        write_half.write_all(reply.as_bytes()).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line() {
        let reply = handle_line("STATUS");
        assert_eq!(reply, "{\"status\":\"Server Connected!\"}");
    }

    #[test]
    fn test_fallback_line_is_json_plan() {
        let reply = handle_line("NONE,7");
        let parsed: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(parsed["commands"][0], "SB010");
        assert_eq!(parsed["commands"][1], "SCAN_7");
        assert_eq!(parsed["commands"][2], "SF010");
        assert_eq!(parsed["total_commands"], 3);
        assert_eq!(parsed["path"][0]["x"], 1);
        assert_eq!(parsed["path"][0]["y"], 1);
        assert_eq!(parsed["path"][0]["d"], 0);
    }

    #[test]
    fn test_batch_line_plans() {
        let reply = handle_line("ALG:10,10,E,1;");
        let parsed: serde_json::Value = serde_json::from_str(&reply).unwrap();
        let commands = parsed["commands"].as_array().unwrap();
        assert_eq!(commands.last().unwrap(), "SCAN_1");
        assert_eq!(
            parsed["total_commands"].as_u64().unwrap() as usize,
            commands.len()
        );
    }

    #[test]
    fn test_handle_line_is_deterministic() {
        use nav_test_utils::determinism::{compute_hash, verify_determinism};

        verify_determinism(
            3,
            || handle_line("ALG:5,5,N,1;15,15,S,2;"),
            |reply| compute_hash(reply),
        )
        .assert_deterministic();
    }

    #[test]
    fn test_garbage_line_is_error_reply() {
        let reply = handle_line("HELLO");
        let parsed: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("Malformed"));
    }
}

//! HTTP bridge to the CAN bus: one POST per actuator command.

use async_trait::async_trait;
use std::time::Duration;

use rpshand_core::error::{Result, RpsError};
use rpshand_core::traits::CommandChannel;
use rpshand_core::types::DeviceCommand;

/// Sends `{ "interface", "id", "data" }` to the CAN bridge.
pub struct HttpCanChannel {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpCanChannel {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), url, timeout)
    }

    pub fn with_client(client: reqwest::Client, url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            client,
            timeout,
        }
    }
}

#[async_trait]
impl CommandChannel for HttpCanChannel {
    fn name(&self) -> &str {
        "can-http"
    }

    async fn send(&self, command: &DeviceCommand) -> Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(command)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RpsError::Transport(format!("CAN send failed: {e}")))?;

        let status = resp.status();
        let body: serde_json::Value = resp.json().await.unwrap_or_default();
        if bridge_accepted(status.is_success(), &body) {
            tracing::debug!(
                "✅ CAN message sent: {} id=0x{:x} data={:?}",
                command.interface_id,
                command.actuator_id,
                command.payload
            );
            Ok(())
        } else {
            Err(RpsError::Transport(format!(
                "CAN bridge error {status}: {}",
                bridge_message(&body)
            )))
        }
    }
}

/// The bridge acks either with a 2xx or with `"status": "success"` in the body.
fn bridge_accepted(http_ok: bool, body: &serde_json::Value) -> bool {
    http_ok || body["status"].as_str() == Some("success")
}

fn bridge_message(body: &serde_json::Value) -> String {
    body["error"]
        .as_str()
        .or_else(|| body["message"].as_str())
        .unwrap_or("no message")
        .to_string()
}

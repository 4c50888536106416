//! Device discovery: asks the hand service which hands are plugged in.

use serde::Deserialize;
use std::time::Duration;

use rpshand_core::config::HandsConfig;
use rpshand_core::error::{Result, RpsError};
use rpshand_core::types::DeviceConfig;

/// Response envelope of the hands-config endpoint.
#[derive(Debug, Deserialize)]
struct HandsConfigResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    data: Option<Vec<DeviceConfig>>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a hands-config body into a non-empty device list.
pub fn parse_devices(body: &str) -> Result<Vec<DeviceConfig>> {
    let resp: HandsConfigResponse = serde_json::from_str(body)
        .map_err(|e| RpsError::DeviceConfig(format!("invalid hands-config response: {e}")))?;
    if resp.status != "ok" {
        let reason = resp.message.or(resp.error).unwrap_or_else(|| resp.status.clone());
        return Err(RpsError::DeviceConfig(format!("hand service refused: {reason}")));
    }
    match resp.data {
        Some(devices) if !devices.is_empty() => Ok(devices),
        _ => Err(RpsError::DeviceConfig("hand service reported no devices".into())),
    }
}

/// GET the device list.
pub async fn fetch_devices(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<Vec<DeviceConfig>> {
    let body = client
        .get(url)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| RpsError::DeviceConfig(format!("hands-config request failed: {e}")))?
        .text()
        .await?;
    parse_devices(&body)
}

/// Static list from config if present, otherwise the endpoint.
///
/// Never fails: an unreachable or empty service leaves the session with zero
/// targets, so rounds still play but no hand moves.
pub async fn load_devices(client: &reqwest::Client, hands: &HandsConfig) -> Vec<DeviceConfig> {
    let devices = if !hands.devices.is_empty() {
        tracing::info!("🔧 Using {} statically configured device(s)", hands.devices.len());
        hands.devices.clone()
    } else {
        match fetch_devices(client, &hands.config_url, hands.request_timeout()).await {
            Ok(devices) => devices,
            Err(e) => {
                tracing::error!("❌ Failed to load device config: {e}");
                return Vec::new();
            }
        }
    };

    for (i, device) in devices.iter().enumerate() {
        tracing::info!("🤖 Device {}: {}", i + 1, device);
    }
    devices
}

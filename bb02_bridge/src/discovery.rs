use serde::Deserialize;

use crate::{Config, Error, Result};

/// A device as listed by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Opaque identifier used in the socket url
    pub path: String,

    #[serde(default)]
    pub product: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Option<Vec<DeviceInfo>>,
}

/// List the devices currently connected to the bridge.
pub async fn list_devices(config: &Config) -> Result<Vec<DeviceInfo>> {
    let client = config.http_client()?;
    fetch_devices(&client, config).await
}

/// Poll the bridge until exactly one device is connected and return its path.
///
/// The bridge is polled up to [`Config::discovery_attempts`] times, waiting
/// [`Config::discovery_interval`] in between.
pub async fn get_device_path(config: &Config) -> Result<String> {
    let client = config.http_client()?;
    for attempt in 1..=config.discovery_attempts {
        let mut devices = fetch_devices(&client, config).await?;
        if devices.len() == 1 {
            let device = devices.remove(0);
            tracing::info!("found device {}", device.path);
            return Ok(device.path);
        }
        tracing::debug!(
            "attempt {attempt}/{}: {} devices, expecting one",
            config.discovery_attempts,
            devices.len()
        );
        if attempt < config.discovery_attempts {
            tokio::time::sleep(config.discovery_interval).await;
        }
    }
    Err(Error::ExpectedOneDevice)
}

async fn fetch_devices(client: &reqwest::Client, config: &Config) -> Result<Vec<DeviceInfo>> {
    let url = config.devices_url();
    let mut request = client.get(&url);
    if let Some(origin) = config.origin.as_deref() {
        request = request.header(reqwest::header::ORIGIN, origin);
    }
    let resp = request.send().await.map_err(|e| {
        tracing::debug!("GET {url} failed: {e}");
        Error::BridgeNotFound
    })?;

    let status_code = resp.status().as_u16();
    if status_code == 403 {
        return Err(Error::OriginNotWhitelisted);
    }
    if status_code != 200 {
        return Err(Error::HttpStatus(url, status_code));
    }

    let body: DevicesResponse = serde_json::from_slice(resp.bytes().await?.as_ref())?;
    Ok(body.devices.unwrap_or_default())
}

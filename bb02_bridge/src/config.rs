use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{consts, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The host where the BitBoxBridge is listening
    pub bridge_host: String,
    pub bridge_port: u16,

    /// `Origin` header sent to the bridge, it must be whitelisted in the bridge
    pub origin: Option<String>,

    /// How many times the devices endpoint is polled waiting for exactly one device
    pub discovery_attempts: u32,
    #[serde(with = "millis")]
    pub discovery_interval: Duration,

    #[serde(with = "millis")]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_host: consts::BRIDGE_HOST.into(),
            bridge_port: consts::BRIDGE_PORT,
            origin: None,
            discovery_attempts: consts::DISCOVERY_ATTEMPTS,
            discovery_interval: consts::DISCOVERY_INTERVAL,
            request_timeout: consts::REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    /// Config for a bridge listening on the default host but on a different port
    pub fn with_port(port: u16) -> Self {
        Self {
            bridge_port: port,
            ..Default::default()
        }
    }

    pub fn bridge_addr(&self) -> String {
        format!("{}:{}", self.bridge_host, self.bridge_port)
    }

    pub fn devices_url(&self) -> String {
        format!("http://{}/api/v1/devices", self.bridge_addr())
    }

    pub fn socket_url(&self, device_path: &str) -> String {
        format!("ws://{}/api/v1/socket/{device_path}", self.bridge_addr())
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

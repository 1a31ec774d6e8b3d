use std::time::Duration;

pub const BRIDGE_HOST: &str = "127.0.0.1";
pub const BRIDGE_PORT: u16 = 8178;

pub const DISCOVERY_ATTEMPTS: u32 = 10;
pub const DISCOVERY_INTERVAL: Duration = Duration::from_millis(100);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Device error code returned when the user rejects an operation on the device.
pub const ERR_USER_ABORT: i32 = 104;

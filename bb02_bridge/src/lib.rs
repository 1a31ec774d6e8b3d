#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]

mod btc;
mod client;
pub mod config;
pub mod consts;
pub mod discovery;
pub mod error;
mod eth;
pub mod firmware;
mod pairing;
pub mod transport;

pub use client::BitBox02;
pub use config::Config;
pub use error::Error;
pub use firmware::{EventSender, Firmware, FirmwareError, Product, Status};
pub use pairing::{NoopHandler, PairingHandler};
pub use transport::{BridgeTransport, TransportError};

pub use bb02_common;

pub type Result<T> = std::result::Result<T, error::Error>;

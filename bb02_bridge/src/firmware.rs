//! The seam to the library implementing the BitBox02 protocol.
//!
//! The bridge client never interprets the bytes exchanged with the device: an implementation of
//! [`Firmware`] is built from the [`BridgeTransport`](crate::BridgeTransport) once the socket is
//! open, reports state changes through the [`EventSender`] and performs the actual requests.

use bb02_common::{
    BtcCoin, BtcInput, BtcMultisigAccount, BtcOutput, BtcScriptConfigWithKeypath, EthCoin,
    EthPubOutputType, EthTransaction, Keypath, SimpleType, XPubType,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::consts::ERR_USER_ABORT;
use crate::transport::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    Connected,
    Unpaired,
    PairingFailed,
    Uninitialized,
    Seeded,
    Initialized,
    RequireFirmwareUpgrade,
    RequireAppUpgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// [`Firmware::status`] changed
    StatusChanged,
    /// [`Firmware::channel_hash`] changed, the pairing code must be shown to the user
    ChannelHashChanged,
    /// [`Firmware::attestation`] is available
    AttestationCheckDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Product {
    BitBox02Multi,
    BitBox02BtcOnly,
}

/// Handed to the firmware at construction to notify the client of [`Event`]s.
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

impl EventSender {
    pub fn emit(&self, event: Event) {
        if self.0.send(event).is_err() {
            tracing::debug!("event {event:?} dropped, the client is gone");
        }
    }
}

pub(crate) fn event_channel() -> (EventSender, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), rx)
}

#[derive(Debug, thiserror::Error)]
pub enum FirmwareError {
    #[error("Device error {code}: {message}")]
    Device { code: i32, message: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Generic(String),
}

impl FirmwareError {
    /// True if the user rejected the operation on the device.
    pub fn is_abort(&self) -> bool {
        matches!(self, FirmwareError::Device { code, .. } if *code == ERR_USER_ABORT)
    }
}

/// Operations of the firmware protocol library the client forwards to.
///
/// Keypaths, coins and requests are already validated and normalized by the client.
#[allow(async_fn_in_trait)]
pub trait Firmware {
    /// Performs the handshake and pairing with the device.
    ///
    /// Progress is reported through [`Event`]s while this is running.
    async fn init(&self) -> Result<(), FirmwareError>;

    fn status(&self) -> Status;

    /// The pairing code and whether the device already confirmed it.
    fn channel_hash(&self) -> (String, bool);

    /// Reports whether the user confirmed the pairing code on the host.
    async fn channel_hash_verify(&self, ok: bool) -> Result<(), FirmwareError>;

    /// Result of the device attestation check, `None` if it could not be performed.
    fn attestation(&self) -> Option<bool>;

    fn product(&self) -> Product;

    fn version(&self) -> String;

    async fn btc_xpub(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        xpub_type: XPubType,
        display: bool,
    ) -> Result<String, FirmwareError>;

    async fn btc_address_simple(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        simple_type: SimpleType,
        display: bool,
    ) -> Result<String, FirmwareError>;

    async fn btc_address_multisig(
        &self,
        account: &BtcMultisigAccount,
        keypath: &Keypath,
    ) -> Result<String, FirmwareError>;

    /// Returns one 64 bytes signature per input.
    async fn btc_sign(
        &self,
        coin: BtcCoin,
        script_configs: &[BtcScriptConfigWithKeypath],
        inputs: &[BtcInput],
        outputs: &[BtcOutput],
        version: u32,
        locktime: u32,
    ) -> Result<Vec<Vec<u8>>, FirmwareError>;

    /// Returns the 64 bytes signature and the recovery id.
    async fn btc_sign_message(
        &self,
        coin: BtcCoin,
        simple_type: SimpleType,
        keypath: &Keypath,
        message: &[u8],
    ) -> Result<(Vec<u8>, u8), FirmwareError>;

    async fn btc_is_script_config_registered(
        &self,
        account: &BtcMultisigAccount,
    ) -> Result<bool, FirmwareError>;

    /// An empty `name` lets the user choose it on the device.
    async fn btc_register_script_config(
        &self,
        account: &BtcMultisigAccount,
        name: &str,
    ) -> Result<(), FirmwareError>;

    async fn eth_pub(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        output_type: EthPubOutputType,
        display: bool,
    ) -> Result<String, FirmwareError>;

    /// Returns the 65 bytes `r || s || recid` signature.
    async fn eth_sign(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        tx: &EthTransaction,
    ) -> Result<Vec<u8>, FirmwareError>;

    /// Returns the 65 bytes `r || s || recid` signature.
    async fn eth_sign_message(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        message: &[u8],
    ) -> Result<Vec<u8>, FirmwareError>;
}

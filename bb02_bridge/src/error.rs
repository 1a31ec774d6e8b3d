use crate::firmware::FirmwareError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("BitBoxBridge not found")]
    BridgeNotFound,

    #[error("Origin not whitelisted by the BitBoxBridge")]
    OriginNotWhitelisted,

    #[error("Http request to {0} returned {1} instead of 200")]
    HttpStatus(String, u16),

    #[error("Expected one BitBox02")]
    ExpectedOneDevice,

    #[error("Your BitBox02 is busy")]
    DeviceBusy,

    #[error("Pairing rejected")]
    PairingRejected,

    #[error("Firmware upgrade required")]
    FirmwareUpgradeRequired,

    #[error("Unsupported firmware")]
    UnsupportedFirmware,

    #[error("BitBox02 not initialized")]
    Uninitialized,

    #[error("Connection to the BitBoxBridge closed")]
    ConnectionClosed,

    #[error("User abort")]
    UserAbort,

    #[error("Ethereum is not supported by the BitBox02 Bitcoin-only edition")]
    EthNotSupported,

    #[error("Ethereum recipient must be 20 bytes, got {0}")]
    InvalidRecipient(usize),

    #[error("Missing keypath in change output {0}")]
    MissingChangeKeypath(usize),

    #[error("Missing hash in output {0}")]
    MissingOutputPayload(usize),

    #[error("Expected {expected} signatures, one per input, got {got}")]
    SignatureCountMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Common(#[from] bb02_common::Error),

    #[error("Firmware Error: {0}")]
    Firmware(FirmwareError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    HttpReqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl From<FirmwareError> for Error {
    fn from(e: FirmwareError) -> Self {
        if e.is_abort() {
            Error::UserAbort
        } else {
            Error::Firmware(e)
        }
    }
}

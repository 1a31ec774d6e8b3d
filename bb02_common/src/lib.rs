#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! A crate containing the types shared by the BitBox02 bridge client and firmware implementations, such as:
//!
//!   * [`Keypath`]: a BIP32 derivation path that parses the `m/44'/60'/0'/0/0` notation used by web callers
//!     and converts from and to [`bitcoin::bip32::DerivationPath`].
//!   * Bitcoin requests ([`BtcInput`], [`BtcOutput`], [`BtcScriptConfig`]) and Ethereum requests
//!     ([`EthSignRequest`], [`EthSignMessageRequest`]).
//!   * Normalization of raw device signatures into [`BtcMessageSignature`] and [`EthSignature`].
//!
//!  To avoid circular dependencies this crate must not depend on other crate of the workspace

mod btc;
mod coin;
mod error;
mod eth;
mod keypath;

pub use crate::btc::{
    BtcInput, BtcMessageSignature, BtcMultisigAccount, BtcOutput, BtcOutputType, BtcScriptConfig,
    BtcScriptConfigWithKeypath, BtcSignature, MultisigScriptType, SimpleType, XPubType,
};
pub use crate::coin::{eth_coin_from_chain_id, eth_coin_from_keypath, BtcCoin, EthCoin};
pub use crate::error::Error;
pub use crate::eth::{
    EthPubOutputType, EthSignMessageRequest, EthSignRequest, EthSignature, EthTransaction,
};
pub use crate::keypath::{Keypath, HARDENED};

pub use bitcoin;

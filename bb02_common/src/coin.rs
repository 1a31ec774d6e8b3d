use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Keypath, HARDENED};

/// The Bitcoin-like coin a BTC request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BtcCoin {
    /// Bitcoin mainnet
    Btc,
    /// Bitcoin testnet
    Tbtc,
    /// Litecoin mainnet
    Ltc,
    /// Litecoin testnet
    Tltc,
}

impl BtcCoin {
    /// Return true if the coin is a mainnet coin.
    pub fn is_mainnet(&self) -> bool {
        matches!(self, Self::Btc | Self::Ltc)
    }
}

impl std::fmt::Display for BtcCoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcCoin::Btc => write!(f, "btc"),
            BtcCoin::Tbtc => write!(f, "tbtc"),
            BtcCoin::Ltc => write!(f, "ltc"),
            BtcCoin::Tltc => write!(f, "tltc"),
        }
    }
}

impl FromStr for BtcCoin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "btc" => Ok(BtcCoin::Btc),
            "tbtc" => Ok(BtcCoin::Tbtc),
            "ltc" => Ok(BtcCoin::Ltc),
            "tltc" => Ok(BtcCoin::Tltc),
            _ => Err(Error::InvalidCoin(s.to_string())),
        }
    }
}

impl Serialize for BtcCoin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BtcCoin {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let string = String::deserialize(d)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

/// The Ethereum network an ETH request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthCoin {
    Eth,
    RopstenEth,
    RinkebyEth,
}

impl EthCoin {
    pub fn chain_id(&self) -> u64 {
        match self {
            EthCoin::Eth => 1,
            EthCoin::RopstenEth => 3,
            EthCoin::RinkebyEth => 4,
        }
    }
}

/// Coin for an Ethereum keypath, `m/44'/60'/..` on mainnet and `m/44'/1'/..` on testnets.
///
/// Ropsten and Rinkeby share the testnet keypath, so testnet keypaths always map to
/// [`EthCoin::RopstenEth`].
pub fn eth_coin_from_keypath(keypath: &Keypath) -> Result<EthCoin, Error> {
    if keypath.get(0) != Some(44 + HARDENED) {
        return Err(Error::InvalidKeypath(keypath.to_string()));
    }
    match keypath.get(1) {
        Some(level) if level == 60 + HARDENED => Ok(EthCoin::Eth),
        Some(level) if level == 1 + HARDENED => Ok(EthCoin::RopstenEth),
        _ => Err(Error::InvalidKeypath(keypath.to_string())),
    }
}

pub fn eth_coin_from_chain_id(chain_id: u64) -> Result<EthCoin, Error> {
    match chain_id {
        1 => Ok(EthCoin::Eth),
        3 => Ok(EthCoin::RopstenEth),
        4 => Ok(EthCoin::RinkebyEth),
        _ => Err(Error::UnsupportedChainId(chain_id)),
    }
}

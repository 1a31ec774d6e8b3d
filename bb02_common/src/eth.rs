use serde::{Deserialize, Serialize};

use crate::{Error, Keypath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EthPubOutputType {
    Address,
    Xpub,
}

/// A legacy Ethereum transaction. Numeric fields are big-endian byte strings, hex on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthTransaction {
    #[serde(with = "hex")]
    pub nonce: Vec<u8>,

    #[serde(with = "hex")]
    pub gas_price: Vec<u8>,

    #[serde(with = "hex")]
    pub gas_limit: Vec<u8>,

    /// 20 bytes address
    #[serde(rename = "to", with = "hex")]
    pub recipient: Vec<u8>,

    #[serde(with = "hex")]
    pub value: Vec<u8>,

    #[serde(with = "hex", default)]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthSignRequest {
    pub keypath: Keypath,
    pub chain_id: u64,
    pub tx: EthTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EthSignMessageRequest {
    pub keypath: Keypath,
    #[serde(with = "hex")]
    pub message: Vec<u8>,
}

/// An Ethereum signature split into its components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthSignature {
    #[serde(with = "hex")]
    pub r: [u8; 32],
    #[serde(with = "hex")]
    pub s: [u8; 32],
    /// Big-endian, minimal encoding
    #[serde(with = "hex")]
    pub v: Vec<u8>,
}

impl EthSignature {
    /// Splits a 65 bytes `r || s || recid` device signature of a transaction, computing the
    /// EIP-155 `v = chain_id * 2 + 35 + recid`.
    pub fn from_tx_signature(sig: &[u8], chain_id: u64) -> Result<Self, Error> {
        let (r, s, rec_id) = split_signature(sig)?;
        let v = u128::from(chain_id) * 2 + 35 + u128::from(rec_id);
        Ok(Self {
            r,
            s,
            v: minimal_be_bytes(v),
        })
    }

    /// Splits a 65 bytes `r || s || recid` device signature of a message, `v = 27 + recid`.
    pub fn from_msg_signature(sig: &[u8]) -> Result<Self, Error> {
        let (r, s, rec_id) = split_signature(sig)?;
        Ok(Self {
            r,
            s,
            v: vec![27 + rec_id],
        })
    }
}

fn split_signature(sig: &[u8]) -> Result<([u8; 32], [u8; 32], u8), Error> {
    if sig.len() != 65 {
        return Err(Error::InvalidSignatureLength {
            expected: 65,
            got: sig.len(),
        });
    }
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&sig[..32]);
    s.copy_from_slice(&sig[32..64]);
    let rec_id = sig[64];
    if rec_id > 3 {
        return Err(Error::InvalidRecoveryId(rec_id));
    }
    Ok((r, s, rec_id))
}

fn minimal_be_bytes(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);
    bytes[first..].to_vec()
}

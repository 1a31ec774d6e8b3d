use serde::{Deserialize, Serialize};

use crate::{BtcCoin, Error, Keypath};

/// Version bytes of an xpub as returned by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum XPubType {
    Tpub,
    Xpub,
    Ypub,
    Zpub,
    Vpub,
    Upub,
    CapitalVpub,
    CapitalZpub,
    CapitalUpub,
    CapitalYpub,
}

/// Single signature script types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SimpleType {
    /// Wrapped segwit, `3...` addresses
    P2wpkhP2sh,
    /// Native segwit, `bc1q...` addresses
    P2wpkh,
    /// Taproot, `bc1p...` addresses
    P2tr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultisigScriptType {
    P2wsh,
    P2wshP2sh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BtcOutputType {
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BtcScriptConfig {
    Simple(SimpleType),

    #[serde(rename_all = "camelCase")]
    Multisig {
        threshold: u32,
        xpubs: Vec<String>,
        our_xpub_index: u32,
        script_type: MultisigScriptType,
    },
}

/// A script config together with the account-level keypath it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcScriptConfigWithKeypath {
    pub script_config: BtcScriptConfig,
    pub keypath: Keypath,
}

/// A multisig account, which must be registered on the device before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcMultisigAccount {
    pub coin: BtcCoin,
    pub script_config: BtcScriptConfig,
    pub keypath_account: Keypath,
}

impl BtcMultisigAccount {
    pub fn script_config_with_keypath(&self) -> BtcScriptConfigWithKeypath {
        BtcScriptConfigWithKeypath {
            script_config: self.script_config.clone(),
            keypath: self.keypath_account.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcInput {
    #[serde(with = "hex")]
    pub prev_out_hash: [u8; 32],

    pub prev_out_index: u32,

    /// Satoshis, a decimal string on the wire
    #[serde(with = "amount_str")]
    pub prev_out_value: u64,

    /// `0xffffffff` when not using relative timelocks or RBF
    pub sequence: u32,

    pub keypath: Keypath,

    #[serde(default)]
    pub script_config_index: u32,
}

/// A transaction output: either change (`ours`) identified by its keypath, or an external
/// output identified by its type and hash payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcOutput {
    pub ours: bool,

    /// Only set for external outputs
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub output_type: Option<BtcOutputType>,

    #[serde(rename = "hash", with = "hex", default)]
    pub payload: Vec<u8>,

    #[serde(default)]
    pub keypath: Option<Keypath>,

    /// Satoshis, a decimal string on the wire
    #[serde(with = "amount_str")]
    pub value: u64,

    #[serde(default)]
    pub script_config_index: u32,
}

impl BtcOutput {
    pub fn change(keypath: Keypath, value: u64) -> Self {
        Self {
            ours: true,
            output_type: None,
            payload: vec![],
            keypath: Some(keypath),
            value,
            script_config_index: 0,
        }
    }

    pub fn external(output_type: BtcOutputType, payload: Vec<u8>, value: u64) -> Self {
        Self {
            ours: false,
            output_type: Some(output_type),
            payload,
            keypath: None,
            value,
            script_config_index: 0,
        }
    }
}

/// A 64 bytes compact ECDSA signature (or schnorr signature for taproot inputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtcSignature(#[serde(with = "hex")] pub [u8; 64]);

impl TryFrom<&[u8]> for BtcSignature {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let sig: [u8; 64] = value
            .try_into()
            .map_err(|_| Error::InvalidSignatureLength {
                expected: 64,
                got: value.len(),
            })?;
        Ok(Self(sig))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BtcMessageSignature {
    pub signature: BtcSignature,

    #[serde(rename = "recID")]
    pub rec_id: u8,

    /// Signature in the format used by Electrum: header byte followed by the 64 bytes signature
    #[serde(with = "hex")]
    pub electrum_sig65: Vec<u8>,
}

impl BtcMessageSignature {
    pub fn new(signature: BtcSignature, rec_id: u8) -> Result<Self, Error> {
        if rec_id > 3 {
            return Err(Error::InvalidRecoveryId(rec_id));
        }
        // 27 + 4 flags a compressed public key
        let mut electrum_sig65 = Vec::with_capacity(65);
        electrum_sig65.push(27 + 4 + rec_id);
        electrum_sig65.extend_from_slice(&signature.0);
        Ok(Self {
            signature,
            rec_id,
            electrum_sig65,
        })
    }
}

mod amount_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum StringOrNumber {
            String(String),
            Number(u64),
        }
        match StringOrNumber::deserialize(d)? {
            StringOrNumber::String(s) => s.parse().map_err(serde::de::Error::custom),
            StringOrNumber::Number(n) => Ok(n),
        }
    }
}

use bb02_common::{
    BtcCoin, BtcInput, BtcMessageSignature, BtcMultisigAccount, BtcOutput, BtcScriptConfig,
    BtcScriptConfigWithKeypath, BtcSignature, Keypath, SimpleType, XPubType,
};

use crate::{BitBox02, Error, Firmware, Result};

impl<F: Firmware> BitBox02<F> {
    /// Returns the xpub at the account-level `keypath`, for example `m/84'/0'/0'`.
    ///
    /// If `display` is true the device shows the xpub before returning it.
    pub async fn btc_xpub(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        xpub_type: XPubType,
        display: bool,
    ) -> Result<String> {
        Ok(self
            .firmware()
            .btc_xpub(coin, keypath, xpub_type, display)
            .await?)
    }

    /// Returns the single sig address at the address-level `keypath`, for example
    /// `m/84'/0'/0'/1/10`, optionally showing it on the device for user confirmation.
    pub async fn btc_display_address_simple(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        simple_type: SimpleType,
        display: bool,
    ) -> Result<String> {
        Ok(self
            .firmware()
            .btc_address_simple(coin, keypath, simple_type, display)
            .await?)
    }

    /// Sign a transaction spending only inputs of the single sig account at `keypath_account`.
    ///
    /// Returns one signature per input.
    #[allow(clippy::too_many_arguments)]
    pub async fn btc_sign_simple(
        &self,
        coin: BtcCoin,
        simple_type: SimpleType,
        keypath_account: &Keypath,
        inputs: Vec<BtcInput>,
        outputs: Vec<BtcOutput>,
        version: u32,
        locktime: u32,
    ) -> Result<Vec<BtcSignature>> {
        let script_configs = [BtcScriptConfigWithKeypath {
            script_config: BtcScriptConfig::Simple(simple_type),
            keypath: keypath_account.clone(),
        }];
        self.btc_sign(coin, &script_configs, inputs, outputs, version, locktime)
            .await
    }

    /// Sign a transaction spending only inputs of a registered multisig account.
    ///
    /// See [`BitBox02::btc_maybe_register_script_config`].
    pub async fn btc_sign_multisig(
        &self,
        account: &BtcMultisigAccount,
        inputs: Vec<BtcInput>,
        outputs: Vec<BtcOutput>,
        version: u32,
        locktime: u32,
    ) -> Result<Vec<BtcSignature>> {
        let script_configs = [account.script_config_with_keypath()];
        self.btc_sign(
            account.coin,
            &script_configs,
            inputs,
            outputs,
            version,
            locktime,
        )
        .await
    }

    async fn btc_sign(
        &self,
        coin: BtcCoin,
        script_configs: &[BtcScriptConfigWithKeypath],
        inputs: Vec<BtcInput>,
        outputs: Vec<BtcOutput>,
        version: u32,
        locktime: u32,
    ) -> Result<Vec<BtcSignature>> {
        let inputs = single_script_config_inputs(inputs);
        let outputs = single_script_config_outputs(outputs)?;
        let signatures = self
            .firmware()
            .btc_sign(coin, script_configs, &inputs, &outputs, version, locktime)
            .await?;
        if signatures.len() != inputs.len() {
            return Err(Error::SignatureCountMismatch {
                expected: inputs.len(),
                got: signatures.len(),
            });
        }
        signatures
            .iter()
            .map(|sig| BtcSignature::try_from(sig.as_slice()).map_err(Error::from))
            .collect()
    }

    pub async fn btc_sign_message(
        &self,
        coin: BtcCoin,
        simple_type: SimpleType,
        keypath: &Keypath,
        message: &[u8],
    ) -> Result<BtcMessageSignature> {
        let (signature, rec_id) = self
            .firmware()
            .btc_sign_message(coin, simple_type, keypath, message)
            .await?;
        let signature = BtcSignature::try_from(signature.as_slice())?;
        Ok(BtcMessageSignature::new(signature, rec_id)?)
    }

    /// Register the multisig `account` on the device, unless it is already registered.
    ///
    /// Without a `name` the user is asked to enter one on the device.
    /// Returns true if the account was registered by this call.
    pub async fn btc_maybe_register_script_config(
        &self,
        account: &BtcMultisigAccount,
        name: Option<&str>,
    ) -> Result<bool> {
        if self
            .firmware()
            .btc_is_script_config_registered(account)
            .await?
        {
            return Ok(false);
        }
        tracing::info!("registering multisig account {}", account.keypath_account);
        self.firmware()
            .btc_register_script_config(account, name.unwrap_or(""))
            .await?;
        Ok(true)
    }

    /// Shows the address of the multisig `account` at `keypath` on the device.
    pub async fn btc_display_address_multisig(
        &self,
        account: &BtcMultisigAccount,
        keypath: &Keypath,
    ) -> Result<String> {
        Ok(self
            .firmware()
            .btc_address_multisig(account, keypath)
            .await?)
    }
}

/// All inputs spend from the only script config passed to the device.
fn single_script_config_inputs(inputs: Vec<BtcInput>) -> Vec<BtcInput> {
    inputs
        .into_iter()
        .map(|input| BtcInput {
            script_config_index: 0,
            ..input
        })
        .collect()
}

/// Change outputs use the only script config passed to the device.
fn single_script_config_outputs(outputs: Vec<BtcOutput>) -> Result<Vec<BtcOutput>> {
    outputs
        .into_iter()
        .enumerate()
        .map(|(idx, output)| {
            if output.ours {
                if output.keypath.is_none() {
                    return Err(Error::MissingChangeKeypath(idx));
                }
                Ok(BtcOutput {
                    script_config_index: 0,
                    ..output
                })
            } else if output.payload.is_empty() {
                Err(Error::MissingOutputPayload(idx))
            } else {
                Ok(output)
            }
        })
        .collect()
}

use bb02_common::{
    eth_coin_from_chain_id, eth_coin_from_keypath, EthPubOutputType, EthSignMessageRequest,
    EthSignRequest, EthSignature, Keypath,
};

use crate::{BitBox02, Error, Firmware, Result};

impl<F: Firmware> BitBox02<F> {
    fn check_eth_supported(&self) -> Result<()> {
        if self.eth_supported() {
            Ok(())
        } else {
            Err(Error::EthNotSupported)
        }
    }

    /// Returns the xpub at `keypath`, for example `m/44'/60'/0'/0`, without showing it.
    pub async fn eth_get_root_pub_key(&self, keypath: &Keypath) -> Result<String> {
        self.check_eth_supported()?;
        let coin = eth_coin_from_keypath(keypath)?;
        Ok(self
            .firmware()
            .eth_pub(coin, keypath, EthPubOutputType::Xpub, false)
            .await?)
    }

    /// Returns the address at `keypath`, optionally showing it on the device.
    ///
    /// Testnet keypaths are shown as Ropsten addresses, also when used on Rinkeby.
    pub async fn eth_display_address(&self, keypath: &Keypath, display: bool) -> Result<String> {
        self.check_eth_supported()?;
        let coin = eth_coin_from_keypath(keypath)?;
        Ok(self
            .firmware()
            .eth_pub(coin, keypath, EthPubOutputType::Address, display)
            .await?)
    }

    /// Sign a legacy transaction, `v` of the returned signature follows EIP-155.
    pub async fn eth_sign_transaction(&self, request: &EthSignRequest) -> Result<EthSignature> {
        self.check_eth_supported()?;
        let coin = eth_coin_from_chain_id(request.chain_id)?;
        if request.tx.recipient.len() != 20 {
            return Err(Error::InvalidRecipient(request.tx.recipient.len()));
        }
        let signature = self
            .firmware()
            .eth_sign(coin, &request.keypath, &request.tx)
            .await?;
        Ok(EthSignature::from_tx_signature(
            &signature,
            request.chain_id,
        )?)
    }

    /// Sign a message, `v` of the returned signature is `27 + recid`.
    pub async fn eth_sign_message(&self, request: &EthSignMessageRequest) -> Result<EthSignature> {
        self.check_eth_supported()?;
        let coin = eth_coin_from_keypath(&request.keypath)?;
        let signature = self
            .firmware()
            .eth_sign_message(coin, &request.keypath, &request.message)
            .await?;
        Ok(EthSignature::from_msg_signature(&signature)?)
    }
}

use crate::Status;

/// Callbacks invoked by [`BitBox02::connect`](crate::BitBox02::connect) while pairing.
///
/// Every method has a default so that a caller implements only what it shows to the user.
#[allow(async_fn_in_trait)]
pub trait PairingHandler {
    /// Show the pairing code, the same code is shown on the device.
    fn show_pairing(&self, _channel_hash: &str) {}

    /// Asks the user to confirm the pairing code shown by [`PairingHandler::show_pairing`].
    ///
    /// Called once the device confirmed it too, returning `false` rejects the pairing.
    async fn user_verify(&self) -> bool {
        true
    }

    /// The pairing completed, the pairing code can be hidden.
    fn pairing_done(&self) {}

    fn attestation(&self, _result: Option<bool>) {}

    fn status_changed(&self, _status: Status) {}

    /// The bridge connection closed before the device was ready.
    fn closed(&self) {}
}

/// Accepts the pairing without showing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandler;

impl PairingHandler for NoopHandler {}

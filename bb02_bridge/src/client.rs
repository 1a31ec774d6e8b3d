use futures::future::LocalBoxFuture;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::firmware::{event_channel, Event, EventSender};
use crate::{
    BridgeTransport, Config, Error, Firmware, PairingHandler, Product, Result, Status,
};

/// A BitBox02 paired through the BitBoxBridge.
///
/// This is the main struct for interacting with the device, build it with [`BitBox02::connect`]
/// which returns once the device is paired and unlocked.
#[derive(Debug)]
pub struct BitBox02<F: Firmware> {
    firmware: F,

    transport: BridgeTransport,

    device_path: String,
}

impl<F: Firmware> BitBox02<F> {
    /// Opens the bridge socket to the device at `device_path` and runs the pairing flow.
    ///
    /// `build` constructs the firmware from the open transport and the sender it must use to
    /// notify [`Event`]s. `handler` is called back as the pairing progresses.
    ///
    /// On failure the socket is closed.
    pub async fn connect<B, H>(
        config: &Config,
        device_path: &str,
        build: B,
        handler: &H,
    ) -> Result<Self>
    where
        B: FnOnce(BridgeTransport, EventSender) -> F,
        H: PairingHandler,
    {
        let url = config.socket_url(device_path);
        tracing::info!("connecting to {url}");
        let transport = BridgeTransport::connect(&url, config.origin.as_deref())
            .await
            .map_err(|e| {
                // The bridge refuses the socket when the device is already in use
                tracing::warn!("cannot open {url}: {e}");
                Error::DeviceBusy
            })?;

        let (events, mut receiver) = event_channel();
        let firmware = build(transport.clone(), events);
        let bitbox = Self {
            firmware,
            transport,
            device_path: device_path.to_string(),
        };

        match bitbox.pair(&mut receiver, handler).await {
            Ok(()) => {
                tracing::info!("paired with {}", bitbox.device_path);
                Ok(bitbox)
            }
            Err(e) => {
                tracing::info!("pairing with {} failed: {e}", bitbox.device_path);
                bitbox.transport.close().await;
                Err(e)
            }
        }
    }

    async fn pair<H: PairingHandler>(
        &self,
        events: &mut UnboundedReceiver<Event>,
        handler: &H,
    ) -> Result<()> {
        let init = self.firmware.init();
        tokio::pin!(init);
        let mut init_done = false;
        // Pending user confirmation of the pairing code
        let mut verify: Option<LocalBoxFuture<'_, Result<()>>> = None;

        loop {
            tokio::select! {
                biased;

                Some(event) = events.recv() => {
                    if self.handle_event(event, handler, &mut verify)? {
                        return Ok(());
                    }
                }
                Some(result) = async { Some(verify.as_mut()?.await) }, if verify.is_some() => {
                    verify = None;
                    result?;
                }
                result = &mut init, if !init_done => {
                    result?;
                    init_done = true;
                    if self.firmware.status() == Status::PairingFailed {
                        return Err(Error::PairingRejected);
                    }
                }
                _ = self.transport.closed() => {
                    handler.closed();
                    return Err(Error::ConnectionClosed);
                }
            }
        }
    }

    /// Returns true once the device is ready to be used.
    fn handle_event<'a, H: PairingHandler>(
        &'a self,
        event: Event,
        handler: &'a H,
        verify: &mut Option<LocalBoxFuture<'a, Result<()>>>,
    ) -> Result<bool> {
        tracing::debug!("firmware event {event:?}");
        match event {
            Event::ChannelHashChanged => {
                let (channel_hash, device_verified) = self.firmware.channel_hash();
                handler.show_pairing(&channel_hash);
                if device_verified {
                    *verify = Some(Box::pin(self.verify_pairing(handler)));
                }
                Ok(false)
            }
            Event::AttestationCheckDone => {
                handler.attestation(self.firmware.attestation());
                Ok(false)
            }
            Event::StatusChanged => {
                let status = self.firmware.status();
                tracing::info!("status {status:?}");
                handler.status_changed(status);
                match status {
                    Status::RequireFirmwareUpgrade => Err(Error::FirmwareUpgradeRequired),
                    Status::RequireAppUpgrade => Err(Error::UnsupportedFirmware),
                    Status::Uninitialized => Err(Error::Uninitialized),
                    Status::PairingFailed => Err(Error::PairingRejected),
                    Status::Initialized => {
                        handler.pairing_done();
                        Ok(true)
                    }
                    Status::Connected | Status::Unpaired | Status::Seeded => Ok(false),
                }
            }
        }
    }

    async fn verify_pairing<H: PairingHandler>(&self, handler: &H) -> Result<()> {
        let accepted = handler.user_verify().await;
        tracing::debug!("pairing code accepted by the user: {accepted}");
        self.firmware.channel_hash_verify(accepted).await?;
        Ok(())
    }

    /// The firmware handle the calls are forwarded to.
    pub fn firmware(&self) -> &F {
        &self.firmware
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    pub fn status(&self) -> Status {
        self.firmware.status()
    }

    pub fn product(&self) -> Product {
        self.firmware.product()
    }

    pub fn version(&self) -> String {
        self.firmware.version()
    }

    /// Only the multi edition supports Ethereum.
    pub fn eth_supported(&self) -> bool {
        self.product() == Product::BitBox02Multi
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// Resolves when the bridge connection is closed, for example because the device was unplugged.
    pub async fn closed(&self) {
        self.transport.closed().await
    }

    pub async fn close(&self) {
        self.transport.close().await
    }
}

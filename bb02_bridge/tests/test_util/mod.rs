#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bb02_bridge::bb02_common::{
    BtcCoin, BtcInput, BtcMultisigAccount, BtcOutput, BtcScriptConfigWithKeypath, EthCoin,
    EthPubOutputType, EthTransaction, Keypath, SimpleType, XPubType,
};
use bb02_bridge::consts::ERR_USER_ABORT;
use bb02_bridge::firmware::Event;
use bb02_bridge::{
    BridgeTransport, Config, EventSender, Firmware, FirmwareError, PairingHandler, Product,
    Status,
};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

pub const CHANNEL_HASH: &str = "ABCDE FGHIJ";

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the fake bridge does when a client opens a device socket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SocketMode {
    /// Echo back every binary frame
    #[default]
    Echo,
    /// Refuse the upgrade, as the bridge does when the device is already in use
    Busy,
    /// Accept and immediately close
    Close,
}

#[derive(Default)]
struct BridgeState {
    responses: VecDeque<(u16, String)>,
    last: Option<(u16, String)>,
    requests: usize,
    origins: Vec<Option<String>>,
    socket: SocketMode,
}

/// A BitBoxBridge stand-in listening on a random local port.
pub struct FakeBridge {
    pub port: u16,
    state: Arc<Mutex<BridgeState>>,
}

impl FakeBridge {
    /// `responses` are served in order to the devices endpoint, the last one is repeated.
    pub async fn start(responses: Vec<(u16, String)>, socket: SocketMode) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(BridgeState {
            responses: responses.into(),
            socket,
            ..Default::default()
        }));
        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, accept_state.clone()));
            }
        });
        Self { port, state }
    }

    pub async fn with_devices(paths: &[&str]) -> Self {
        Self::start(vec![(200, devices_body(paths))], SocketMode::Echo).await
    }

    pub fn config(&self) -> Config {
        Config {
            discovery_interval: Duration::from_millis(10),
            ..Config::with_port(self.port)
        }
    }

    pub fn requests(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    pub fn origins(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().origins.clone()
    }
}

pub fn devices_body(paths: &[&str]) -> String {
    let devices: Vec<_> = paths
        .iter()
        .map(|path| serde_json::json!({ "path": path, "product": "bb02-multi" }))
        .collect();
    serde_json::json!({ "devices": devices }).to_string()
}

async fn serve(mut stream: TcpStream, state: Arc<Mutex<BridgeState>>) {
    let mut buf = vec![0u8; 4096];
    let head = loop {
        let n = match stream.peek(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        if let Some(end) = buf[..n].windows(4).position(|w| w == b"\r\n\r\n") {
            break String::from_utf8_lossy(&buf[..end + 4]).to_string();
        }
        tokio::task::yield_now().await;
    };

    if head.starts_with("GET /api/v1/devices") {
        let mut request = vec![0u8; head.len()];
        if stream.read_exact(&mut request).await.is_err() {
            return;
        }
        let (status, body) = {
            let mut state = state.lock().unwrap();
            state.requests += 1;
            state.origins.push(header(&head, "origin"));
            let next = state.responses.pop_front().or_else(|| state.last.clone());
            state.last = next.clone();
            next.unwrap_or((404, String::new()))
        };
        let reason = match status {
            200 => "OK",
            403 => "Forbidden",
            _ => "Error",
        };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
        return;
    }

    let mode = state.lock().unwrap().socket;
    match mode {
        SocketMode::Busy => {
            let mut request = vec![0u8; head.len()];
            let _ = stream.read_exact(&mut request).await;
            let response = "HTTP/1.1 409 Conflict\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        SocketMode::Close => {
            if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
                let _ = ws.close(None).await;
            }
        }
        SocketMode::Echo => {
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };
            while let Some(Ok(message)) = ws.next().await {
                match message {
                    Message::Binary(data) => {
                        if ws.send(Message::Binary(data)).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => (),
                }
            }
        }
    }
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

/// How the mock device behaves during `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Unpaired device, pairing code confirmed on the device
    Pairing,
    /// Device already paired with this host
    Paired,
    RequireFirmwareUpgrade,
    RequireAppUpgrade,
    Uninitialized,
    /// Device rejects the pairing during the handshake
    HandshakeFailed,
    /// Never talks to the device nor reports anything
    Silent,
    /// The handshake fails with an error
    InitError,
}

/// A firmware that scripts the device state and records the requests it receives.
pub struct MockFirmware {
    transport: BridgeTransport,
    events: EventSender,
    scenario: Scenario,
    product: Product,
    status: Mutex<Status>,
    pub calls: Mutex<Vec<String>>,
    pub sign_requests: Mutex<Vec<(Vec<BtcScriptConfigWithKeypath>, Vec<BtcInput>, Vec<BtcOutput>)>>,
    registered: Mutex<BTreeSet<String>>,
    abort_next: Mutex<bool>,
}

impl MockFirmware {
    pub fn new(
        transport: BridgeTransport,
        events: EventSender,
        scenario: Scenario,
        product: Product,
    ) -> Self {
        Self {
            transport,
            events,
            scenario,
            product,
            status: Mutex::new(Status::Connected),
            calls: Mutex::new(vec![]),
            sign_requests: Mutex::new(vec![]),
            registered: Mutex::new(BTreeSet::new()),
            abort_next: Mutex::new(false),
        }
    }

    /// Next request is rejected as if the user aborted it on the device.
    pub fn abort_next(&self) {
        *self.abort_next.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn set_status(&self, status: Status) {
        *self.status.lock().unwrap() = status;
        self.events.emit(Event::StatusChanged);
    }

    fn request(&self, call: String) -> Result<(), FirmwareError> {
        self.calls.lock().unwrap().push(call);
        let mut abort = self.abort_next.lock().unwrap();
        if *abort {
            *abort = false;
            return Err(FirmwareError::Device {
                code: ERR_USER_ABORT,
                message: "aborted by the user".into(),
            });
        }
        Ok(())
    }
}

fn signature65(rec_id: u8) -> Vec<u8> {
    let mut sig = vec![0x11; 32];
    sig.extend([0x22; 32]);
    sig.push(rec_id);
    sig
}

impl Firmware for MockFirmware {
    async fn init(&self) -> Result<(), FirmwareError> {
        match self.scenario {
            Scenario::Silent => return Ok(()),
            Scenario::InitError => {
                return Err(FirmwareError::Generic("noise handshake failed".into()))
            }
            _ => (),
        }
        // A round trip through the bridge socket, standing in for the noise handshake
        self.transport.write(b"handshake").await?;
        let reply = self.transport.read().await?;
        if reply != b"handshake" {
            return Err(FirmwareError::Generic("unexpected handshake reply".into()));
        }

        match self.scenario {
            Scenario::Pairing => {
                self.set_status(Status::Unpaired);
                self.events.emit(Event::ChannelHashChanged);
                self.events.emit(Event::AttestationCheckDone);
            }
            Scenario::Paired => {
                self.events.emit(Event::AttestationCheckDone);
                self.set_status(Status::Initialized);
            }
            Scenario::RequireFirmwareUpgrade => self.set_status(Status::RequireFirmwareUpgrade),
            Scenario::RequireAppUpgrade => self.set_status(Status::RequireAppUpgrade),
            Scenario::Uninitialized => self.set_status(Status::Uninitialized),
            Scenario::HandshakeFailed => {
                *self.status.lock().unwrap() = Status::PairingFailed;
            }
            Scenario::Silent | Scenario::InitError => (),
        }
        Ok(())
    }

    fn status(&self) -> Status {
        *self.status.lock().unwrap()
    }

    fn channel_hash(&self) -> (String, bool) {
        (CHANNEL_HASH.to_string(), true)
    }

    async fn channel_hash_verify(&self, ok: bool) -> Result<(), FirmwareError> {
        if ok {
            self.set_status(Status::Initialized);
        } else {
            self.set_status(Status::PairingFailed);
        }
        Ok(())
    }

    fn attestation(&self) -> Option<bool> {
        Some(true)
    }

    fn product(&self) -> Product {
        self.product
    }

    fn version(&self) -> String {
        "9.19.0".into()
    }

    async fn btc_xpub(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        xpub_type: XPubType,
        display: bool,
    ) -> Result<String, FirmwareError> {
        self.request(format!("btc_xpub {coin} {keypath} {xpub_type:?} {display}"))?;
        Ok(format!("xpub-{keypath}"))
    }

    async fn btc_address_simple(
        &self,
        coin: BtcCoin,
        keypath: &Keypath,
        simple_type: SimpleType,
        display: bool,
    ) -> Result<String, FirmwareError> {
        self.request(format!(
            "btc_address_simple {coin} {keypath} {simple_type:?} {display}"
        ))?;
        Ok(format!("address-{keypath}"))
    }

    async fn btc_address_multisig(
        &self,
        account: &BtcMultisigAccount,
        keypath: &Keypath,
    ) -> Result<String, FirmwareError> {
        self.request(format!(
            "btc_address_multisig {} {keypath}",
            account.keypath_account
        ))?;
        Ok(format!("multisig-{keypath}"))
    }

    async fn btc_sign(
        &self,
        coin: BtcCoin,
        script_configs: &[BtcScriptConfigWithKeypath],
        inputs: &[BtcInput],
        outputs: &[BtcOutput],
        version: u32,
        locktime: u32,
    ) -> Result<Vec<Vec<u8>>, FirmwareError> {
        self.request(format!("btc_sign {coin} {version} {locktime}"))?;
        self.sign_requests.lock().unwrap().push((
            script_configs.to_vec(),
            inputs.to_vec(),
            outputs.to_vec(),
        ));
        Ok((0..inputs.len()).map(|i| vec![i as u8; 64]).collect())
    }

    async fn btc_sign_message(
        &self,
        coin: BtcCoin,
        simple_type: SimpleType,
        keypath: &Keypath,
        message: &[u8],
    ) -> Result<(Vec<u8>, u8), FirmwareError> {
        self.request(format!(
            "btc_sign_message {coin} {simple_type:?} {keypath} {}",
            String::from_utf8_lossy(message)
        ))?;
        Ok((vec![0x33; 64], 1))
    }

    async fn btc_is_script_config_registered(
        &self,
        account: &BtcMultisigAccount,
    ) -> Result<bool, FirmwareError> {
        self.request("btc_is_script_config_registered".into())?;
        Ok(self
            .registered
            .lock()
            .unwrap()
            .contains(&account.keypath_account.to_string()))
    }

    async fn btc_register_script_config(
        &self,
        account: &BtcMultisigAccount,
        name: &str,
    ) -> Result<(), FirmwareError> {
        self.request(format!("btc_register_script_config {name}"))?;
        self.registered
            .lock()
            .unwrap()
            .insert(account.keypath_account.to_string());
        Ok(())
    }

    async fn eth_pub(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        output_type: EthPubOutputType,
        display: bool,
    ) -> Result<String, FirmwareError> {
        self.request(format!(
            "eth_pub {coin:?} {keypath} {output_type:?} {display}"
        ))?;
        Ok(format!("{output_type:?}-{keypath}"))
    }

    async fn eth_sign(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        tx: &EthTransaction,
    ) -> Result<Vec<u8>, FirmwareError> {
        self.request(format!(
            "eth_sign {coin:?} {keypath} {}",
            hex::encode(&tx.recipient)
        ))?;
        Ok(signature65(1))
    }

    async fn eth_sign_message(
        &self,
        coin: EthCoin,
        keypath: &Keypath,
        message: &[u8],
    ) -> Result<Vec<u8>, FirmwareError> {
        self.request(format!(
            "eth_sign_message {coin:?} {keypath} {}",
            String::from_utf8_lossy(message)
        ))?;
        Ok(signature65(0))
    }
}

/// Records every callback, answering `user_verify` with `accept`.
pub struct RecordingHandler {
    /// `None` never answers, as a user walking away from the pairing screen
    accept: Option<bool>,
    pub calls: Mutex<Vec<String>>,
}

impl RecordingHandler {
    pub fn new(accept: bool) -> Self {
        Self {
            accept: Some(accept),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn unanswered() -> Self {
        Self {
            accept: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PairingHandler for RecordingHandler {
    fn show_pairing(&self, channel_hash: &str) {
        self.push(format!("show_pairing {channel_hash}"));
    }

    async fn user_verify(&self) -> bool {
        self.push("user_verify".into());
        match self.accept {
            Some(accept) => accept,
            None => std::future::pending().await,
        }
    }

    fn pairing_done(&self) {
        self.push("pairing_done".into());
    }

    fn attestation(&self, result: Option<bool>) {
        self.push(format!("attestation {result:?}"));
    }

    fn status_changed(&self, status: Status) {
        self.push(format!("status {status:?}"));
    }

    fn closed(&self) {
        self.push("closed".into());
    }
}

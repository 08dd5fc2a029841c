use core::task::Poll;

use beacon_traits::Transport;
use embassy_futures::poll_once;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Read;
use rust_mqtt::client::client::MqttClient as RawClient;
use rust_mqtt::client::client_config::{ClientConfig, MqttVersion};
use rust_mqtt::packet::v5::publish_packet::QualityOfService;
use rust_mqtt::packet::v5::reason_codes::ReasonCode;
use rust_mqtt::utils::rng_generator::CountingRng;

/// Largest packet the client will send
pub const MAX_PACKET_SIZE: usize = 512;
/// Only CONNACK and PINGRESP are ever expected back
const RX_BUFFER_SIZE: usize = 128;
const MAX_PROPERTIES: usize = 2;
/// fixed header, topic length and an empty property block
const PUBLISH_OVERHEAD: usize = 8;
const READ_CHUNK: usize = 32;

#[derive(Debug, Copy, Clone)]
pub struct SessionOptions {
    pub host: &'static str,
    pub port: u16,
    pub keep_alive_secs: u16,
    /// How long to wait for CONNACK or PINGRESP before giving up
    pub response_timeout_ms: u64,
    pub credentials: Option<(&'static str, &'static str)>,
}

/// Why the broker turned a CONNECT down, in MQTT 3.1.1 numbering
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectReturnCode {
    UnacceptableProtocol,
    IdentifierRejected,
    ServerUnavailable,
    BadCredentials,
    NotAuthorized,
}

impl ConnectReturnCode {
    pub fn code(&self) -> u8 {
        match self {
            Self::UnacceptableProtocol => 1,
            Self::IdentifierRejected => 2,
            Self::ServerUnavailable => 3,
            Self::BadCredentials => 4,
            Self::NotAuthorized => 5,
        }
    }

    /// Fold an MQTT 5 CONNACK reason into the 3.1.1 refusal it corresponds to
    pub fn from_reason(reason: &ReasonCode) -> Option<Self> {
        match reason {
            ReasonCode::UnsupportedProtocolVersion => Some(Self::UnacceptableProtocol),
            ReasonCode::ClientIdNotValid => Some(Self::IdentifierRejected),
            ReasonCode::ServerUnavailable | ReasonCode::ServerBusy => Some(Self::ServerUnavailable),
            ReasonCode::BadUserNameOrPassword => Some(Self::BadCredentials),
            ReasonCode::NotAuthorized | ReasonCode::Banned => Some(Self::NotAuthorized),
            _ => None,
        }
    }
}

/// Session status, numbered the way PubSubClient reports `state()`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SessionState {
    ConnectionTimeout,
    ConnectionLost,
    ConnectFailed,
    Disconnected,
    Connected,
    Refused(ConnectReturnCode),
}

impl SessionState {
    pub fn code(&self) -> i8 {
        match self {
            Self::ConnectionTimeout => -4,
            Self::ConnectionLost => -3,
            Self::ConnectFailed => -2,
            Self::Disconnected => -1,
            Self::Connected => 0,
            Self::Refused(rc) => rc.code() as i8,
        }
    }

    fn from_reason(reason: &ReasonCode) -> Self {
        match ConnectReturnCode::from_reason(reason) {
            Some(rc) => Self::Refused(rc),
            None => Self::ConnectFailed,
        }
    }
}

#[derive(Debug)]
pub enum MqttError<E> {
    Transport(E),
    Broker(ReasonCode),
    Timeout,
    PacketTooLarge,
    NotConnected,
}

/// A QoS 0 publishing session over any [`Transport`], speaking MQTT 5
/// through `rust-mqtt`.
///
/// `connect` and the keep-alive ping wait for the broker, bounded by
/// `response_timeout_ms`. Everything else returns as soon as the bytes are
/// written.
pub struct MqttClient<T: Transport> {
    transport: T,
    options: SessionOptions,
    connected: bool,
    state: SessionState,
    last_out: u64,
    tx: [u8; MAX_PACKET_SIZE],
    rx: [u8; RX_BUFFER_SIZE],
}

impl<T: Transport> MqttClient<T> {
    pub fn new(transport: T, options: SessionOptions) -> Self {
        Self {
            transport,
            options,
            connected: false,
            state: SessionState::Disconnected,
            last_out: 0,
            tx: [0; MAX_PACKET_SIZE],
            rx: [0; RX_BUFFER_SIZE],
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.options.response_timeout_ms)
    }

    /// Open the transport and run the CONNECT / CONNACK exchange
    pub async fn connect(&mut self, client_id: &str, now: u64) -> Result<(), MqttError<T::Error>> {
        self.reset(SessionState::Disconnected);

        if let Err(e) = self.transport.open(self.options.host, self.options.port).await {
            self.state = SessionState::ConnectFailed;
            return Err(MqttError::Transport(e));
        }

        let mut config =
            ClientConfig::<MAX_PROPERTIES, _>::new(MqttVersion::MQTTv5, CountingRng(0));
        config.keep_alive = self.options.keep_alive_secs;
        config.max_packet_size = MAX_PACKET_SIZE as u32;
        config.add_client_id(client_id);
        if let Some((username, password)) = self.options.credentials {
            config.add_username(username);
            config.add_password(password);
        }

        let timeout = self.response_timeout();
        let outcome = {
            let mut raw = RawClient::<_, MAX_PROPERTIES, _>::new(
                &mut self.transport,
                &mut self.tx,
                MAX_PACKET_SIZE,
                &mut self.rx,
                RX_BUFFER_SIZE,
                config,
            );
            with_timeout(timeout, raw.connect_to_broker()).await
        };

        match outcome {
            Ok(Ok(())) => {
                self.connected = true;
                self.state = SessionState::Connected;
                self.last_out = now;
                Ok(())
            }
            Ok(Err(reason)) => {
                log::debug!("CONNACK: {:?}", reason);
                self.reset(SessionState::from_reason(&reason));
                Err(MqttError::Broker(reason))
            }
            Err(_) => {
                self.reset(SessionState::ConnectionTimeout);
                Err(MqttError::Timeout)
            }
        }
    }

    pub async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        now: u64,
    ) -> Result<(), MqttError<T::Error>> {
        if !self.connected {
            return Err(MqttError::NotConnected);
        }
        if topic.len() + payload.len() + PUBLISH_OVERHEAD > MAX_PACKET_SIZE {
            return Err(MqttError::PacketTooLarge);
        }

        let sent = {
            let mut raw = self.raw_client();
            raw.send_message(topic, payload, QualityOfService::QoS0, false)
                .await
        };

        if let Err(reason) = sent {
            self.reset(SessionState::ConnectionLost);
            return Err(MqttError::Broker(reason));
        }
        self.last_out = now;
        Ok(())
    }

    /// Drop the session without talking to the broker, e.g. after the network
    /// went away. Returns the state the session ended in, if one was up.
    pub fn abandon(&mut self) -> Option<SessionState> {
        if self.connected {
            Some(self.close(SessionState::ConnectionLost))
        } else {
            None
        }
    }

    /// Notice a broker hang up and keep the session alive. Returns the state
    /// the session ended in if this poll closed it.
    pub async fn poll(&mut self, now: u64) -> Option<SessionState> {
        if !self.connected {
            return None;
        }

        let mut chunk = [0u8; READ_CHUNK];
        let polled = poll_once(self.transport.read(&mut chunk));
        match polled {
            Poll::Pending => {}
            Poll::Ready(Ok(0)) => {
                log::debug!("broker closed the connection");
                return Some(self.close(SessionState::ConnectionLost));
            }
            Poll::Ready(Ok(n)) => log::trace!("discarding {} unsolicited bytes", n),
            Poll::Ready(Err(e)) => {
                log::debug!("read error: {:?}", e);
                return Some(self.close(SessionState::ConnectionLost));
            }
        }

        let keep_alive = self.options.keep_alive_secs as u64 * 1000;
        if keep_alive == 0 || now.saturating_sub(self.last_out) < keep_alive {
            return None;
        }

        let timeout = self.response_timeout();
        let pinged = {
            let mut raw = self.raw_client();
            with_timeout(timeout, raw.send_ping()).await
        };
        match pinged {
            Ok(Ok(())) => {
                self.last_out = now;
                None
            }
            Ok(Err(reason)) => {
                log::debug!("ping failed: {:?}", reason);
                Some(self.close(SessionState::ConnectionLost))
            }
            Err(_) => Some(self.close(SessionState::ConnectionTimeout)),
        }
    }

    /// A client over the open connection, for packets that need no CONNECT
    /// settings. Session state lives with the broker, so one per operation is enough.
    fn raw_client(&mut self) -> RawClient<'_, &mut T, MAX_PROPERTIES, CountingRng> {
        let config = ClientConfig::new(MqttVersion::MQTTv5, CountingRng(0));
        RawClient::new(
            &mut self.transport,
            &mut self.tx,
            MAX_PACKET_SIZE,
            &mut self.rx,
            RX_BUFFER_SIZE,
            config,
        )
    }

    fn close(&mut self, state: SessionState) -> SessionState {
        self.reset(state);
        state
    }

    fn reset(&mut self, state: SessionState) {
        self.transport.close();
        self.connected = false;
        self.state = state;
    }
}

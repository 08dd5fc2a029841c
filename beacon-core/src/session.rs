use core::fmt::Write as _;

use beacon_mqtt::{MqttClient, MqttError};
use beacon_traits::Transport;
use heapless::String;

use crate::config::Config;

const CLIENT_ID_LEN: usize = 40;

/// Owns the MQTT client and decides when to (re)connect it.
///
/// A failed attempt is retried `mqtt_retry_ms` later with no ceiling. A
/// session that drops after being established is retried on the next poll.
pub struct SessionSupervisor<T: Transport> {
    client: MqttClient<T>,
    client_id: String<CLIENT_ID_LEN>,
    topic: &'static str,
    retry_ms: u64,
    retry_at: u64,
}

impl<T: Transport> SessionSupervisor<T> {
    pub fn new(transport: T, config: &Config, hardware_id: u32) -> Self {
        let mut client_id = String::new();
        if write!(client_id, "{}{:x}", config.client_id_prefix, hardware_id).is_err() {
            log::warn!("[mqtt] client id prefix too long, using the hardware id alone");
            client_id.clear();
            let _ = write!(client_id, "{:x}", hardware_id);
        }

        Self {
            client: MqttClient::new(transport, config.session_options()),
            client_id,
            topic: config.mqtt_topic,
            retry_ms: config.mqtt_retry_ms,
            retry_at: 0,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client(&self) -> &MqttClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut MqttClient<T> {
        &mut self.client
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Start an attempt if one is due, then service the client.
    /// Returns whether the session is up.
    pub async fn poll(&mut self, now: u64) -> bool {
        if !self.client.is_connected() {
            if now < self.retry_at {
                return false;
            }
            log::info!("[mqtt] connecting as {}", self.client_id);
            match self.client.connect(&self.client_id, now).await {
                Ok(()) => log::info!("[mqtt] connected"),
                Err(e) => {
                    log::warn!("[mqtt] failed, rc={} ({:?})", self.client.state().code(), e);
                    self.retry_at = now + self.retry_ms;
                    return false;
                }
            }
        }

        if let Some(state) = self.client.poll(now).await {
            log::warn!("[mqtt] session lost, rc={}", state.code());
            self.retry_at = now;
        }
        self.client.is_connected()
    }

    /// The network went away underneath the session
    pub fn network_lost(&mut self, now: u64) {
        if self.client.abandon().is_some() {
            log::warn!("[mqtt] network lost, dropping session");
            self.retry_at = now;
        }
    }

    pub async fn publish(&mut self, payload: &[u8], now: u64) -> Result<(), MqttError<T::Error>> {
        let result = self.client.publish(self.topic, payload, now).await;
        if result.is_err() && !self.client.is_connected() {
            // the write failed and took the session with it
            self.retry_at = now;
        }
        result
    }
}

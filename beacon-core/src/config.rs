use beacon_mqtt::SessionOptions;

/// Everything the firmware needs to know, fixed at compile time.
///
/// String settings can be overridden by setting the matching `BEACON_*`
/// environment variable when building.
#[derive(Debug, Copy, Clone)]
pub struct Config {
    pub wifi_ssid: &'static str,
    pub wifi_password: &'static str,
    pub hostname: &'static str,

    pub mqtt_host: &'static str,
    pub mqtt_port: u16,
    pub mqtt_topic: &'static str,
    pub mqtt_username: Option<&'static str>,
    pub mqtt_password: Option<&'static str>,
    /// The hardware id is appended in hex
    pub client_id_prefix: &'static str,
    pub keep_alive_secs: u16,

    pub publish_interval_ms: u64,
    pub wifi_timeout_ms: u64,
    pub wifi_retry_ms: u64,
    pub mqtt_retry_ms: u64,
    /// Bound on waiting for CONNACK or PINGRESP
    pub mqtt_connect_timeout_ms: u64,

    pub gps_baud: u32,
    /// Warn once if the receiver has sent next to nothing by this uptime
    pub nmea_silence_ms: u64,
}

impl Config {
    pub const fn compiled() -> Self {
        Self {
            wifi_ssid: env_or(option_env!("BEACON_WIFI_SSID"), "gps-beacon"),
            wifi_password: env_or(option_env!("BEACON_WIFI_PASSWORD"), "password"),
            hostname: env_or(option_env!("BEACON_HOSTNAME"), "tbeam-gps"),

            mqtt_host: env_or(option_env!("BEACON_MQTT_HOST"), "test.mosquitto.org"),
            mqtt_port: parse_u16(option_env!("BEACON_MQTT_PORT"), 1883),
            mqtt_topic: env_or(option_env!("BEACON_MQTT_TOPIC"), "gps-beacon/status"),
            mqtt_username: option_env!("BEACON_MQTT_USERNAME"),
            mqtt_password: option_env!("BEACON_MQTT_PASSWORD"),
            client_id_prefix: env_or(option_env!("BEACON_CLIENT_PREFIX"), "TBeamClient-"),
            keep_alive_secs: 15,

            publish_interval_ms: 5_000,
            wifi_timeout_ms: 30_000,
            wifi_retry_ms: 5_000,
            mqtt_retry_ms: 2_000,
            mqtt_connect_timeout_ms: 15_000,

            gps_baud: 9_600,
            nmea_silence_ms: 60_000,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            host: self.mqtt_host,
            port: self.mqtt_port,
            keep_alive_secs: self.keep_alive_secs,
            response_timeout_ms: self.mqtt_connect_timeout_ms,
            credentials: match (self.mqtt_username, self.mqtt_password) {
                (Some(username), password) => Some((username, password.unwrap_or(""))),
                (None, _) => None,
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::compiled()
    }
}

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(value) => value,
        None => default,
    }
}

const fn parse_u16(value: Option<&'static str>, default: u16) -> u16 {
    let bytes = match value {
        Some(value) => value.as_bytes(),
        None => return default,
    };
    if bytes.is_empty() {
        return default;
    }

    let mut acc: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if !b.is_ascii_digit() {
            return default;
        }
        acc = acc * 10 + (b - b'0') as u32;
        if acc > u16::MAX as u32 {
            return default;
        }
        i += 1;
    }
    acc as u16
}

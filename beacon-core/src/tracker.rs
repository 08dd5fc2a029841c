use beacon_nmea::{DecoderStats, FixSnapshot, NmeaDecoder};
use beacon_traits::{Network, SerialSource, Transport};

use crate::config::Config;
use crate::link::WifiSupervisor;
use crate::payload::StatusPayload;
use crate::publisher::PublishTimer;
use crate::session::SessionSupervisor;

const SERIAL_CHUNK: usize = 64;
/// Cap on serial reads per step so a babbling UART cannot starve the rest
const MAX_SERIAL_READS: usize = 16;
/// Fewer characters than this by `nmea_silence_ms` means the receiver is not talking
const MIN_NMEA_CHARS: u32 = 10;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub published: u32,
    pub publish_failures: u32,
    /// Intervals that elapsed while WiFi or the broker was down
    pub skipped: u32,
}

/// The whole firmware as one owned context. Call [`Tracker::step`] from the
/// main loop with the millisecond uptime.
pub struct Tracker<S: SerialSource, N: Network, T: Transport> {
    config: Config,
    serial: S,
    decoder: NmeaDecoder,
    wifi: WifiSupervisor<N>,
    session: SessionSupervisor<T>,
    publish_timer: PublishTimer,
    stats: TrackerStats,
    silence_checked: bool,
}

impl<S: SerialSource, N: Network, T: Transport> Tracker<S, N, T> {
    pub fn new(config: Config, serial: S, network: N, transport: T, hardware_id: u32) -> Self {
        Self {
            serial,
            decoder: NmeaDecoder::new(),
            wifi: WifiSupervisor::new(network, &config),
            session: SessionSupervisor::new(transport, &config, hardware_id),
            publish_timer: PublishTimer::new(config.publish_interval_ms),
            stats: TrackerStats::default(),
            silence_checked: false,
            config,
        }
    }

    pub fn fix(&self) -> &FixSnapshot {
        self.decoder.fix()
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    pub fn wifi(&self) -> &WifiSupervisor<N> {
        &self.wifi
    }

    pub fn wifi_mut(&mut self) -> &mut WifiSupervisor<N> {
        &mut self.wifi
    }

    pub fn session(&self) -> &SessionSupervisor<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionSupervisor<T> {
        &mut self.session
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    /// One loop iteration: GPS intake, connectivity upkeep, then publish if due
    pub async fn step(&mut self, now: u64) {
        self.drain_serial();
        if self.decoder.fix_mut().take_location_updated() {
            log_fix(self.decoder.fix());
        }

        let associated = self.wifi.poll(now);
        let connected = if associated {
            self.session.poll(now).await
        } else {
            self.session.network_lost(now);
            false
        };

        if self.publish_timer.due(now) {
            if connected {
                self.publish(now).await;
            } else {
                log::info!("[pub] no WiFi/MQTT, skipping publish");
                self.stats.skipped += 1;
            }
        }

        self.check_nmea_silence(now);
    }

    fn drain_serial(&mut self) {
        let mut buf = [0u8; SERIAL_CHUNK];
        for _ in 0..MAX_SERIAL_READS {
            let n = self.serial.read_available(&mut buf);
            if n == 0 {
                break;
            }
            for &b in &buf[..n] {
                self.decoder.encode(b);
            }
        }
    }

    async fn publish(&mut self, now: u64) {
        let payload = StatusPayload::from_fix(self.decoder.fix(), now);
        let bytes = match payload.to_vec() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("[pub] could not serialize payload: {:?}", e);
                self.stats.publish_failures += 1;
                return;
            }
        };

        match self.session.publish(&bytes, now).await {
            Ok(()) => {
                log::info!(
                    "[pub] {}",
                    core::str::from_utf8(&bytes).unwrap_or("<invalid utf-8>")
                );
                self.stats.published += 1;
            }
            Err(e) => {
                log::warn!(
                    "[pub] publish failed: {:?}, rc={}",
                    e,
                    self.session.client().state().code()
                );
                self.stats.publish_failures += 1;
            }
        }
    }

    fn check_nmea_silence(&mut self, now: u64) {
        if self.silence_checked || now <= self.config.nmea_silence_ms {
            return;
        }
        self.silence_checked = true;

        if self.decoder.stats().chars_processed < MIN_NMEA_CHARS {
            log::warn!(
                "[gps] no NMEA after {}s, check antenna, baud rate ({}) and pins",
                self.config.nmea_silence_ms / 1000,
                self.config.gps_baud
            );
        }
    }
}

fn log_fix(fix: &FixSnapshot) {
    let sats = fix.satellites.value().unwrap_or(0);
    let hdop = fix.hdop.value().unwrap_or(0.0);

    match fix.location.value() {
        Some((lat, lon)) => log::info!(
            "[gps] fix: lat {:.6}, lon {:.6}, alt {:.2}, sats {}, hdop {:.2}",
            lat,
            lon,
            fix.altitude.value().unwrap_or(0.0),
            sats,
            hdop
        ),
        None => log::info!("[gps] no fix: sats {}, hdop {:.2}", sats, hdop),
    }
}

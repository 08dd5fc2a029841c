use beacon_nmea::FixSnapshot;
use heapless::Vec;
use serde::Serialize;

pub const PAYLOAD_CAPACITY: usize = 256;

/// Reported when the receiver has not produced an HDOP yet
pub const NO_FIX_HDOP: f64 = 99.99;

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GpsStatus {
    GpsOk,
    NoFix,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadError {
    BufferFull,
}

/// The JSON document published every interval.
///
/// Without a fix `lat`, `lon` and `alt` are 0.0, `sats` falls back to 0 and
/// `hdop` to [`NO_FIX_HDOP`].
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct StatusPayload {
    /// Seconds since boot
    pub ts: u32,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub sats: u32,
    pub hdop: f64,
    pub status: GpsStatus,
}

impl StatusPayload {
    pub fn from_fix(fix: &FixSnapshot, uptime_ms: u64) -> Self {
        let sats = fix.satellites.value().unwrap_or(0);
        let hdop = fix.hdop.value().map_or(NO_FIX_HDOP, |h| round_to(h, 100.0));
        let ts = (uptime_ms / 1000) as u32;

        match fix.location.value() {
            Some((lat, lon)) => Self {
                ts,
                lat: round_to(lat, 1e6),
                lon: round_to(lon, 1e6),
                alt: fix.altitude.value().map_or(0.0, |a| round_to(a, 100.0)),
                sats,
                hdop,
                status: GpsStatus::GpsOk,
            },
            None => Self {
                ts,
                lat: 0.0,
                lon: 0.0,
                alt: 0.0,
                sats,
                hdop,
                status: GpsStatus::NoFix,
            },
        }
    }

    /// Serialize into a bounded buffer. A document that does not fit is an
    /// error, never a truncated payload.
    pub fn to_vec(&self) -> Result<Vec<u8, PAYLOAD_CAPACITY>, PayloadError> {
        serde_json_core::to_vec(self).map_err(|_| PayloadError::BufferFull)
    }
}

fn round_to(value: f64, scale: f64) -> f64 {
    libm::round(value * scale) / scale
}

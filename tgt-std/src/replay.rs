use std::time::Instant;

use anyhow::Context;
use beacon_traits::SerialSource;

/// A short drive used when no capture is given
const BUILTIN_TRACK: &[u8] = include_bytes!("track.nmea");

/// Plays an NMEA capture back in a loop, no faster than a UART at `baud` would
pub struct ReplaySerial {
    data: Vec<u8>,
    position: usize,
    bytes_per_sec: u64,
    started: Instant,
    delivered: u64,
}

impl ReplaySerial {
    fn new(data: Vec<u8>, baud: u32) -> Self {
        Self {
            data,
            position: 0,
            // 8N1 framing, ten bits on the wire per byte
            bytes_per_sec: (baud as u64 / 10).max(1),
            started: Instant::now(),
            delivered: 0,
        }
    }

    /// Replay the file named by `BEACON_NMEA_FILE`, or the built-in track
    pub fn from_env(baud: u32) -> anyhow::Result<Self> {
        let data = match std::env::var("BEACON_NMEA_FILE") {
            Ok(path) => {
                let data = std::fs::read(&path)
                    .with_context(|| format!("reading NMEA capture {}", path))?;
                log::info!("[gps] replaying {} ({} bytes)", path, data.len());
                data
            }
            Err(_) => {
                log::info!("[gps] replaying built-in track");
                BUILTIN_TRACK.to_vec()
            }
        };
        anyhow::ensure!(!data.is_empty(), "NMEA capture is empty");

        Ok(Self::new(data, baud))
    }
}

impl SerialSource for ReplaySerial {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        let allowed = elapsed_ms * self.bytes_per_sec / 1000;
        let budget = allowed.saturating_sub(self.delivered) as usize;

        let n = buf.len().min(budget);
        for slot in &mut buf[..n] {
            *slot = self.data[self.position];
            self.position = (self.position + 1) % self.data.len();
        }
        self.delivered += n as u64;
        n
    }
}

use beacon_traits::Network;

use crate::config::Config;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkState {
    Disconnected { retry_at: u64 },
    Connecting { since: u64 },
    Connected,
}

/// Keeps the station associated without ever blocking the loop.
///
/// An attempt that has not associated after `wifi_timeout_ms` is abandoned
/// and retried `wifi_retry_ms` later. Losing an established association
/// retries straight away.
pub struct WifiSupervisor<N: Network> {
    network: N,
    state: LinkState,
    ssid: &'static str,
    password: &'static str,
    timeout_ms: u64,
    retry_ms: u64,
}

impl<N: Network> WifiSupervisor<N> {
    pub fn new(network: N, config: &Config) -> Self {
        Self {
            network,
            state: LinkState::Disconnected { retry_at: 0 },
            ssid: config.wifi_ssid,
            password: config.wifi_password,
            timeout_ms: config.wifi_timeout_ms,
            retry_ms: config.wifi_retry_ms,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Advance the state machine, returns whether the station is associated
    pub fn poll(&mut self, now: u64) -> bool {
        match self.state {
            LinkState::Connected => {
                if !self.network.is_associated() {
                    log::warn!("[wifi] association lost");
                    self.state = LinkState::Disconnected { retry_at: now };
                }
            }
            LinkState::Disconnected { retry_at } => {
                if now >= retry_at {
                    self.begin(now);
                }
            }
            LinkState::Connecting { since } => self.check_progress(since, now),
        }
        self.state == LinkState::Connected
    }

    fn begin(&mut self, now: u64) {
        log::info!("[wifi] connecting to \"{}\"", self.ssid);
        match self.network.begin(self.ssid, self.password) {
            Ok(()) => {
                self.state = LinkState::Connecting { since: now };
                self.check_progress(now, now);
            }
            Err(e) => {
                log::warn!("[wifi] could not start association: {:?}", e);
                self.state = LinkState::Disconnected {
                    retry_at: now + self.retry_ms,
                };
            }
        }
    }

    fn check_progress(&mut self, since: u64, now: u64) {
        if self.network.is_associated() {
            log::info!("[wifi] connected after {} ms", now - since);
            self.state = LinkState::Connected;
        } else if now.saturating_sub(since) >= self.timeout_ms {
            log::error!("[wifi] failed to connect to \"{}\"", self.ssid);
            log::info!("[wifi] check for a 2.4GHz WPA2 network without band steering or MAC filtering");
            self.state = LinkState::Disconnected {
                retry_at: now + self.retry_ms,
            };
        }
    }
}

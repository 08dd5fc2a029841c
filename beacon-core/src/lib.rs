#![cfg_attr(not(test), no_std)]

mod config;
mod link;
mod payload;
pub mod power;
mod publisher;
mod session;
mod tracker;

pub use config::Config;
pub use link::{LinkState, WifiSupervisor};
pub use payload::{GpsStatus, PayloadError, StatusPayload, NO_FIX_HDOP, PAYLOAD_CAPACITY};
pub use power::{power_up_gps, PmuChip, PmuError};
pub use publisher::PublishTimer;
pub use session::SessionSupervisor;
pub use tracker::{Tracker, TrackerStats};

#[cfg(test)]
mod fakes;

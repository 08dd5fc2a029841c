#![cfg_attr(not(test), no_std)]

mod client;

pub use client::{
    ConnectReturnCode, MqttClient, MqttError, SessionOptions, SessionState, MAX_PACKET_SIZE,
};
pub use rust_mqtt::packet::v5::reason_codes::ReasonCode;

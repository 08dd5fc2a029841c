//! Stand-ins for the hardware seams, shared by the test modules.

use std::collections::{HashMap, VecDeque};

use beacon_traits::{Network, SerialSource, Transport};
use embedded_hal::i2c::{self, ErrorKind as I2cErrorKind, NoAcknowledgeSource, Operation};
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};

pub fn nmea(body: &str) -> String {
    let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${}*{:02X}\r\n", body, checksum)
}

#[derive(Default)]
pub struct FakeSerial {
    pub pending: VecDeque<u8>,
}

impl FakeSerial {
    pub fn push(&mut self, text: &str) {
        self.pending.extend(text.bytes());
    }
}

impl SerialSource for FakeSerial {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.pending.len());
        for (slot, b) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = b;
        }
        n
    }
}

#[derive(Default)]
pub struct FakeNetwork {
    /// Association completes as soon as `begin` is called
    pub associate_on_begin: bool,
    pub associated: bool,
    pub refuse_begin: bool,
    pub begins: usize,
}

impl FakeNetwork {
    pub fn available() -> Self {
        Self {
            associate_on_begin: true,
            ..Default::default()
        }
    }
}

impl Network for FakeNetwork {
    type Error = &'static str;

    fn begin(&mut self, _ssid: &str, _password: &str) -> Result<(), Self::Error> {
        self.begins += 1;
        if self.refuse_begin {
            return Err("radio off");
        }
        if self.associate_on_begin {
            self.associated = true;
        }
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.associated
    }
}

#[derive(Debug)]
pub struct FakeIoError;

impl embedded_io_async::Error for FakeIoError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// An MQTT 5 broker that answers CONNECT with a CONNACK carrying `reason`
pub struct FakeBroker {
    pub reason: u8,
    pub unreachable: bool,
    pub silent: bool,
    /// Reads report end of stream until the next `open`
    pub eof: bool,
    pub open: bool,
    pub opens: usize,
    pub inbound: VecDeque<u8>,
    pub written: Vec<u8>,
}

impl Default for FakeBroker {
    fn default() -> Self {
        Self {
            reason: 0,
            unreachable: false,
            silent: false,
            eof: false,
            open: false,
            opens: 0,
            inbound: VecDeque::new(),
            written: Vec::new(),
        }
    }
}

impl FakeBroker {
    /// (first byte, body) of every packet written so far
    pub fn packets(&self) -> Vec<(u8, Vec<u8>)> {
        let mut packets = Vec::new();
        let mut rest = self.written.as_slice();
        while let Some(&first) = rest.first() {
            let mut remaining = 0usize;
            let mut i = 1;
            loop {
                let digit = rest[i];
                remaining |= ((digit & 0x7F) as usize) << (7 * (i - 1));
                i += 1;
                if digit & 0x80 == 0 {
                    break;
                }
            }
            packets.push((first, rest[i..i + remaining].to_vec()));
            rest = &rest[i + remaining..];
        }
        packets
    }

    /// Decoded JSON bodies of every PUBLISH
    pub fn published(&self) -> Vec<serde_json::Value> {
        self.packets()
            .into_iter()
            .filter(|(first, _)| first & 0xF0 == 0x30)
            .map(|(_, body)| {
                let topic_len = u16::from_be_bytes([body[0], body[1]]) as usize;
                // property block length, always short enough for one byte here
                let properties = body[2 + topic_len] as usize;
                serde_json::from_slice(&body[3 + topic_len + properties..]).unwrap()
            })
            .collect()
    }
}

impl ErrorType for FakeBroker {
    type Error = FakeIoError;
}

impl Read for FakeBroker {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, FakeIoError> {
        if self.eof {
            return Ok(0);
        }
        if self.inbound.is_empty() {
            core::future::pending::<()>().await;
        }
        let n = buf.len().min(self.inbound.len());
        for (slot, b) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }
}

impl Write for FakeBroker {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, FakeIoError> {
        if !self.open {
            return Err(FakeIoError);
        }
        if !self.silent {
            match buf.first().copied() {
                Some(0x10) => self.inbound.extend([0x20, 0x03, 0x00, self.reason, 0x00]),
                Some(0xC0) => self.inbound.extend([0xD0, 0x00]),
                _ => {}
            }
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }
}

impl Transport for FakeBroker {
    async fn open(&mut self, _host: &str, _port: u16) -> Result<(), FakeIoError> {
        self.opens += 1;
        if self.unreachable {
            return Err(FakeIoError);
        }
        self.open = true;
        self.eof = false;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
        self.inbound.clear();
    }
}

/// An I2C bus with register-file devices at fixed addresses
#[derive(Default)]
pub struct FakeBus {
    pub devices: HashMap<u8, [u8; 256]>,
    pointer: u8,
}

impl FakeBus {
    pub fn with_device(address: u8, chip_id: u8) -> Self {
        let mut registers = [0u8; 256];
        registers[0x03] = chip_id;
        let mut bus = Self::default();
        bus.devices.insert(address, registers);
        bus
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.devices[&address][register as usize]
    }

    pub fn set_register(&mut self, address: u8, register: u8, value: u8) {
        self.devices.get_mut(&address).unwrap()[register as usize] = value;
    }
}

impl i2c::ErrorType for FakeBus {
    type Error = I2cErrorKind;
}

impl i2c::I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let Some(registers) = self.devices.get_mut(&address) else {
            return Err(I2cErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        };

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&register, values)) = bytes.split_first() {
                        self.pointer = register;
                        for &value in values {
                            registers[self.pointer as usize] = value;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = registers[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

use core::fmt::Debug;

/// A UART (or anything pretending to be one) carrying NMEA bytes.
pub trait SerialSource {
    /// Copy whatever bytes are already buffered into `buf` without waiting.
    /// Returns the number of bytes copied, 0 when nothing is pending.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
}

/// Station-mode wireless association.
///
/// Both calls must return promptly: `begin` only kicks off an association
/// attempt and `is_associated` is polled on every loop iteration.
pub trait Network {
    type Error: Debug;

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error>;

    /// True once the link is up and has an address, ready for a transport to open.
    fn is_associated(&mut self) -> bool;
}

/// A byte stream to the broker that can be (re)opened in place.
///
/// Reads must be cancel-safe: the MQTT client polls them once and drops the
/// future when no data is ready.
#[allow(async_fn_in_trait)]
pub trait Transport: embedded_io_async::Read + embedded_io_async::Write {
    /// Open a stream to `host:port`, replacing any stream already open
    async fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error>;

    fn close(&mut self);
}

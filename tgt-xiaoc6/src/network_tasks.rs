use embassy_net::dns::{self, DnsQueryType};
use embassy_net::tcp::{self, ConnectError, TcpSocket};
use embassy_net::{Runner, Stack};
use embassy_time::Duration;
use embedded_io_async::{ErrorKind, ErrorType, Read, Write};
use esp_wifi::wifi::{
    ClientConfiguration, Configuration, WifiController, WifiDevice, WifiError, WifiStaDevice,
};

use beacon_traits::{Network, Transport};

/// Drop a connection the broker has stopped acknowledging
const SOCKET_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub enum LinkError {
    /// SSID or password too long for the driver
    BadCredentials,
    Wifi(WifiError),
}

/// Station mode WiFi. Associated means joined and holding a DHCP lease.
pub struct StationLink {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl StationLink {
    pub fn new(controller: WifiController<'static>, stack: Stack<'static>) -> Self {
        Self { controller, stack }
    }
}

impl Network for StationLink {
    type Error = LinkError;

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkError::BadCredentials)?,
            password: password.try_into().map_err(|_| LinkError::BadCredentials)?,
            ..Default::default()
        });

        if matches!(self.controller.is_started(), Ok(true)) {
            // a stale attempt may still be in flight
            let _ = self.controller.disconnect();
        }
        self.controller
            .set_configuration(&config)
            .map_err(LinkError::Wifi)?;
        if !matches!(self.controller.is_started(), Ok(true)) {
            self.controller.start().map_err(LinkError::Wifi)?;
        }
        self.controller.connect().map_err(LinkError::Wifi)
    }

    fn is_associated(&mut self) -> bool {
        matches!(self.controller.is_connected(), Ok(true)) && self.stack.is_config_up()
    }
}

#[derive(Debug)]
pub enum TransportError {
    Dns(dns::Error),
    NoAddress,
    Connect(ConnectError),
    Tcp(tcp::Error),
    NotConnected,
}

impl embedded_io_async::Error for TransportError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Tcp(e) => e.kind(),
            Self::NotConnected => ErrorKind::NotConnected,
            Self::Connect(_) => ErrorKind::ConnectionRefused,
            Self::Dns(_) | Self::NoAddress => ErrorKind::AddrNotAvailable,
        }
    }
}

/// The one TCP socket the MQTT session runs over, reused across reconnects
pub struct EspTransport {
    stack: Stack<'static>,
    socket: TcpSocket<'static>,
    open: bool,
}

impl EspTransport {
    pub fn new(
        stack: Stack<'static>,
        rx_buffer: &'static mut [u8],
        tx_buffer: &'static mut [u8],
    ) -> Self {
        let mut socket = TcpSocket::new(stack, rx_buffer, tx_buffer);
        socket.set_timeout(Some(SOCKET_TIMEOUT));
        Self {
            stack,
            socket,
            open: false,
        }
    }
}

impl ErrorType for EspTransport {
    type Error = TransportError;
}

impl Read for EspTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.socket.read(buf).await.map_err(TransportError::Tcp)
    }
}

impl Write for EspTransport {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.socket.write(buf).await.map_err(TransportError::Tcp)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        if !self.open {
            return Err(TransportError::NotConnected);
        }
        self.socket.flush().await.map_err(TransportError::Tcp)
    }
}

impl Transport for EspTransport {
    async fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error> {
        self.close();

        let addresses = self
            .stack
            .dns_query(host, DnsQueryType::A)
            .await
            .map_err(TransportError::Dns)?;
        let address = addresses.first().copied().ok_or(TransportError::NoAddress)?;
        log::debug!("{} resolved to {}", host, address);

        self.socket
            .connect((address, port))
            .await
            .map_err(TransportError::Connect)?;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.socket.abort();
        self.open = false;
    }
}

#[embassy_executor::task]
pub async fn net_task(mut runner: Runner<'static, WifiDevice<'static, WifiStaDevice>>) {
    runner.run().await
}

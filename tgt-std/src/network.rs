use core::convert::Infallible;
use core::net::SocketAddr;
use std::io;

use edge_net::nal::{AddrType, Dns, TcpConnect};
use edge_net::std::Stack;
use embedded_io_async::{ErrorType, Read, Write};

use beacon_traits::{Network, Transport};

type Socket = <Stack as TcpConnect>::Socket<'static>;

/// The host is already on a network, association always succeeds
pub struct HostNetwork {
    started: bool,
}

impl HostNetwork {
    pub fn new() -> Self {
        Self { started: false }
    }
}

impl Network for HostNetwork {
    type Error = Infallible;

    fn begin(&mut self, ssid: &str, _password: &str) -> Result<(), Self::Error> {
        log::debug!("host network stands in for \"{}\"", ssid);
        self.started = true;
        Ok(())
    }

    fn is_associated(&mut self) -> bool {
        self.started
    }
}

/// One TCP connection at a time over the std stack
pub struct HostTransport {
    stack: &'static Stack,
    socket: Option<Socket>,
}

impl HostTransport {
    pub fn new(stack: &'static Stack) -> Self {
        Self {
            stack,
            socket: None,
        }
    }

    fn socket(&mut self) -> Result<&mut Socket, io::Error> {
        self.socket
            .as_mut()
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotConnected))
    }
}

impl ErrorType for HostTransport {
    type Error = io::Error;
}

impl Read for HostTransport {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket()?.read(buf).await
    }
}

impl Write for HostTransport {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket()?.write(buf).await
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket()?.flush().await
    }
}

impl Transport for HostTransport {
    async fn open(&mut self, host: &str, port: u16) -> Result<(), Self::Error> {
        self.close();

        let ip = self.stack.get_host_by_name(host, AddrType::IPv4).await?;
        log::debug!("{} resolved to {}", host, ip);

        let socket = self.stack.connect(SocketAddr::new(ip, port)).await?;
        self.socket = Some(socket);
        Ok(())
    }

    fn close(&mut self) {
        self.socket = None;
    }
}

//! GPS beacon firmware for the XIAO ESP32-C6: NMEA in on UART1, JSON status
//! out over MQTT.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_net::{DhcpConfig, StackResources};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{Duration, Instant, Timer};

use esp_backtrace as _;
use esp_hal::{
    clock::CpuClock,
    efuse::Efuse,
    i2c::master::{Config as I2cConfig, I2c},
    rng::Rng,
    timer::{systimer::SystemTimer, timg::TimerGroup},
    uart::{Config as UartConfig, Uart, UartRx},
    Async,
};
use esp_wifi::wifi::WifiStaDevice;

use esp_alloc as _;
use static_cell::StaticCell;

use beacon_core::{power_up_gps, Config, Tracker};
use beacon_traits::SerialSource;

mod network_tasks;

use crate::network_tasks::{net_task, EspTransport, StationLink};

const LOOP_PERIOD: Duration = Duration::from_millis(10);
const GPS_PIPE_SIZE: usize = 512;
const SOCKET_BUFFER_SIZE: usize = 1024;

/// UART bytes on their way from the reader task to the main loop
static GPS_PIPE: Pipe<CriticalSectionRawMutex, GPS_PIPE_SIZE> = Pipe::new();

struct PipeSerial(&'static Pipe<CriticalSectionRawMutex, GPS_PIPE_SIZE>);

impl SerialSource for PipeSerial {
    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        self.0.try_read(buf).unwrap_or(0)
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    esp_alloc::heap_allocator!(72 * 1024);

    let systimer = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(systimer.alarm0);

    let beacon = Config::compiled();

    // The PMU gates the GPS supply on T-Beam style boards, do this first
    match I2c::new(peripherals.I2C0, I2cConfig::default()) {
        Ok(i2c) => {
            let mut i2c = i2c.with_sda(peripherals.GPIO22).with_scl(peripherals.GPIO23);
            power_up_gps(&mut i2c);
        }
        Err(e) => log::warn!("[pmu] I2C setup failed: {:?}", e),
    }

    let uart_config = UartConfig::default().with_baudrate(beacon.gps_baud);
    let uart = Uart::new(peripherals.UART1, uart_config)
        .unwrap()
        .with_rx(peripherals.GPIO17)
        .with_tx(peripherals.GPIO16)
        .into_async();
    let (uart_rx, _uart_tx) = uart.split();
    spawner.spawn(gps_task(uart_rx)).ok();

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let mut rng = Rng::new(peripherals.RNG);

    static INIT: StaticCell<esp_wifi::EspWifiController<'static>> = StaticCell::new();
    let init = INIT.init(esp_wifi::init(timg0.timer0, rng.clone(), peripherals.RADIO_CLK).unwrap());

    let (wifi_interface, controller) =
        esp_wifi::wifi::new_with_mode(&*init, peripherals.WIFI, WifiStaDevice).unwrap();

    let mut dhcp = DhcpConfig::default();
    dhcp.hostname = beacon.hostname.try_into().ok();
    let net_config = embassy_net::Config::dhcpv4(dhcp);

    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    static RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    let (stack, runner) = embassy_net::new(
        wifi_interface,
        net_config,
        RESOURCES.init(StackResources::new()),
        seed,
    );
    spawner.spawn(net_task(runner)).ok();

    static RX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();
    static TX_BUFFER: StaticCell<[u8; SOCKET_BUFFER_SIZE]> = StaticCell::new();
    let transport = EspTransport::new(
        stack,
        RX_BUFFER.init([0; SOCKET_BUFFER_SIZE]),
        TX_BUFFER.init([0; SOCKET_BUFFER_SIZE]),
    );

    let mac = Efuse::read_base_mac_address();
    let hardware_id = u32::from_le_bytes([mac[0], mac[1], mac[2], mac[3]]);

    let mut tracker = Tracker::new(
        beacon,
        PipeSerial(&GPS_PIPE),
        StationLink::new(controller, stack),
        transport,
        hardware_id,
    );
    log::info!(
        "[boot] {} publishing to {}:{} every {} ms",
        beacon.hostname,
        beacon.mqtt_host,
        beacon.mqtt_port,
        beacon.publish_interval_ms
    );

    loop {
        tracker.step(Instant::now().as_millis()).await;
        Timer::after(LOOP_PERIOD).await;
    }
}

#[embassy_executor::task]
async fn gps_task(mut rx: UartRx<'static, Async>) {
    let mut buf = [0u8; 64];
    loop {
        match rx.read_async(&mut buf).await {
            Ok(n) => GPS_PIPE.write_all(&buf[..n]).await,
            Err(e) => log::warn!("[gps] UART read failed: {:?}", e),
        }
    }
}

// Host build of the beacon: NMEA comes from a replayed file, "WiFi" is the
// host's own network and MQTT goes over a real TCP socket.

use embassy_executor::Executor;
use embassy_time::{Duration, Instant, Timer};

use edge_net::std::Stack;
use static_cell::StaticCell;

use beacon_core::{Config, Tracker};

mod network;
mod replay;

use network::{HostNetwork, HostTransport};
use replay::ReplaySerial;

const LOOP_PERIOD: Duration = Duration::from_millis(10);

type HostTracker = Tracker<ReplaySerial, HostNetwork, HostTransport>;

/// Stable per-machine id for the MQTT client name
fn hardware_id(config: &Config) -> u32 {
    let name = std::env::var("HOSTNAME").unwrap_or_else(|_| config.hostname.into());
    let digest = md5::compute(name.as_bytes());
    u32::from_le_bytes([digest.0[0], digest.0[1], digest.0[2], digest.0[3]])
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_millis()
        .parse_default_env()
        .init();

    let config = Config::compiled();
    let serial = ReplaySerial::from_env(config.gps_baud)?;

    static STACK: StaticCell<Stack> = StaticCell::new();
    let stack = STACK.init(Stack::new());

    let tracker = Tracker::new(
        config,
        serial,
        HostNetwork::new(),
        HostTransport::new(stack),
        hardware_id(&config),
    );
    log::info!(
        "[boot] publishing to {}:{} on \"{}\" every {} ms",
        config.mqtt_host,
        config.mqtt_port,
        config.mqtt_topic,
        config.publish_interval_ms
    );

    static TRACKER: StaticCell<HostTracker> = StaticCell::new();
    let tracker = TRACKER.init(tracker);

    static EXECUTOR: StaticCell<Executor> = StaticCell::new();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        if spawner.spawn(tracker_task(tracker)).is_err() {
            log::warn!("failed to spawn tracker task");
        }
    });
}

#[embassy_executor::task]
async fn tracker_task(tracker: &'static mut HostTracker) -> ! {
    loop {
        tracker.step(Instant::now().as_millis()).await;
        Timer::after(LOOP_PERIOD).await;
    }
}

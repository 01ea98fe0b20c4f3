//! IntelliVend Firmware — Main Entry Point
//!
//! Hexagonal architecture: the dispense core is pure logic behind port
//! traits, and everything that touches the outside world is an adapter.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink    NvsAdapter    Esp32Time     │
//! │  (ActuatorPort)    (EventSink)     (ConfigPort)  (ClockPort)   │
//! │  WifiAdapter       MqttAdapter + MqttFeedbackSink              │
//! │  (station link)    (broker traffic, EventSink)                 │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            DispenseService (pure logic)                │    │
//! │  │  PumpBank · CalibrationTable · RunState                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Router (topic + JSON validation, outside the core)            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod config;
mod error;
mod pins;

pub mod app;
pub mod bus;
mod adapters;
mod drivers;

// ── Imports ───────────────────────────────────────────────────
use std::time::Duration;

use anyhow::Result;
use log::{error, info, warn};

use adapters::device_id;
use adapters::hardware::HardwareAdapter;
use adapters::log_sink::LogEventSink;
use adapters::mqtt::{MqttAdapter, MqttFeedbackSink};
use adapters::nvs::NvsAdapter;
use adapters::time::Esp32TimeAdapter;
use adapters::wifi::WifiAdapter;
use app::bank::PumpBank;
use app::calibration::CalibrationTable;
use app::commands::AppCommand;
use app::events::AppEvent;
use app::ports::{ClockPort, ConfigError, ConfigPort, EventSink};
use app::service::DispenseService;
use bus::router;
use bus::topics;
use bus::wire::HeartbeatMsg;
use config::SystemConfig;
use drivers::status_led::LedColour;
use drivers::watchdog::Watchdog;
use error::DispenseError;

// ── Event fan-out ─────────────────────────────────────────────
//
// Domain events go to the serial log and the MQTT feedback topics.
// The watchdog is fed on every event: events fire at least once per
// dispense item, so a long multi-item order keeps the TWDT alive even
// though order execution blocks the main loop.

struct DispenseSinks<'a, C: ClockPort> {
    log: &'a mut LogEventSink,
    mqtt: MqttFeedbackSink<'a, C>,
    watchdog: &'a Watchdog,
}

impl<C: ClockPort> EventSink for DispenseSinks<'_, C> {
    fn emit(&mut self, event: &AppEvent) {
        self.watchdog.feed();
        self.log.emit(event);
        self.mqtt.emit(event);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  IntelliVend v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt; the TWDT
        // resets the device after timeout.
        error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    let watchdog = Watchdog::new();

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running without persistence", e);
            None
        }
    };
    let mut config = SystemConfig::default();
    if let Some(nvs) = &nvs {
        match nvs.load() {
            Ok(cfg) => {
                info!("Config loaded from NVS");
                config = cfg;
            }
            Err(ConfigError::NotFound) => {
                info!("First boot — persisting default config");
                if let Err(e) = nvs.save(&config) {
                    warn!("Default config save failed: {}", e);
                }
            }
            Err(e) => warn!("Config load failed ({}), using defaults", e),
        }
    }

    // ── 4. Construct the dispense core ────────────────────────
    let calibration = CalibrationTable::new(config.calibration)?;
    let bank = PumpBank::new(calibration, config.flow_rate_ml_per_sec);
    let mut service = DispenseService::new(&config, bank);

    let mut hw = HardwareAdapter::new();
    let mut clock = Esp32TimeAdapter::new();
    // Separate clock instance for event timestamps — the dispense path
    // borrows `clock` mutably for its timed waits.
    let stamp_clock = Esp32TimeAdapter::new();
    let mut log_sink = LogEventSink::new();

    // ── 5. Device identity ────────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!("Device ID: {}", dev_id);

    // ── 6. Network bring-up ───────────────────────────────────
    hw.set_led(LedColour::Blue);

    #[cfg(target_os = "espidf")]
    let mut wifi = {
        let peripherals = esp_idf_hal::peripherals::Peripherals::take()?;
        let sysloop = esp_idf_svc::eventloop::EspSystemEventLoop::take()?;
        WifiAdapter::new(peripherals.modem, sysloop)?
    };
    #[cfg(not(target_os = "espidf"))]
    let mut wifi = WifiAdapter::new()?;

    wifi.set_credentials(config::WIFI_SSID, config::WIFI_PASSWORD)?;
    if let Err(e) = wifi.connect() {
        // Not fatal — the poll below keeps retrying with backoff.
        warn!("Initial WiFi connect failed ({}), retrying in background", e);
    }

    let mut mqtt = MqttAdapter::connect(config::MQTT_BROKER_URL, dev_id.as_str())?;
    let mut mqtt_subscribed = false;

    info!("System ready. Entering event loop.");

    // ── 7. Event loop ─────────────────────────────────────────
    let heartbeat_interval_ms = u64::from(config.heartbeat_interval_secs) * 1000;
    let mut last_heartbeat_ms: u64 = 0;

    loop {
        // Block briefly on the inbound queue; the timeout gap drives
        // housekeeping (heartbeat, reconnect, watchdog).
        if let Some(msg) = mqtt.recv_timeout(Duration::from_millis(250)) {
            match router::route(&msg.topic, &msg.payload) {
                Ok(Some(command)) => {
                    hw.set_led(LedColour::Cyan);
                    dispatch(
                        command,
                        &mut service,
                        &mut hw,
                        &mut clock,
                        &mut log_sink,
                        &mut mqtt,
                        &stamp_clock,
                        &watchdog,
                    );
                }
                Ok(None) => {}
                Err(e) => warn!("Router: rejected message on '{}': {}", msg.topic, e),
            }
        }

        let now_ms = clock.now_ms();

        // WiFi reconnection poll (exponential backoff).
        wifi.poll(now_ms);

        // (Re-)subscribe whenever the broker session comes up.
        if mqtt.is_connected() {
            if !mqtt_subscribed {
                match mqtt.subscribe_all() {
                    Ok(()) => mqtt_subscribed = true,
                    Err(e) => warn!("MQTT subscribe failed: {}", e),
                }
            }
        } else {
            mqtt_subscribed = false;
        }

        // Retained heartbeat on the configured interval.
        if now_ms.saturating_sub(last_heartbeat_ms) >= heartbeat_interval_ms {
            publish_heartbeat(&mut mqtt, &dev_id, &wifi, &clock, now_ms);
            last_heartbeat_ms = now_ms;
        }

        // Status LED: green = ready, blue = link down.
        if wifi.is_connected() && mqtt.is_connected() {
            hw.set_led(LedColour::Green);
        } else {
            hw.set_led(LedColour::Blue);
        }

        watchdog.feed();
    }
}

// ── Command dispatch ──────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn dispatch(
    command: AppCommand,
    service: &mut DispenseService,
    hw: &mut HardwareAdapter,
    clock: &mut Esp32TimeAdapter,
    log_sink: &mut LogEventSink,
    mqtt: &mut MqttAdapter,
    stamp_clock: &Esp32TimeAdapter,
    watchdog: &Watchdog,
) {
    let mut sink = DispenseSinks {
        log: log_sink,
        mqtt: MqttFeedbackSink::new(mqtt, stamp_clock),
        watchdog,
    };

    match command {
        AppCommand::Dispense(order) => {
            let log_id = order.log_id;
            match service.execute_order(order, hw, clock, &mut sink) {
                Ok(summary) => info!(
                    "Order {} done: {}/{} pumps ok, {} failed",
                    summary.log_id, summary.completed, summary.total, summary.failed
                ),
                Err(DispenseError::Busy) => warn!(
                    "Order {} rejected: dispense already in progress (log_id {:?})",
                    log_id,
                    service.active_log_id()
                ),
                Err(e) => warn!("Order {} rejected: {}", log_id, e),
            }
        }
        AppCommand::PumpControl {
            channel,
            action,
            duration_ms,
        } => {
            if let Err(e) = service.manual_control(channel, action, duration_ms, hw, clock, &mut sink)
            {
                warn!("Manual control pump {} rejected: {}", channel, e);
            }
        }
    }
}

// ── Heartbeat ─────────────────────────────────────────────────

fn publish_heartbeat(
    mqtt: &mut MqttAdapter,
    dev_id: &device_id::DeviceIdString,
    wifi: &WifiAdapter,
    clock: &Esp32TimeAdapter,
    now_ms: u64,
) {
    let heartbeat = HeartbeatMsg {
        device_id: dev_id.as_str().into(),
        status: "online",
        ip_address: wifi.ip_address().as_str().into(),
        wifi_rssi: wifi.rssi().unwrap_or(0),
        uptime_seconds: clock.uptime_secs(),
        free_memory: drivers::hw_init::free_heap_bytes(),
        firmware_version: config::FIRMWARE_VERSION,
        timestamp: now_ms,
    };
    match serde_json::to_vec(&heartbeat) {
        Ok(payload) => {
            if mqtt.publish(topics::DEVICE_STATUS, &payload, true).is_err() {
                warn!("Heartbeat publish failed");
            }
        }
        Err(e) => warn!("Heartbeat serialisation failed: {}", e),
    }
}

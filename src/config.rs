//! System configuration parameters
//!
//! All tunable parameters for the IntelliVend dispenser.
//! Values are loaded from NVS at boot and fall back to defaults on first
//! boot.  Calibration is immutable after init — there is no hot reload.

use serde::{Deserialize, Serialize};

/// Number of pump channels, fixed at build time.
/// Channel ids on the wire are 1-based: `1..=NUM_PUMPS`.
pub const NUM_PUMPS: usize = 8;

/// Firmware version reported in the heartbeat message.
pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// --- MQTT endpoint -------------------------------------------------------
// Broker address can be overridden at build time:
// `INTELLIVEND_MQTT_BROKER=mqtt://10.0.0.2:1883 cargo build`.

pub const MQTT_BROKER_URL: &str = match option_env!("INTELLIVEND_MQTT_BROKER") {
    Some(url) => url,
    None => "mqtt://homeassistant.local:1883",
};

// --- WiFi credentials ----------------------------------------------------
// Baked in at build time the same way: `INTELLIVEND_WIFI_SSID=... \
// INTELLIVEND_WIFI_PASSWORD=... cargo build`.

pub const WIFI_SSID: &str = match option_env!("INTELLIVEND_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "IntelliVend",
};

pub const WIFI_PASSWORD: &str = match option_env!("INTELLIVEND_WIFI_PASSWORD") {
    Some(pw) => pw,
    None => "",
};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Pumps ---
    /// Per-channel calibration factor (requested mL × factor = actuated mL).
    /// Indexed by channel - 1.  All factors must be finite and > 0.
    pub calibration: [f32; NUM_PUMPS],
    /// Nominal pump flow rate (mL/second), system-wide.
    /// Volume is derived from run time at this rate — no flow meter yet.
    pub flow_rate_ml_per_sec: f32,

    // --- Manual control ---
    /// Default run duration (ms) for manual start/test when the message
    /// omits one.
    pub manual_default_duration_ms: u32,

    // --- Timing ---
    /// Heartbeat publish interval (seconds).
    pub heartbeat_interval_secs: u32,
    /// MQTT reconnect attempt interval (seconds).
    pub reconnect_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            calibration: [1.0; NUM_PUMPS],
            flow_rate_ml_per_sec: 10.0,
            manual_default_duration_ms: 3000,
            heartbeat_interval_secs: 30,
            reconnect_interval_secs: 5,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Returns the offending field description
    /// on failure.  Called by the NVS adapter before persisting and after
    /// loading, so a corrupted blob can never inject a zero or negative
    /// calibration factor (which would make run times zero or negative).
    pub fn validate(&self) -> Result<(), &'static str> {
        for factor in &self.calibration {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err("calibration factor must be finite and > 0");
            }
        }
        if !self.flow_rate_ml_per_sec.is_finite() || self.flow_rate_ml_per_sec <= 0.0 {
            return Err("flow rate must be finite and > 0");
        }
        if self.manual_default_duration_ms == 0 {
            return Err("manual default duration must be > 0");
        }
        if self.heartbeat_interval_secs == 0 {
            return Err("heartbeat interval must be > 0");
        }
        if self.reconnect_interval_secs == 0 {
            return Err("reconnect interval must be > 0");
        }
        Ok(())
    }
}

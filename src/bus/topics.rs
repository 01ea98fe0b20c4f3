//! MQTT topic scheme.
//!
//! The topic layout is the contract with the IntelliVend backend — it
//! matches what the Home Assistant integration subscribes to and must not
//! change without a coordinated backend release.

// ── Inbound (subscribed) ──────────────────────────────────────

/// Multi-item dispense orders.
pub const DISPENSE_COMMAND: &str = "intellivend/dispense/command";
/// Manual per-pump control; the `+` segment carries the channel id.
pub const PUMP_CONTROL_FILTER: &str = "intellivend/pump/+/control";
/// Remote config pushes — recognised, not implemented.
pub const CONFIG_UPDATE: &str = "intellivend/config/update";

// ── Outbound (published) ──────────────────────────────────────

/// Order-level progress feedback.
pub const DISPENSE_FEEDBACK: &str = "intellivend/dispense/feedback";
/// Device heartbeat; published retained.
pub const DEVICE_STATUS: &str = "intellivend/esp32/status";

/// Per-pump status topic: `intellivend/esp32/pump/{n}/status`.
pub fn pump_status(channel: u8) -> String {
    format!("intellivend/esp32/pump/{}/status", channel)
}

/// Extract the channel id from a `intellivend/pump/{n}/control` topic.
/// `None` if the topic has a different shape or a non-numeric segment.
pub fn control_channel(topic: &str) -> Option<u8> {
    let rest = topic.strip_prefix("intellivend/pump/")?;
    let (num, tail) = rest.split_once('/')?;
    if tail != "control" {
        return None;
    }
    num.parse().ok()
}

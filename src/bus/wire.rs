//! JSON wire messages.
//!
//! Field names here are the contract with the backend — serde renames are
//! deliberately absent so the struct fields read exactly like the payloads
//! on the wire.

use serde::{Deserialize, Serialize};

use crate::app::commands::{DispenseItem, DispenseOrder};
use crate::app::events::{ChannelEvent, OrderEvent};

// ── Inbound ───────────────────────────────────────────────────

/// Payload of `intellivend/dispense/command`.
#[derive(Debug, Clone, Deserialize)]
pub struct DispenseCommandMsg {
    pub log_id: i64,
    pub commands: Vec<PumpCommandMsg>,
}

/// One entry of a dispense order.
#[derive(Debug, Clone, Deserialize)]
pub struct PumpCommandMsg {
    pub pump_number: u8,
    pub quantity_ml: f32,
    #[serde(default)]
    pub ingredient: Option<String>,
}

impl From<DispenseCommandMsg> for DispenseOrder {
    fn from(msg: DispenseCommandMsg) -> Self {
        Self {
            log_id: msg.log_id,
            items: msg
                .commands
                .into_iter()
                .map(|c| DispenseItem {
                    channel: c.pump_number,
                    volume_ml: c.quantity_ml,
                    ingredient: c.ingredient.unwrap_or_else(|| String::from("Unknown")),
                })
                .collect(),
        }
    }
}

/// Payload of `intellivend/pump/{n}/control`.
#[derive(Debug, Clone, Deserialize)]
pub struct PumpControlMsg {
    pub action: String,
    /// Run duration in ms; the service's configured default applies when
    /// absent.
    #[serde(default)]
    pub duration: Option<u32>,
}

// ── Outbound ──────────────────────────────────────────────────

/// Payload of `intellivend/esp32/pump/{n}/status`.
#[derive(Debug, Clone, Serialize)]
pub struct PumpStatusMsg {
    pub pump_number: u8,
    pub status: &'static str,
    pub dispensed_ml: f32,
    pub timestamp: u64,
}

impl PumpStatusMsg {
    pub fn from_event(event: &ChannelEvent, timestamp: u64) -> Self {
        Self {
            pump_number: event.channel,
            status: event.status.as_str(),
            dispensed_ml: event.dispensed_ml,
            timestamp,
        }
    }
}

/// Payload of `intellivend/dispense/feedback`.
#[derive(Debug, Clone, Serialize)]
pub struct DispenseFeedbackMsg {
    pub log_id: i64,
    pub status: &'static str,
    pub current_pump: u32,
    pub total_pumps: u32,
    pub progress_percent: u8,
    pub timestamp: u64,
}

impl DispenseFeedbackMsg {
    pub fn from_event(event: &OrderEvent, timestamp: u64) -> Self {
        Self {
            log_id: event.log_id,
            status: event.status.as_str(),
            current_pump: event.current,
            total_pumps: event.total,
            progress_percent: event.progress_percent,
            timestamp,
        }
    }
}

/// Payload of `intellivend/esp32/status` (retained heartbeat).
#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatMsg {
    pub device_id: String,
    pub status: &'static str,
    pub ip_address: String,
    pub wifi_rssi: i8,
    pub uptime_seconds: u64,
    pub free_memory: u32,
    pub firmware_version: &'static str,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::events::{ChannelStatus, OrderStatus};

    #[test]
    fn dispense_command_parses_with_optional_ingredient() {
        let json = r#"{
            "log_id": 7,
            "commands": [
                {"pump_number": 1, "quantity_ml": 30.0, "ingredient": "Rum"},
                {"pump_number": 2, "quantity_ml": 15.0}
            ]
        }"#;
        let msg: DispenseCommandMsg = serde_json::from_str(json).unwrap();
        let order: DispenseOrder = msg.into();
        assert_eq!(order.log_id, 7);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].ingredient, "Rum");
        assert_eq!(order.items[1].ingredient, "Unknown");
        assert_eq!(order.items[1].channel, 2);
    }

    #[test]
    fn pump_control_duration_is_optional() {
        let msg: PumpControlMsg = serde_json::from_str(r#"{"action":"stop"}"#).unwrap();
        assert_eq!(msg.action, "stop");
        assert_eq!(msg.duration, None);

        let msg: PumpControlMsg =
            serde_json::from_str(r#"{"action":"test","duration":5000}"#).unwrap();
        assert_eq!(msg.duration, Some(5000));
    }

    #[test]
    fn pump_status_wire_fields() {
        let event = ChannelEvent {
            channel: 3,
            status: ChannelStatus::Completed,
            dispensed_ml: 30.0,
        };
        let json = serde_json::to_value(PumpStatusMsg::from_event(&event, 12345)).unwrap();
        assert_eq!(json["pump_number"], 3);
        assert_eq!(json["status"], "completed");
        assert_eq!(json["dispensed_ml"], 30.0);
        assert_eq!(json["timestamp"], 12345);
    }

    #[test]
    fn dispense_feedback_wire_fields() {
        let event = OrderEvent::progress(7, OrderStatus::InProgress, 1, 2);
        let json = serde_json::to_value(DispenseFeedbackMsg::from_event(&event, 99)).unwrap();
        assert_eq!(json["log_id"], 7);
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["current_pump"], 1);
        assert_eq!(json["total_pumps"], 2);
        assert_eq!(json["progress_percent"], 50);
    }

    #[test]
    fn heartbeat_serialises_all_fields() {
        let hb = HeartbeatMsg {
            device_id: "IV-EFCAFE".into(),
            status: "online",
            ip_address: "192.168.1.40".into(),
            wifi_rssi: -55,
            uptime_seconds: 120,
            free_memory: 180_000,
            firmware_version: "1.1.0",
            timestamp: 120_000,
        };
        let json = serde_json::to_value(&hb).unwrap();
        assert_eq!(json["device_id"], "IV-EFCAFE");
        assert_eq!(json["wifi_rssi"], -55);
        assert_eq!(json["free_memory"], 180_000);
    }
}

//! Command Router — demultiplexes inbound bus messages into app commands.
//!
//! The router owns all structural validation: topic shape, JSON parse,
//! action strings.  Malformed payloads are rejected here and never reach
//! the [`DispenseService`](crate::app::service::DispenseService); the
//! service still performs its own per-item range and value checks.

use core::fmt;

use log::info;

use crate::app::commands::{AppCommand, ManualAction};
use crate::bus::{topics, wire};

/// Router-level rejection.  None of these reach the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteError {
    /// JSON parse failure, unknown action, or bad topic segment.
    MalformedMessage(&'static str),
    /// Topic is not one this device subscribes to.
    UnknownTopic,
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedMessage(msg) => write!(f, "malformed message: {msg}"),
            Self::UnknownTopic => write!(f, "unknown topic"),
        }
    }
}

/// Route one inbound message.
///
/// `Ok(None)` means the topic was recognised but carries no action for
/// the core (remote config updates are received and ignored).
pub fn route(topic: &str, payload: &[u8]) -> Result<Option<AppCommand>, RouteError> {
    if topic == topics::DISPENSE_COMMAND {
        let msg: wire::DispenseCommandMsg = serde_json::from_slice(payload)
            .map_err(|_| RouteError::MalformedMessage("dispense command JSON"))?;
        return Ok(Some(AppCommand::Dispense(msg.into())));
    }

    if let Some(channel) = topics::control_channel(topic) {
        let msg: wire::PumpControlMsg = serde_json::from_slice(payload)
            .map_err(|_| RouteError::MalformedMessage("pump control JSON"))?;
        let action = parse_action(&msg.action)?;
        return Ok(Some(AppCommand::PumpControl {
            channel,
            action,
            duration_ms: msg.duration,
        }));
    }

    if topic == topics::CONFIG_UPDATE {
        info!("config update received (not implemented)");
        return Ok(None);
    }

    // A pump/+/control topic with a non-numeric segment is malformed,
    // not merely unknown — the backend addressed us and got it wrong.
    if topic.starts_with("intellivend/pump/") {
        return Err(RouteError::MalformedMessage("pump control topic"));
    }

    Err(RouteError::UnknownTopic)
}

fn parse_action(action: &str) -> Result<ManualAction, RouteError> {
    match action {
        "start" => Ok(ManualAction::Start),
        "test" => Ok(ManualAction::Test),
        "stop" => Ok(ManualAction::Stop),
        _ => Err(RouteError::MalformedMessage("unknown action")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispense_command_routes_to_order() {
        let payload = br#"{"log_id":1,"commands":[{"pump_number":1,"quantity_ml":10.0}]}"#;
        let cmd = route(topics::DISPENSE_COMMAND, payload).unwrap().unwrap();
        match cmd {
            AppCommand::Dispense(order) => {
                assert_eq!(order.log_id, 1);
                assert_eq!(order.items.len(), 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn pump_control_extracts_channel_from_topic() {
        let cmd = route("intellivend/pump/5/control", br#"{"action":"stop"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            cmd,
            AppCommand::PumpControl {
                channel: 5,
                action: ManualAction::Stop,
                duration_ms: None,
            }
        );
    }

    #[test]
    fn pump_control_carries_duration() {
        let cmd = route(
            "intellivend/pump/2/control",
            br#"{"action":"test","duration":5000}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(
            cmd,
            AppCommand::PumpControl {
                channel: 2,
                action: ManualAction::Test,
                duration_ms: Some(5000),
            }
        );
    }

    #[test]
    fn unknown_action_is_malformed() {
        let err = route("intellivend/pump/1/control", br#"{"action":"reverse"}"#).unwrap_err();
        assert_eq!(err, RouteError::MalformedMessage("unknown action"));
    }

    #[test]
    fn bad_json_is_malformed() {
        assert!(route(topics::DISPENSE_COMMAND, b"{not json").is_err());
        assert!(route("intellivend/pump/1/control", b"").is_err());
    }

    #[test]
    fn non_numeric_pump_segment_is_malformed() {
        let err = route("intellivend/pump/abc/control", br#"{"action":"stop"}"#).unwrap_err();
        assert_eq!(err, RouteError::MalformedMessage("pump control topic"));
    }

    #[test]
    fn config_update_is_recognised_but_ignored() {
        assert_eq!(route(topics::CONFIG_UPDATE, b"{}"), Ok(None));
    }

    #[test]
    fn unrelated_topic_is_unknown() {
        assert_eq!(
            route("intellivend/esp32/status", b"{}"),
            Err(RouteError::UnknownTopic)
        );
    }
}

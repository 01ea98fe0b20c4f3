//! Bus-boundary tests: broker payload in → routed command → dispense →
//! feedback payloads out, using the simulation MQTT backend.

use std::time::Duration;

use intellivend::adapters::mqtt::{MqttAdapter, MqttFeedbackSink};
use intellivend::app::bank::PumpBank;
use intellivend::app::calibration::CalibrationTable;
use intellivend::app::commands::AppCommand;
use intellivend::app::service::DispenseService;
use intellivend::bus::{router, topics};
use intellivend::config::SystemConfig;

use crate::mock_hw::{MockClock, MockHardware};

fn service() -> DispenseService {
    let config = SystemConfig::default();
    let bank = PumpBank::new(CalibrationTable::default(), config.flow_rate_ml_per_sec);
    DispenseService::new(&config, bank)
}

#[test]
fn dispense_command_round_trips_to_feedback_topics() {
    let mut svc = service();
    let (mut hw, mut clock) = (MockHardware::new(), MockClock::new());

    let mut mqtt = MqttAdapter::connect("mqtt://test:1883", "IV-TEST").unwrap();
    mqtt.sim_inject(
        topics::DISPENSE_COMMAND,
        br#"{"log_id":11,"commands":[{"pump_number":2,"quantity_ml":25.0,"ingredient":"Rum"}]}"#,
    );

    let inbound = mqtt.recv_timeout(Duration::from_millis(10)).unwrap();
    let command = router::route(&inbound.topic, &inbound.payload)
        .unwrap()
        .unwrap();

    let stamp_clock = MockClock::new();
    {
        let mut sink = MqttFeedbackSink::new(&mut mqtt, &stamp_clock);
        match command {
            AppCommand::Dispense(order) => {
                svc.execute_order(order, &mut hw, &mut clock, &mut sink)
                    .unwrap();
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    assert_eq!(hw.calls, vec![(2, true), (2, false)]);
    assert_eq!(clock.sleeps, vec![2500]);

    // started + in_progress + completed order messages, plus two pump
    // status messages, all published.
    let published = mqtt.sim_published();
    let order_msgs: Vec<&(String, Vec<u8>, bool)> = published
        .iter()
        .filter(|(topic, ..)| topic == topics::DISPENSE_FEEDBACK)
        .collect();
    assert_eq!(order_msgs.len(), 3);
    let last: serde_json::Value = serde_json::from_slice(&order_msgs[2].1).unwrap();
    assert_eq!(last["log_id"], 11);
    assert_eq!(last["status"], "completed");
    assert_eq!(last["progress_percent"], 100);

    let pump_msgs: Vec<&(String, Vec<u8>, bool)> = published
        .iter()
        .filter(|(topic, ..)| topic == "intellivend/esp32/pump/2/status")
        .collect();
    assert_eq!(pump_msgs.len(), 2);
    let done: serde_json::Value = serde_json::from_slice(&pump_msgs[1].1).unwrap();
    assert_eq!(done["status"], "completed");
    assert_eq!(done["dispensed_ml"], 25.0);
}

#[test]
fn manual_control_topic_drives_single_pump() {
    let mut svc = service();
    let (mut hw, mut clock) = (MockHardware::new(), MockClock::new());
    let mut mqtt = MqttAdapter::connect("mqtt://test:1883", "IV-TEST").unwrap();

    let command = router::route(
        "intellivend/pump/7/control",
        br#"{"action":"test","duration":1200}"#,
    )
    .unwrap()
    .unwrap();

    let stamp_clock = MockClock::new();
    let mut sink = MqttFeedbackSink::new(&mut mqtt, &stamp_clock);
    match command {
        AppCommand::PumpControl {
            channel,
            action,
            duration_ms,
        } => {
            svc.manual_control(channel, action, duration_ms, &mut hw, &mut clock, &mut sink)
                .unwrap();
        }
        other => panic!("unexpected command: {other:?}"),
    }

    assert_eq!(hw.calls, vec![(7, true), (7, false)]);
    assert_eq!(clock.sleeps, vec![1200]);
}

#[test]
fn malformed_payloads_never_reach_the_service() {
    // Truncated JSON on a valid topic.
    assert!(router::route(topics::DISPENSE_COMMAND, b"{\"log_id\":").is_err());
    // Unknown action string.
    assert!(router::route("intellivend/pump/1/control", br#"{"action":"reverse"}"#).is_err());
    // Non-numeric channel segment.
    assert!(router::route("intellivend/pump/x/control", br#"{"action":"stop"}"#).is_err());
}

#[test]
fn config_update_topic_is_recognised_but_inert() {
    let routed = router::route(topics::CONFIG_UPDATE, br#"{"flow_rate":12.0}"#).unwrap();
    assert!(routed.is_none());
}

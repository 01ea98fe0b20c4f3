//! End-to-end dispense scenarios against mock adapters.
//!
//! These drive [`DispenseService`] the way the main loop does and assert
//! on the complete event stream, hardware edge history, and virtual
//! timing.

use intellivend::app::bank::PumpBank;
use intellivend::app::calibration::CalibrationTable;
use intellivend::app::commands::{DispenseItem, DispenseOrder, ManualAction};
use intellivend::app::events::{AppEvent, ChannelEvent, ChannelStatus, OrderStatus};
use intellivend::app::service::DispenseService;
use intellivend::config::{NUM_PUMPS, SystemConfig};
use intellivend::error::DispenseError;

use crate::mock_hw::{MockClock, MockHardware, RecordingSink};

fn service_with(calibration: [f32; NUM_PUMPS]) -> DispenseService {
    let config = SystemConfig::default();
    let bank = PumpBank::new(
        CalibrationTable::new(calibration).unwrap(),
        config.flow_rate_ml_per_sec,
    );
    DispenseService::new(&config, bank)
}

fn service() -> DispenseService {
    service_with([1.0; NUM_PUMPS])
}

fn item(channel: u8, volume_ml: f32, ingredient: &str) -> DispenseItem {
    DispenseItem {
        channel,
        volume_ml,
        ingredient: ingredient.into(),
    }
}

#[test]
fn two_pump_order_emits_full_event_sequence() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    let order = DispenseOrder {
        log_id: 42,
        items: vec![item(1, 30.0, "Vodka"), item(2, 15.0, "Orange Juice")],
    };
    let summary = svc
        .execute_order(order, &mut hw, &mut clock, &mut sink)
        .unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);

    // 30 mL then 15 mL at 10 mL/s.
    assert_eq!(clock.sleeps, vec![3000, 1500]);
    assert_eq!(
        hw.calls,
        vec![(1, true), (1, false), (2, true), (2, false)]
    );

    // Channel stream: running/completed per pump, in order.
    let channels = sink.channel_events();
    assert_eq!(channels.len(), 4);
    assert_eq!(channels[0].status, ChannelStatus::Running);
    assert_eq!(channels[1].status, ChannelStatus::Completed);
    assert!((channels[1].dispensed_ml - 30.0).abs() < 0.001);
    assert_eq!(channels[3].channel, 2);
    assert!((channels[3].dispensed_ml - 15.0).abs() < 0.001);

    // Order stream: started → in_progress ×2 → completed, 0/50/100/100.
    let orders = sink.order_events();
    let statuses: Vec<OrderStatus> = orders.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            OrderStatus::Started,
            OrderStatus::InProgress,
            OrderStatus::InProgress,
            OrderStatus::Completed,
        ]
    );
    let percents: Vec<u8> = orders.iter().map(|o| o.progress_percent).collect();
    assert_eq!(percents, vec![0, 50, 100, 100]);
    assert!(orders.iter().all(|o| o.log_id == 42));
}

#[test]
fn calibration_factor_scales_volume_and_run_time() {
    let mut calibration = [1.0; NUM_PUMPS];
    calibration[3] = 1.5; // channel 4
    let mut svc = service_with(calibration);
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    let order = DispenseOrder {
        log_id: 7,
        items: vec![item(4, 20.0, "Gin")],
    };
    svc.execute_order(order, &mut hw, &mut clock, &mut sink)
        .unwrap();

    // 20 mL × 1.5 = 30 mL adjusted → 3000 ms at 10 mL/s.
    assert_eq!(clock.sleeps, vec![3000]);
    let completed = sink
        .channel_events()
        .into_iter()
        .find(|c| c.status == ChannelStatus::Completed)
        .unwrap();
    assert!((completed.dispensed_ml - 30.0).abs() < 0.001);
}

#[test]
fn empty_order_rejected_with_no_events_or_hardware() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    let err = svc
        .execute_order(
            DispenseOrder {
                log_id: 1,
                items: vec![],
            },
            &mut hw,
            &mut clock,
            &mut sink,
        )
        .unwrap_err();

    assert_eq!(err, DispenseError::EmptyOrder);
    assert!(sink.events.is_empty());
    assert!(hw.calls.is_empty());
    assert!(clock.sleeps.is_empty());
    assert!(!svc.is_dispensing());
}

#[test]
fn boundary_channels_fail_without_touching_hardware() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    // Channels 0 and 9 bracket the valid 1..=8 range.
    let order = DispenseOrder {
        log_id: 5,
        items: vec![item(0, 10.0, "Rum"), item(9, 10.0, "Cola")],
    };
    let summary = svc
        .execute_order(order, &mut hw, &mut clock, &mut sink)
        .unwrap();

    assert_eq!(summary.completed, 0);
    assert_eq!(summary.failed, 2);
    assert!(hw.calls.is_empty());

    let channels = sink.channel_events();
    assert_eq!(channels.len(), 2);
    assert!(channels.iter().all(|c| c.status == ChannelStatus::Failed));

    // The order still runs to 100% even though every item failed.
    assert_eq!(sink.order_events().last().unwrap().progress_percent, 100);
    assert!(!svc.is_dispensing());
}

#[test]
fn stop_on_idle_channel_emits_single_stopped_event() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    svc.manual_control(3, ManualAction::Stop, None, &mut hw, &mut clock, &mut sink)
        .unwrap();

    assert_eq!(
        sink.events,
        vec![AppEvent::Channel(ChannelEvent {
            channel: 3,
            status: ChannelStatus::Stopped,
            dispensed_ml: 0.0,
        })]
    );
    assert_eq!(hw.calls, vec![(3, false)]);
    assert!(!hw.channel_on(3));
}

#[test]
fn manual_start_with_explicit_duration() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    svc.manual_control(
        6,
        ManualAction::Start,
        Some(5000),
        &mut hw,
        &mut clock,
        &mut sink,
    )
    .unwrap();

    assert_eq!(clock.sleeps, vec![5000]);
    assert_eq!(hw.calls, vec![(6, true), (6, false)]);

    // 5 s at 10 mL/s → 50 mL reported on completion.
    let completed = sink
        .channel_events()
        .into_iter()
        .find(|c| c.status == ChannelStatus::Completed)
        .unwrap();
    assert!((completed.dispensed_ml - 50.0).abs() < 0.001);
}

#[test]
fn back_to_back_orders_accepted_after_completion() {
    let mut svc = service();
    let (mut hw, mut clock, mut sink) =
        (MockHardware::new(), MockClock::new(), RecordingSink::new());

    for log_id in 1..=3 {
        let order = DispenseOrder {
            log_id,
            items: vec![item(1, 10.0, "Tonic")],
        };
        svc.execute_order(order, &mut hw, &mut clock, &mut sink)
            .unwrap();
        assert!(!svc.is_dispensing());
        assert_eq!(svc.active_log_id(), None);
    }
    assert_eq!(clock.sleeps, vec![1000; 3]);
}

//! Dispense service — the hexagonal core.
//!
//! [`DispenseService`] owns the pump bank and the run-state machine.  It
//! exposes the two entry points of the system: order execution and manual
//! channel control.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  AppCommand ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │    DispenseService      │
//! ActuatorPort ◀──│  PumpBank · RunState    │◀── ClockPort
//!                 └────────────────────────┘
//! ```
//!
//! Order execution is strictly sequential and blocking: each channel
//! activation blocks the calling context for its full computed run time
//! before the next item begins.  There is no cancellation once a run has
//! started and no retry of a failed item.

use log::{info, warn};

use crate::app::bank::PumpBank;
use crate::app::commands::{DispenseItem, DispenseOrder, ManualAction};
use crate::app::events::{AppEvent, ChannelEvent, ChannelStatus, OrderEvent, OrderStatus};
use crate::app::ports::{ActuatorPort, ClockPort, EventSink};
use crate::app::run::RunState;
use crate::config::SystemConfig;
use crate::error::DispenseError;

/// Outcome of a completed order: how many items actuated and how many
/// were skipped by per-item validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    pub log_id: i64,
    pub total: u32,
    pub completed: u32,
    pub failed: u32,
}

/// The dispense service orchestrates all domain logic.
///
/// It is the single writer of pump hardware state: both the order path
/// and the manual path go through this one owner, so the two entry points
/// cannot interleave activations on the same channel.
pub struct DispenseService {
    bank: PumpBank,
    run: RunState,
    manual_default_duration_ms: u32,
}

impl DispenseService {
    /// Construct the service from configuration.
    ///
    /// The calibration table must already be validated — construct it via
    /// [`CalibrationTable::new`](super::calibration::CalibrationTable::new)
    /// or load a validated [`SystemConfig`].
    pub fn new(config: &SystemConfig, bank: PumpBank) -> Self {
        Self {
            bank,
            run: RunState::new(),
            manual_default_duration_ms: config.manual_default_duration_ms,
        }
    }

    // ── Order execution ───────────────────────────────────────

    /// Execute a multi-item order: sequential, blocking, best-effort.
    ///
    /// Rejected up front with `EmptyOrder` (zero items — the progress
    /// denominator would be zero) or `Busy` (a run is already active);
    /// neither rejection emits any event or touches hardware.
    ///
    /// Per-item validation failures do not abort the order: the item is
    /// skipped, a `failed` channel event is emitted, and the order
    /// proceeds — partial completion beats all-or-nothing here.  Progress
    /// events are emitted after every item, so the sequence always ends
    /// at exactly 100 percent.
    pub fn execute_order(
        &mut self,
        order: DispenseOrder,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<OrderSummary, DispenseError> {
        if order.items.is_empty() {
            return Err(DispenseError::EmptyOrder);
        }
        let total = order.items.len() as u32;
        if !self.run.begin(order.log_id, total) {
            return Err(DispenseError::Busy);
        }

        info!(
            "dispense: starting log_id {} with {} pumps",
            order.log_id, total
        );
        sink.emit(&AppEvent::Order(OrderEvent::progress(
            order.log_id,
            OrderStatus::Started,
            0,
            total,
        )));

        let mut completed = 0u32;
        let mut failed = 0u32;

        for (i, item) in order.items.iter().enumerate() {
            match self.dispense_item(item, hw, clock, sink) {
                Ok(adjusted_ml) => {
                    completed += 1;
                    info!(
                        "dispense: pump {} completed, {:.1} mL of {}",
                        item.channel, adjusted_ml, item.ingredient
                    );
                }
                Err(e) => {
                    failed += 1;
                    warn!("dispense: pump {} skipped ({})", item.channel, e);
                    sink.emit(&AppEvent::Channel(ChannelEvent {
                        channel: item.channel,
                        status: ChannelStatus::Failed,
                        dispensed_ml: 0.0,
                    }));
                }
            }

            self.run.advance();
            sink.emit(&AppEvent::Order(OrderEvent::progress(
                order.log_id,
                OrderStatus::InProgress,
                i as u32 + 1,
                total,
            )));
        }

        sink.emit(&AppEvent::Order(OrderEvent::progress(
            order.log_id,
            OrderStatus::Completed,
            total,
            total,
        )));
        info!("dispense: completed log_id {}", order.log_id);
        self.run.finish();

        Ok(OrderSummary {
            log_id: order.log_id,
            total,
            completed,
            failed,
        })
    }

    /// Validate, plan, and actuate one item.  `running` is emitted before
    /// the timed wait, `completed` (with the adjusted volume) after it.
    fn dispense_item(
        &self,
        item: &DispenseItem,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<f32, DispenseError> {
        let plan = self.bank.plan(item.channel, item.volume_ml)?;

        sink.emit(&AppEvent::Channel(ChannelEvent {
            channel: plan.channel,
            status: ChannelStatus::Running,
            dispensed_ml: 0.0,
        }));

        self.bank.run_for(plan.channel, plan.run_ms, hw, clock)?;

        sink.emit(&AppEvent::Channel(ChannelEvent {
            channel: plan.channel,
            status: ChannelStatus::Completed,
            dispensed_ml: plan.adjusted_ml,
        }));

        Ok(plan.adjusted_ml)
    }

    // ── Manual channel control ────────────────────────────────

    /// Drive one channel directly (test/override path), bypassing order
    /// sequencing.  Emits only channel-level events.
    ///
    /// `Start`/`Test` are rejected with `Busy` while an order runs;
    /// `Stop` is always accepted and is idempotent — stopping an idle
    /// channel emits the same `stopped` event as stopping a running one.
    pub fn manual_control(
        &mut self,
        channel: u8,
        action: ManualAction,
        duration_ms: Option<u32>,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Result<(), DispenseError> {
        let duration_ms = duration_ms.unwrap_or(self.manual_default_duration_ms);

        match action {
            ManualAction::Start | ManualAction::Test => {
                if self.run.is_running() {
                    return Err(DispenseError::Busy);
                }
                let volume_ml = self.bank.volume_for_duration(duration_ms);
                info!(
                    "manual: pump {} {:?} for {} ms (~{:.1} mL)",
                    channel, action, duration_ms, volume_ml
                );
                let item = DispenseItem {
                    channel,
                    volume_ml,
                    ingredient: String::from("Unknown"),
                };
                self.dispense_item(&item, hw, clock, sink)?;
                Ok(())
            }
            ManualAction::Stop => {
                self.bank.deactivate(channel, hw)?;
                info!("manual: pump {} stopped", channel);
                sink.emit(&AppEvent::Channel(ChannelEvent {
                    channel,
                    status: ChannelStatus::Stopped,
                    dispensed_ml: 0.0,
                }));
                Ok(())
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Whether an order is currently executing.
    pub fn is_dispensing(&self) -> bool {
        self.run.is_running()
    }

    /// log_id of the in-flight order, if any.
    pub fn active_log_id(&self) -> Option<i64> {
        self.run.active().map(|r| r.log_id)
    }
}

//! Inbound commands to the dispense service.
//!
//! These represent actions requested by the outside world (MQTT, serial)
//! after the Command Router has validated their structural shape.  The
//! [`DispenseService`](super::service::DispenseService) still performs its
//! own range and value checks per item.

/// One entry of a dispense order.  Consumed once by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseItem {
    /// Pump channel id, 1-based.
    pub channel: u8,
    /// Requested volume in mL (before calibration).
    pub volume_ml: f32,
    /// Free-text ingredient label, used for logging only.
    pub ingredient: String,
}

/// A caller-issued request to dispense a sequence of items.
///
/// Item order is significant and preserved — it defines actuation order.
/// `log_id` is caller-supplied correlation, not guaranteed unique.
#[derive(Debug, Clone, PartialEq)]
pub struct DispenseOrder {
    pub log_id: i64,
    pub items: Vec<DispenseItem>,
}

/// Manual per-channel action (test/override path).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualAction {
    /// Run the channel for the given duration.
    Start,
    /// Identical to `Start`; kept as a distinct wire action for the
    /// backend's pump-test UI.
    Test,
    /// Deactivate the channel immediately.
    Stop,
}

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Execute a multi-item dispense order.
    Dispense(DispenseOrder),

    /// Drive a single channel directly, bypassing order sequencing.
    /// `duration_ms = None` means the configured default applies.
    PumpControl {
        channel: u8,
        action: ManualAction,
        duration_ms: Option<u32>,
    },
}

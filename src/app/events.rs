//! Outbound feedback events.
//!
//! The [`DispenseService`](super::service::DispenseService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them — log to serial, publish on
//! the MQTT feedback topics, or both.  Timestamps are stamped by the
//! publishing adapter, not here.

/// Per-channel status tag.  `as_str` values are the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelStatus {
    /// Channel has been activated; dispensing in progress.
    Running,
    /// Channel deactivated after its full computed run time.
    Completed,
    /// Channel deactivated by a manual stop.
    Stopped,
    /// Item skipped — validation failed, no hardware action taken.
    Failed,
}

impl ChannelStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }
}

/// Order-level status tag.  `as_str` values are the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Started,
    InProgress,
    Completed,
}

impl OrderStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// One channel-level event.  Emitted, not stored.
///
/// `dispensed_ml` is 0 except for `Completed`, where it carries the
/// calibration-adjusted volume actually actuated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelEvent {
    pub channel: u8,
    pub status: ChannelStatus,
    pub dispensed_ml: f32,
}

/// One order-level progress event.  Emitted, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderEvent {
    pub log_id: i64,
    pub status: OrderStatus,
    /// Items handled so far (0 at `Started`).
    pub current: u32,
    /// Total item count of the order.
    pub total: u32,
    /// Integer progress, floor((current * 100) / total).
    pub progress_percent: u8,
}

impl OrderEvent {
    /// Build a progress event with floor-division percent.
    ///
    /// `total` must be non-zero — the orchestrator rejects empty orders
    /// before any event is constructed.
    pub fn progress(log_id: i64, status: OrderStatus, current: u32, total: u32) -> Self {
        Self {
            log_id,
            status,
            current,
            total,
            progress_percent: ((current * 100) / total) as u8,
        }
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    Channel(ChannelEvent),
    Order(OrderEvent),
}

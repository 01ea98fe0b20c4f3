//! Mock adapters for integration tests.
//!
//! Record every port call so tests can assert on the full command history
//! without touching real GPIO or a broker.

use intellivend::app::events::{AppEvent, ChannelEvent, OrderEvent};
use intellivend::app::ports::{ActuatorPort, ClockPort, EventSink};

// ── MockHardware ──────────────────────────────────────────────

/// Records `(channel, on)` edges in order.
pub struct MockHardware {
    pub calls: Vec<(u8, bool)>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self { calls: Vec::new() }
    }

    /// Whether `channel` is ON after replaying all recorded edges.
    pub fn channel_on(&self, channel: u8) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|(ch, on)| (*ch == channel).then_some(*on))
            .unwrap_or(false)
    }

    pub fn any_on(&self) -> bool {
        (1..=8).any(|ch| self.channel_on(ch))
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_channel(&mut self, channel: u8, on: bool) {
        self.calls.push((channel, on));
    }

    fn all_off(&mut self) {
        for ch in 1..=8 {
            self.calls.push((ch, false));
        }
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Virtual clock: `sleep_ms` advances `now` instantly and records the
/// requested durations, so timing assertions run in microseconds.
pub struct MockClock {
    pub now_ms: u64,
    pub sleeps: Vec<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            sleeps: Vec::new(),
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.now_ms += ms;
        self.sleeps.push(ms);
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Captures the full event stream for ordering assertions.
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn channel_events(&self) -> Vec<ChannelEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Channel(c) => Some(*c),
                AppEvent::Order(_) => None,
            })
            .collect()
    }

    pub fn order_events(&self) -> Vec<OrderEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Order(o) => Some(*o),
                AppEvent::Channel(_) => None,
            })
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

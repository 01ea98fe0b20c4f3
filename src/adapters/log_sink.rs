//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured feedback events to the
//! ESP-IDF logger (UART / USB-CDC in production).  The MQTT sink
//! implements the same trait; the main loop fans events out to both.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Channel(c) => {
                info!(
                    "PUMP  | #{} {} | dispensed={:.1} mL",
                    c.channel,
                    c.status.as_str(),
                    c.dispensed_ml,
                );
            }
            AppEvent::Order(o) => {
                info!(
                    "ORDER | log_id={} {} | {}/{} ({}%)",
                    o.log_id,
                    o.status.as_str(),
                    o.current,
                    o.total,
                    o.progress_percent,
                );
            }
        }
    }
}

//! MQTT adapter.
//!
//! Owns the broker connection and both directions of traffic:
//!
//! - **Inbound**: the driver callback copies each received message into an
//!   [`InboundMessage`] and hands it to the main loop over a channel, so
//!   JSON parsing and dispense work never run on the MQTT task.
//! - **Outbound**: [`MqttFeedbackSink`] implements [`EventSink`] and
//!   serialises domain events onto the feedback topics; the heartbeat is
//!   published retained so the backend always sees the last known state.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: simulation backend that records publishes and
//!   lets tests inject inbound messages.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ClockPort, EventSink};
use crate::bus::topics;
use crate::bus::wire::{DispenseFeedbackMsg, PumpStatusMsg};
use crate::error::{CommsError, Result};

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// One message received from the broker, copied off the driver callback.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

pub struct MqttAdapter {
    rx: Receiver<InboundMessage>,
    #[cfg(target_os = "espidf")]
    client: EspMqttClient<'static>,
    #[cfg(target_os = "espidf")]
    connected: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    tx: mpsc::Sender<InboundMessage>,
    #[cfg(not(target_os = "espidf"))]
    published: Vec<(String, Vec<u8>, bool)>,
}

impl MqttAdapter {
    /// Connect to the broker and spawn the driver task.
    ///
    /// The returned adapter is not necessarily connected yet — the driver
    /// connects asynchronously; poll [`Self::is_connected`] before the
    /// first subscribe.
    #[cfg(target_os = "espidf")]
    pub fn connect(broker_url: &str, client_id: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<InboundMessage>();
        let connected = Arc::new(AtomicBool::new(false));
        let connected_flag = Arc::clone(&connected);

        let conf = MqttClientConfiguration {
            client_id: Some(client_id),
            keep_alive_interval: Some(Duration::from_secs(60)),
            ..Default::default()
        };

        info!("MQTT: connecting to {} as '{}'", broker_url, client_id);
        let client = EspMqttClient::new_cb(broker_url, &conf, move |event| {
            match event.payload() {
                EventPayload::Connected(_) => {
                    info!("MQTT: connected");
                    connected_flag.store(true, Ordering::SeqCst);
                }
                EventPayload::Disconnected => {
                    warn!("MQTT: disconnected");
                    connected_flag.store(false, Ordering::SeqCst);
                }
                EventPayload::Received { topic, data, .. } => {
                    if let Some(topic) = topic {
                        // Copy out of the driver buffer; routing happens on
                        // the main task.
                        let msg = InboundMessage {
                            topic: topic.to_owned(),
                            payload: data.to_vec(),
                        };
                        if tx.send(msg).is_err() {
                            warn!("MQTT: inbound channel closed, dropping message");
                        }
                    }
                }
                EventPayload::Error(e) => warn!("MQTT: driver error: {:?}", e),
                _ => {}
            }
        })
        .map_err(|_| CommsError::MqttConnectFailed)?;

        Ok(Self {
            rx,
            client,
            connected,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn connect(broker_url: &str, client_id: &str) -> Result<Self> {
        info!("MQTT(sim): connecting to {} as '{}'", broker_url, client_id);
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            rx,
            tx,
            published: Vec::new(),
        })
    }

    pub fn is_connected(&self) -> bool {
        #[cfg(target_os = "espidf")]
        {
            self.connected.load(Ordering::SeqCst)
        }
        #[cfg(not(target_os = "espidf"))]
        {
            true
        }
    }

    /// Subscribe to every inbound topic of the bus contract.
    pub fn subscribe_all(&mut self) -> Result<()> {
        for topic in [
            topics::DISPENSE_COMMAND,
            topics::PUMP_CONTROL_FILTER,
            topics::CONFIG_UPDATE,
        ] {
            self.subscribe(topic)?;
            info!("MQTT: subscribed to {}", topic);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn subscribe(&mut self, topic: &str) -> Result<()> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .map_err(|_| CommsError::MqttSubscribeFailed)?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn subscribe(&mut self, _topic: &str) -> Result<()> {
        Ok(())
    }

    pub fn publish(&mut self, topic: &str, payload: &[u8], retained: bool) -> Result<()> {
        #[cfg(target_os = "espidf")]
        {
            self.client
                .publish(topic, QoS::AtLeastOnce, retained, payload)
                .map_err(|_| CommsError::MqttPublishFailed)?;
        }
        #[cfg(not(target_os = "espidf"))]
        {
            self.published
                .push((topic.to_owned(), payload.to_vec(), retained));
        }
        Ok(())
    }

    /// Block for up to `timeout` waiting for the next inbound message.
    /// `None` on timeout; the main loop uses the gap for housekeeping.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<InboundMessage> {
        match self.rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    // ── Simulation hooks ──────────────────────────────────────

    /// Inject an inbound message, as if the broker delivered it.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_inject(&self, topic: &str, payload: &[u8]) {
        let _ = self.tx.send(InboundMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
        });
    }

    /// Everything published so far: `(topic, payload, retained)`.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[(String, Vec<u8>, bool)] {
        &self.published
    }
}

// ───────────────────────────────────────────────────────────────
// Feedback sink
// ───────────────────────────────────────────────────────────────

/// Publishes domain events onto the feedback topics.
///
/// Timestamps are stamped here, at the bus boundary — the domain core
/// stays free of wall-clock concerns.
pub struct MqttFeedbackSink<'a, C: ClockPort> {
    mqtt: &'a mut MqttAdapter,
    clock: &'a C,
}

impl<'a, C: ClockPort> MqttFeedbackSink<'a, C> {
    pub fn new(mqtt: &'a mut MqttAdapter, clock: &'a C) -> Self {
        Self { mqtt, clock }
    }
}

impl<C: ClockPort> EventSink for MqttFeedbackSink<'_, C> {
    fn emit(&mut self, event: &AppEvent) {
        let timestamp = self.clock.now_ms();
        let result = match event {
            AppEvent::Channel(ev) => {
                let msg = PumpStatusMsg::from_event(ev, timestamp);
                serde_json::to_vec(&msg)
                    .map_err(|_| CommsError::MqttPublishFailed.into())
                    .and_then(|payload| {
                        self.mqtt.publish(&topics::pump_status(ev.channel), &payload, false)
                    })
            }
            AppEvent::Order(ev) => {
                let msg = DispenseFeedbackMsg::from_event(ev, timestamp);
                serde_json::to_vec(&msg)
                    .map_err(|_| CommsError::MqttPublishFailed.into())
                    .and_then(|payload| {
                        self.mqtt.publish(topics::DISPENSE_FEEDBACK, &payload, false)
                    })
            }
        };
        // Feedback is best-effort: a failed publish must never abort a
        // running dispense.
        if result.is_err() {
            warn!("MQTT: feedback publish failed, event dropped");
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────

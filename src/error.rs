//! Unified error types for the IntelliVend firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! main loop's error handling uniform.  Dispense errors are `Copy` so they
//! can be passed around and logged without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// An order or manual-control request was rejected by the core.
    Dispense(DispenseError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispense(e) => write!(f, "dispense: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Dispense errors
// ---------------------------------------------------------------------------

/// Rejections from the dispense core.
///
/// Per-item failures inside an order are recoverable — the order continues
/// with the next item and the failure surfaces as a channel-level event.
/// `EmptyOrder` and `Busy` abort before any hardware action or event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispenseError {
    /// Channel id outside `1..=NUM_PUMPS`.  No hardware action taken.
    InvalidChannel(u8),
    /// Requested volume is negative or not finite.
    InvalidVolume(f32),
    /// An order with zero items was submitted.
    EmptyOrder,
    /// A dispense run is already in progress (single order at a time).
    Busy,
}

impl fmt::Display for DispenseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChannel(ch) => write!(f, "invalid pump channel {ch}"),
            Self::InvalidVolume(v) => write!(f, "invalid volume {v} mL"),
            Self::EmptyOrder => write!(f, "order has no items"),
            Self::Busy => write!(f, "dispense already in progress"),
        }
    }
}

impl From<DispenseError> for Error {
    fn from(e: DispenseError) -> Self {
        Self::Dispense(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    MqttConnectFailed,
    MqttPublishFailed,
    MqttSubscribeFailed,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::MqttConnectFailed => write!(f, "MQTT connect failed"),
            Self::MqttPublishFailed => write!(f, "MQTT publish failed"),
            Self::MqttSubscribeFailed => write!(f, "MQTT subscribe failed"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

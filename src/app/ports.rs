//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DispenseService (domain)
//! ```
//!
//! Driven adapters (pump hardware, clock, MQTT publisher, NVS) implement
//! these traits.  The [`DispenseService`](super::service::DispenseService)
//! consumes them via generics, so the domain core never touches hardware
//! directly.

use crate::config::SystemConfig;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive pump outputs.
///
/// Channel ids are pre-validated by the [`PumpBank`](super::bank::PumpBank)
/// before any call — implementations may treat an out-of-range channel as
/// a no-op rather than a panic.
pub trait ActuatorPort {
    /// Set one pump channel's output (true = ON).
    fn set_channel(&mut self, channel: u8, on: bool);

    /// Kill every pump output — safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: domain → time)
// ───────────────────────────────────────────────────────────────

/// Monotonic time and the single suspension point of the dispense path.
///
/// `sleep_ms` is where the core blocks while a pump runs.  Keeping it
/// behind a port makes the timed wait an explicit wait-then-resume
/// scheduling point: tests inject a recording clock, and a future
/// cancellation token would slot in here without changing observable
/// event ordering.
pub trait ClockPort {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64;

    /// Block the calling context for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → feedback publisher)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, MQTT
/// feedback topics, both).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting
/// ([`SystemConfig::validate`]); invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.  A corrupted
/// blob must never inject a zero or negative calibration factor.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

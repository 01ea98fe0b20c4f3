//! Driven adapters — implementations of the app-core port traits.
//!
//! Everything here sits on the outer ring of the hexagon: pump hardware,
//! the monotonic clock, NVS persistence, WiFi, MQTT, and serial logging.
//! The app core consumes these only through the traits in
//! [`crate::app::ports`].

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod time;
pub mod wifi;

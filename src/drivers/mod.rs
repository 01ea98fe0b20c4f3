//! Peripheral drivers.
//!
//! Dual-target design throughout: on ESP-IDF the drivers write real GPIO
//! registers via [`hw_init`]; on host/test targets they track state
//! in-memory only, so the whole stack builds and tests on x86_64.

pub mod hw_init;
pub mod pump;
pub mod status_led;
pub mod watchdog;

//! IntelliVend dispenser firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod bus;
pub mod config;
pub mod error;

mod pins;

// ESPidf-backed modules; the hardware paths are guarded by cfg attributes
// inside, the remainder compiles on the host for tests.
pub mod adapters;
pub mod drivers;

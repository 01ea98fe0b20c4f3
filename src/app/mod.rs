//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the IntelliVend dispenser:
//! order orchestration, per-channel calibration, run-state tracking, and
//! the feedback event protocol.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod bank;
pub mod calibration;
pub mod commands;
pub mod events;
pub mod ports;
pub mod run;
pub mod service;

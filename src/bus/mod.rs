//! MQTT bus boundary — wire codec and command routing.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Bus boundary                         │
//! │                                                          │
//! │  ┌───────────┐   ┌──────────┐   ┌────────────────────┐  │
//! │  │ Transport │──▶│  Router  │──▶│  DispenseService    │  │
//! │  │ (MQTT)    │   │ (topics) │   │  (app core)         │  │
//! │  └───────────┘   └──────────┘   └────────────────────┘  │
//! │       ▲                                   │             │
//! │       └────────────── wire codec ◀────────┘             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! The router validates structural shape (JSON, topic, action strings)
//! before anything reaches the core; the core performs its own range and
//! value checks per item.

pub mod router;
pub mod topics;
pub mod wire;

//! GPIO pin assignments for the IntelliVend main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Each pump channel drives a MOSFET low-side switch for a 12 V peristaltic
//! pump.  Outputs are active HIGH and initialised LOW (pump off) at boot.

use crate::config::NUM_PUMPS;

// ---------------------------------------------------------------------------
// Pump outputs
// ---------------------------------------------------------------------------

/// Pump driver GPIOs, indexed by channel - 1 (channel ids are 1..=NUM_PUMPS).
pub const PUMP_GPIOS: [i32; NUM_PUMPS] = [4, 5, 6, 7, 15, 16, 17, 18];

// ---------------------------------------------------------------------------
// Status LED (discrete RGB, common cathode)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 11;
pub const LED_G_GPIO: i32 = 12;
pub const LED_B_GPIO: i32 = 13;

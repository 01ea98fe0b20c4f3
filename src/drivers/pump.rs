//! Single pump channel driver (MOSFET low-side switch, on/off).
//!
//! These are fixed-speed peristaltic pumps — no PWM, no direction.  The
//! driver is a dumb actuator: range checks, calibration, and run timing
//! all live in the app core's pump bank.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives a real GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub struct PumpChannel {
    gpio: i32,
    running: bool,
}

impl PumpChannel {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            running: false,
        }
    }

    pub fn set(&mut self, on: bool) {
        hw_init::gpio_write(self.gpio, on);
        self.running = on;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }
}

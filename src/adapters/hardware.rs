//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the eight pump channel drivers and the status LED, exposing the
//! pumps through [`ActuatorPort`].  This is the only module in the system
//! that touches actual output pins.  On non-espidf targets the underlying
//! drivers use cfg-gated simulation stubs.

use crate::app::ports::ActuatorPort;
use crate::config::NUM_PUMPS;
use crate::drivers::pump::PumpChannel;
use crate::drivers::status_led::{LedColour, StatusLed};
use crate::pins;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    pumps: [PumpChannel; NUM_PUMPS],
    led: StatusLed,
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            pumps: pins::PUMP_GPIOS.map(PumpChannel::new),
            led: StatusLed::new(),
        }
    }

    pub fn set_led(&mut self, colour: LedColour) {
        self.led.set(colour);
    }

    /// Whether any pump output is currently driven ON.
    pub fn any_pump_running(&self) -> bool {
        self.pumps.iter().any(PumpChannel::is_running)
    }
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_channel(&mut self, channel: u8, on: bool) {
        // Channel ids are pre-validated by the pump bank; an out-of-range
        // id is a no-op rather than a panic.
        if let Some(pump) = channel
            .checked_sub(1)
            .and_then(|i| self.pumps.get_mut(i as usize))
        {
            pump.set(on);
        }
    }

    fn all_off(&mut self) {
        for pump in &mut self.pumps {
            pump.set(false);
        }
        self.led.off();
    }
}

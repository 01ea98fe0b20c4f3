//! RGB status LED driver.
//!
//! Discrete R/G/B LEDs driven as plain GPIO outputs (on/off per colour —
//! no dimming needed for a status indicator).
//!
//! Colour convention, matching the backend dashboard legend:
//! green = ready, blue = connecting, cyan = dispensing, red = error.

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedColour {
    Off,
    Green,
    Blue,
    Cyan,
    Red,
}

impl LedColour {
    const fn rgb(self) -> (bool, bool, bool) {
        match self {
            Self::Off => (false, false, false),
            Self::Green => (false, true, false),
            Self::Blue => (false, false, true),
            Self::Cyan => (false, true, true),
            Self::Red => (true, false, false),
        }
    }
}

pub struct StatusLed {
    current: LedColour,
}

impl StatusLed {
    pub fn new() -> Self {
        Self {
            current: LedColour::Off,
        }
    }

    pub fn set(&mut self, colour: LedColour) {
        let (r, g, b) = colour.rgb();
        hw_init::gpio_write(pins::LED_R_GPIO, r);
        hw_init::gpio_write(pins::LED_G_GPIO, g);
        hw_init::gpio_write(pins::LED_B_GPIO, b);
        self.current = colour;
    }

    pub fn off(&mut self) {
        self.set(LedColour::Off);
    }

    pub fn current(&self) -> LedColour {
        self.current
    }
}

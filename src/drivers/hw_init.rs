//! One-shot hardware peripheral initialization.
//!
//! Configures the pump and LED GPIO outputs using raw ESP-IDF sys calls.
//! Called once from `main()` before the event loop starts.  Every pump
//! output is driven LOW (pump OFF) as part of initialization.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the event loop; single-threaded.
    unsafe {
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured, pumps OFF");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let mut output_pins = [0i32; pins::PUMP_GPIOS.len() + 3];
    output_pins[..pins::PUMP_GPIOS.len()].copy_from_slice(&pins::PUMP_GPIOS);
    output_pins[pins::PUMP_GPIOS.len()] = pins::LED_R_GPIO;
    output_pins[pins::PUMP_GPIOS.len() + 1] = pins::LED_G_GPIO;
    output_pins[pins::PUMP_GPIOS.len() + 2] = pins::LED_B_GPIO;

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: {} GPIO outputs configured", output_pins.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    unsafe {
        gpio_set_level(pin, if high { 1 } else { 0 });
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── Free heap (heartbeat reporting) ───────────────────────────

#[cfg(target_os = "espidf")]
pub fn free_heap_bytes() -> u32 {
    // SAFETY: esp_get_free_heap_size is a read-only heap query.
    unsafe { esp_get_free_heap_size() }
}

#[cfg(not(target_os = "espidf"))]
pub fn free_heap_bytes() -> u32 {
    0
}

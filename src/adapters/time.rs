//! ESP32 time adapter.
//!
//! Implements [`ClockPort`] for the dispenser:
//!
//! - **`target_os = "espidf"`** — `now_ms` wraps `esp_timer_get_time()`
//!   (microsecond monotonic); `sleep_ms` delays via FreeRTOS so the idle
//!   task keeps running while a pump pours.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` and
//!   `std::thread::sleep` for host-side testing and simulation.

use crate::app::ports::ClockPort;

/// Monotonic clock + blocking delay for the ESP32 target.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Seconds since boot (monotonic) — heartbeat reporting.
    pub fn uptime_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

impl ClockPort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        // SAFETY: esp_timer_get_time is a monotonic counter read.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    #[cfg(target_os = "espidf")]
    fn sleep_ms(&mut self, ms: u64) {
        // vTaskDelay rounds to ticks; 1 tick = 10 ms at the default 100 Hz
        // tick rate, close enough for pour timing at 10 mL/s.
        let ticks = (ms as u32).div_ceil(10).max(1);
        // SAFETY: vTaskDelay merely suspends the calling task.
        unsafe { esp_idf_svc::sys::vTaskDelay(ticks) };
    }

    #[cfg(not(target_os = "espidf"))]
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}

//! Pump bank — the only domain component that commands actuator outputs.
//!
//! Owns the calibration table and the volume→time math, and enforces the
//! channel-range invariant before any [`ActuatorPort`] call.  The timed
//! activation path uses an RAII guard so a channel can never be left
//! running on an abnormal exit.

use log::debug;

use crate::app::calibration::CalibrationTable;
use crate::app::ports::{ActuatorPort, ClockPort};
use crate::error::DispenseError;

/// A validated, ready-to-run activation: channel, calibration-adjusted
/// volume, and the computed run time at the system flow rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispensePlan {
    pub channel: u8,
    pub adjusted_ml: f32,
    pub run_ms: u64,
}

/// Bank of `NUM_PUMPS` pump channels plus their calibration.
#[derive(Debug, Clone)]
pub struct PumpBank {
    calibration: CalibrationTable,
    /// System-wide flow-rate constant (mL/second).  Volume is derived
    /// from elapsed time at this rate — flow-meter feedback is future work.
    flow_rate_ml_per_sec: f32,
}

impl PumpBank {
    pub fn new(calibration: CalibrationTable, flow_rate_ml_per_sec: f32) -> Self {
        Self {
            calibration,
            flow_rate_ml_per_sec,
        }
    }

    /// Validate an item and compute its adjusted volume and run time.
    ///
    /// `requested_ml * calibration[channel]` converted to milliseconds at
    /// the flow-rate constant.  Degenerate float results clamp to zero run
    /// time — never negative.
    pub fn plan(&self, channel: u8, requested_ml: f32) -> Result<DispensePlan, DispenseError> {
        let factor = self.calibration.factor(channel)?;
        if !requested_ml.is_finite() || requested_ml < 0.0 {
            return Err(DispenseError::InvalidVolume(requested_ml));
        }

        let adjusted_ml = requested_ml * factor;
        let run_ms_f = adjusted_ml / self.flow_rate_ml_per_sec * 1000.0;
        let run_ms = if run_ms_f.is_finite() && run_ms_f > 0.0 {
            run_ms_f.round() as u64
        } else {
            0
        };

        Ok(DispensePlan {
            channel,
            adjusted_ml,
            run_ms,
        })
    }

    /// Volume delivered by running a channel for `duration_ms` at the
    /// nominal flow rate (manual start/test path).
    pub fn volume_for_duration(&self, duration_ms: u32) -> f32 {
        duration_ms as f32 / 1000.0 * self.flow_rate_ml_per_sec
    }

    /// Set a channel ON.  Range-checked; no hardware action on error.
    pub fn activate(
        &self,
        channel: u8,
        hw: &mut impl ActuatorPort,
    ) -> Result<(), DispenseError> {
        self.check_channel(channel)?;
        hw.set_channel(channel, true);
        Ok(())
    }

    /// Set a channel OFF.  Range-checked; no hardware action on error.
    /// Safe to call on a channel that is not running.
    pub fn deactivate(
        &self,
        channel: u8,
        hw: &mut impl ActuatorPort,
    ) -> Result<(), DispenseError> {
        self.check_channel(channel)?;
        hw.set_channel(channel, false);
        Ok(())
    }

    /// Scoped activation: ON, block for `run_ms`, OFF.
    ///
    /// Deactivation is guaranteed by the [`ActiveChannel`] guard even if
    /// the wait unwinds — the pump must never be left running.
    pub fn run_for(
        &self,
        channel: u8,
        run_ms: u64,
        hw: &mut impl ActuatorPort,
        clock: &mut impl ClockPort,
    ) -> Result<(), DispenseError> {
        self.check_channel(channel)?;
        debug!("pump {}: running for {} ms", channel, run_ms);

        let active = ActiveChannel::activate(channel, hw);
        clock.sleep_ms(run_ms);
        active.release();
        Ok(())
    }

    fn check_channel(&self, channel: u8) -> Result<(), DispenseError> {
        if self.calibration.contains(channel) {
            Ok(())
        } else {
            Err(DispenseError::InvalidChannel(channel))
        }
    }
}

/// RAII guard over one activated channel.
///
/// Dropping the guard turns the channel off, so the OFF edge survives an
/// early return or panic unwind in the scope holding it.
struct ActiveChannel<'a, A: ActuatorPort> {
    hw: &'a mut A,
    channel: u8,
}

impl<'a, A: ActuatorPort> ActiveChannel<'a, A> {
    fn activate(channel: u8, hw: &'a mut A) -> Self {
        hw.set_channel(channel, true);
        Self { hw, channel }
    }

    /// Deactivate explicitly (normal completion path).
    fn release(self) {
        // Drop does the work; this just names the intent at the call site.
        drop(self);
    }
}

impl<A: ActuatorPort> Drop for ActiveChannel<'_, A> {
    fn drop(&mut self) {
        self.hw.set_channel(self.channel, false);
    }
}

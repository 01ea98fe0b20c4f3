//! Per-channel volumetric calibration.
//!
//! Each pump delivers slightly off-nominal volume for a given run time
//! (tubing length, head height, pump wear).  The calibration factor is a
//! static multiplier applied to the requested volume before conversion to
//! run time.  Factors are validated once at init and immutable afterwards.

use crate::config::NUM_PUMPS;
use crate::error::{DispenseError, Error};

/// Validated mapping from channel id to calibration factor.
///
/// Replaces the parallel-array scheme of earlier firmware: lookups go
/// through the 1-based channel id and the whole table is range-checked at
/// construction, so no code path can observe a zero or negative factor.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    factors: [f32; NUM_PUMPS],
}

impl CalibrationTable {
    /// Build a table from per-channel factors (index 0 = channel 1).
    ///
    /// Every factor must be finite and > 0, otherwise `Error::Config`.
    pub fn new(factors: [f32; NUM_PUMPS]) -> Result<Self, Error> {
        if factors.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return Err(Error::Config("calibration factor must be finite and > 0"));
        }
        Ok(Self { factors })
    }

    /// Factor for `channel` (1-based).
    pub fn factor(&self, channel: u8) -> Result<f32, DispenseError> {
        if channel == 0 {
            return Err(DispenseError::InvalidChannel(channel));
        }
        self.factors
            .get(channel as usize - 1)
            .copied()
            .ok_or(DispenseError::InvalidChannel(channel))
    }

    /// Whether `channel` is a valid 1-based channel id.
    pub fn contains(&self, channel: u8) -> bool {
        channel >= 1 && (channel as usize) <= self.factors.len()
    }
}

impl Default for CalibrationTable {
    /// Identity calibration for every channel.
    fn default() -> Self {
        Self {
            factors: [1.0; NUM_PUMPS],
        }
    }
}

use alloc::vec::Vec;

use crate::error::Error;

/// One point of the piecewise-linear ADC-to-percentage mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub raw: u16,
    pub level: u8,
}

/// Calibrated mapping from a filtered raw sample to a 0-100 percentage.
///
/// Breakpoints must be strictly increasing in both fields, starting at
/// 0% and ending at 100%. Values below the first breakpoint clamp to
/// 0%, values at or above the last clamp to 100%.
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    breakpoints: Vec<Breakpoint>,
}

impl CalibrationTable {
    pub fn new(breakpoints: &[Breakpoint]) -> Result<Self, Error> {
        if breakpoints.len() < 2 {
            return Err(Error::InvalidCalibration);
        }

        if breakpoints[0].level != 0 || breakpoints[breakpoints.len() - 1].level != 100 {
            return Err(Error::InvalidCalibration);
        }

        for pair in breakpoints.windows(2) {
            if pair[1].raw <= pair[0].raw || pair[1].level <= pair[0].level {
                return Err(Error::InvalidCalibration);
            }
        }

        Ok(Self {
            breakpoints: breakpoints.to_vec(),
        })
    }

    pub fn level_for(&self, raw: u16) -> u8 {
        let first = self.breakpoints[0];
        let last = self.breakpoints[self.breakpoints.len() - 1];

        if raw < first.raw {
            return 0;
        }
        if raw >= last.raw {
            return 100;
        }

        for pair in self.breakpoints.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if raw >= lo.raw && raw < hi.raw {
                let ratio = f32::from(raw - lo.raw) / f32::from(hi.raw - lo.raw);
                return lo.level + (ratio * f32::from(hi.level - lo.level)) as u8;
            }
        }

        100
    }
}

impl Default for CalibrationTable {
    /// Reference calibration for a 3.0V-4.2V cell behind a 1.5K + 4.7K
    /// divider on a 12-bit converter. Known-good, skips validation.
    fn default() -> Self {
        Self {
            breakpoints: alloc::vec![
                Breakpoint { raw: 2815, level: 0 },   // 3.0V
                Breakpoint { raw: 3000, level: 20 },  // 3.3V
                Breakpoint { raw: 3200, level: 40 },  // 3.6V
                Breakpoint { raw: 3400, level: 60 },  // 3.8V
                Breakpoint { raw: 3600, level: 80 },  // 4.0V
                Breakpoint { raw: 3940, level: 100 }, // 4.2V
            ],
        }
    }
}

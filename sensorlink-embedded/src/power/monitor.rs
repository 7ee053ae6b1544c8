use alloc::boxed::Box;

use embedded_hal::digital::InputPin;
use embedded_io::Read;

use crate::error::{Error, Result};

use super::PowerConfig;
use super::calibration::CalibrationTable;
use super::filter::SlidingWindow;
use super::sampler::AdcSampler;

pub type StatusCallback = Box<dyn FnMut(bool) + Send>;

/// Last computed view of the battery subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerState {
    pub battery_level: u8,
    pub is_charging: bool,
    pub is_low_battery: bool,
}

/// Debounced battery monitor fed by a 1-second periodic tick.
///
/// Each tick edge-detects the charge line, then samples the ADC on a
/// convergence-aware cadence: every tick while the filter window is
/// still filling, every 60th tick afterwards. Charge edges force an
/// immediate out-of-band sample.
pub struct PowerMonitor<Adc, Pin, const N: usize = 3>
where
    Adc: Read,
    Pin: InputPin,
{
    sampler: AdcSampler<Adc>,
    charge_pin: Pin,
    window: SlidingWindow<N>,
    calibration: CalibrationTable,
    config: PowerConfig,
    battery_level: u8,
    is_charging: bool,
    is_low_battery: bool,
    ticks: u32,
    on_charging_changed: Option<StatusCallback>,
    on_low_battery_changed: Option<StatusCallback>,
}

impl<Adc, Pin, const N: usize> PowerMonitor<Adc, Pin, N>
where
    Adc: Read,
    Pin: InputPin,
{
    pub fn new(
        sampler: AdcSampler<Adc>,
        charge_pin: Pin,
        calibration: CalibrationTable,
        config: PowerConfig,
    ) -> Self {
        Self {
            sampler,
            charge_pin,
            window: SlidingWindow::new(),
            calibration,
            config,
            battery_level: 0,
            is_charging: false,
            is_low_battery: false,
            ticks: 0,
            on_charging_changed: None,
            on_low_battery_changed: None,
        }
    }

    /// Periodic entry point, invoked once per second.
    pub fn tick(&mut self) -> Result<()> {
        // Charge line is active low: asserted means the charger is
        // sourcing current.
        let charging = self
            .charge_pin
            .is_low()
            .map_err(|_| Error::DeviceNotFound)?;

        if charging != self.is_charging {
            self.is_charging = charging;
            log::info!("charging status changed: {}", charging);
            if let Some(callback) = self.on_charging_changed.as_mut() {
                callback(charging);
            }
            // A charge edge refreshes the level immediately, outside
            // the sampling cadence.
            return self.sample_and_update();
        }

        // Sample every tick until the filter window converges.
        if !self.window.is_full() {
            return self.sample_and_update();
        }

        self.ticks += 1;
        if self.ticks % self.config.steady_sample_interval_ticks == 0 {
            return self.sample_and_update();
        }

        Ok(())
    }

    fn sample_and_update(&mut self) -> Result<()> {
        let raw = self.sampler.sample()?;
        self.window.push(raw);

        let mean = match self.window.average() {
            Some(mean) => mean,
            None => return Ok(()),
        };

        self.battery_level = self.calibration.level_for(mean);
        log::debug!("adc raw {}, mean {}, level {}%", raw, mean, self.battery_level);

        // Low-battery detection waits for a full window, so an
        // unconverged filter cannot fire a false notification right
        // after startup.
        if self.window.is_full() {
            let low = self.battery_level <= self.config.low_battery_threshold;
            if low != self.is_low_battery {
                self.is_low_battery = low;
                log::info!("low battery status changed: {}", low);
                if let Some(callback) = self.on_low_battery_changed.as_mut() {
                    callback(low);
                }
            }
        }

        Ok(())
    }

    /// Charging flag for display purposes. Forced false at 100%: a
    /// docking station can hold the charge line asserted indefinitely
    /// at full charge.
    pub fn is_charging(&self) -> bool {
        if self.battery_level == 100 {
            return false;
        }
        self.is_charging
    }

    /// Strict negation of the raw charge-line flag, not of
    /// `is_charging()`. The two queries are not complementary.
    pub fn is_discharging(&self) -> bool {
        !self.is_charging
    }

    pub fn battery_level(&self) -> u8 {
        self.battery_level
    }

    pub fn is_low_battery(&self) -> bool {
        self.is_low_battery
    }

    pub fn state(&self) -> PowerState {
        PowerState {
            battery_level: self.battery_level,
            is_charging: self.is_charging(),
            is_low_battery: self.is_low_battery,
        }
    }

    /// Battery rail voltage derived from the filtered mean, for
    /// debugging and calibration. 0.0 until the first sample.
    pub fn battery_voltage(&self) -> f32 {
        match self.window.average() {
            Some(mean) => {
                let adc_voltage = f32::from(mean) * self.config.reference_voltage
                    / f32::from(self.config.adc_max_value);
                adc_voltage / self.config.divider_ratio
            }
            None => 0.0,
        }
    }

    /// Current filtered mean of the raw ADC window. 0 until the first
    /// sample.
    pub fn raw_adc_value(&self) -> u16 {
        self.window.average().unwrap_or(0)
    }

    pub fn on_charging_status_changed(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.on_charging_changed = Some(Box::new(callback));
    }

    pub fn on_low_battery_status_changed(&mut self, callback: impl FnMut(bool) + Send + 'static) {
        self.on_low_battery_changed = Some(Box::new(callback));
    }
}

#[cfg(test)]
pub mod mock {
    use alloc::sync::Arc;
    use core::convert::Infallible;
    use core::sync::atomic::{AtomicBool, Ordering};

    use embedded_hal::digital::InputPin;

    /// Charge-detect line whose level can be flipped mid-test.
    #[derive(Clone)]
    pub struct TestPin {
        asserted: Arc<AtomicBool>,
    }

    impl TestPin {
        pub fn new(asserted: bool) -> Self {
            Self {
                asserted: Arc::new(AtomicBool::new(asserted)),
            }
        }

        pub fn assert_line(&self, asserted: bool) {
            self.asserted.store(asserted, Ordering::SeqCst);
        }
    }

    impl embedded_hal::digital::ErrorType for TestPin {
        type Error = Infallible;
    }

    impl InputPin for TestPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.asserted.load(Ordering::SeqCst))
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.asserted.load(Ordering::SeqCst))
        }
    }
}

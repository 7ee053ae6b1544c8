use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Ticker};
use embedded_hal::digital::InputPin;
use embedded_io::Read;

use crate::error::Result;

use super::monitor::{PowerMonitor, PowerState};

/// Cadence of the battery check tick.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Lock-protected front for [`PowerMonitor`]: the periodic tick and
/// foreground queries serialize through one blocking mutex, so readers
/// never observe a half-updated state.
pub struct PowerService<M, Adc, Pin, const N: usize = 3>
where
    M: RawMutex,
    Adc: Read,
    Pin: InputPin,
{
    monitor: Mutex<M, RefCell<PowerMonitor<Adc, Pin, N>>>,
}

impl<M, Adc, Pin, const N: usize> PowerService<M, Adc, Pin, N>
where
    M: RawMutex,
    Adc: Read,
    Pin: InputPin,
{
    pub fn new(monitor: PowerMonitor<Adc, Pin, N>) -> Self {
        Self {
            monitor: Mutex::new(RefCell::new(monitor)),
        }
    }

    pub fn tick(&self) -> Result<()> {
        self.monitor.lock(|m| m.borrow_mut().tick())
    }

    pub fn state(&self) -> PowerState {
        self.monitor.lock(|m| m.borrow().state())
    }

    pub fn battery_level(&self) -> u8 {
        self.monitor.lock(|m| m.borrow().battery_level())
    }

    pub fn is_charging(&self) -> bool {
        self.monitor.lock(|m| m.borrow().is_charging())
    }

    pub fn is_discharging(&self) -> bool {
        self.monitor.lock(|m| m.borrow().is_discharging())
    }

    pub fn is_low_battery(&self) -> bool {
        self.monitor.lock(|m| m.borrow().is_low_battery())
    }

    pub fn battery_voltage(&self) -> f32 {
        self.monitor.lock(|m| m.borrow().battery_voltage())
    }

    pub fn raw_adc_value(&self) -> u16 {
        self.monitor.lock(|m| m.borrow().raw_adc_value())
    }

    pub fn on_charging_status_changed(&self, callback: impl FnMut(bool) + Send + 'static) {
        self.monitor
            .lock(|m| m.borrow_mut().on_charging_status_changed(callback));
    }

    pub fn on_low_battery_status_changed(&self, callback: impl FnMut(bool) + Send + 'static) {
        self.monitor
            .lock(|m| m.borrow_mut().on_low_battery_status_changed(callback));
    }

    /// Battery check loop. The ticker is created eagerly and lives for
    /// the rest of the process; a transient peripheral failure skips
    /// the tick and keeps the previous state.
    pub async fn run(&self) -> ! {
        let mut ticker = Ticker::every(TICK_INTERVAL);
        loop {
            ticker.next().await;
            if let Err(e) = self.tick() {
                log::warn!("battery check skipped: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::super::PowerConfig;
    use super::super::calibration::CalibrationTable;
    use super::super::monitor::mock::TestPin;
    use super::super::sampler::AdcSampler;
    use super::super::sampler::mock::ScriptedAdc;
    use super::*;

    fn service(
        values: &[u16],
        asserted: bool,
    ) -> PowerService<CriticalSectionRawMutex, ScriptedAdc, TestPin, 3> {
        PowerService::new(PowerMonitor::new(
            AdcSampler::new(ScriptedAdc::new(values)),
            TestPin::new(asserted),
            CalibrationTable::default(),
            PowerConfig::default(),
        ))
    }

    #[test]
    fn queries_reflect_ticked_state() {
        let svc = service(&[3200, 3200, 3200], false);

        for _ in 0..3 {
            svc.tick().unwrap();
        }

        let state = svc.state();
        assert_eq!(state.battery_level, 40);
        assert!(!state.is_charging);
        assert!(!state.is_low_battery);
        assert_eq!(svc.raw_adc_value(), 3200);
        assert!(svc.is_discharging());
    }

    #[test]
    fn snapshot_applies_the_full_charge_mask() {
        let svc = service(&[3940, 3940, 3940], true);

        for _ in 0..3 {
            svc.tick().unwrap();
        }

        assert_eq!(svc.battery_level(), 100);
        assert!(!svc.state().is_charging);
        assert!(!svc.is_discharging());
    }
}

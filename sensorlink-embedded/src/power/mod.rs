mod calibration;
mod filter;
mod monitor;
mod sampler;
mod service;

pub use calibration::{Breakpoint, CalibrationTable};
pub use filter::SlidingWindow;
pub use monitor::{PowerMonitor, PowerState};
pub use sampler::AdcSampler;
pub use service::PowerService;

#[derive(Debug, Clone)]
pub struct PowerConfig {
    /// Ticks between ADC samples once the filter window is full.
    pub steady_sample_interval_ticks: u32,
    /// Battery percentage at or below which the low-battery flag asserts.
    pub low_battery_threshold: u8,
    /// ADC full-scale reference voltage (volt).
    pub reference_voltage: f32,
    /// ADC resolution, typically 12-bit (4095).
    pub adc_max_value: u16,
    /// Voltage divider ratio between the battery rail and the ADC input.
    pub divider_ratio: f32,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            steady_sample_interval_ticks: 60,
            low_battery_threshold: 20,
            reference_voltage: 3.3,
            adc_max_value: 4095,
            divider_ratio: 0.758, // 4.7K / (1.5K + 4.7K)
        }
    }
}

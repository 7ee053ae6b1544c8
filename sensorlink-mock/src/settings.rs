use std::error::Error;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    /// Total wall-clock runtime of the simulation in seconds.
    pub runtime_secs: u64,
    /// How often the scenario driver intervenes (drain, plug, unplug).
    pub control_interval_secs: u64,
    /// Raw ADC counts removed from the cell on every discharge step.
    pub drain_per_step: u16,
    /// Standard deviation of the gaussian noise added to ADC samples.
    pub adc_noise_sigma: f64,
    /// Probability that a single environmental read fails in transit.
    pub dht_fault_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let settings: Settings = toml::from_str(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../",
            "configs/default.toml"
        )))?;

        Ok(settings)
    }
}

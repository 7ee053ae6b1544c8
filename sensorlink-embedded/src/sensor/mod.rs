mod dht11;
mod gate;
mod poller;

pub use dht11::Dht11Driver;
pub use gate::GatedSensor;
pub use poller::SensorPoller;

#[cfg(test)]
pub(crate) use dht11::mock;

use alloc::string::String;

/// Identity reported in status records.
pub const DRIVER_NAME: &str = "dht11";

#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Configured retry budget for a single read attempt.
    pub max_retry_count: u32,
    /// Protocol-level timeout for one blocking read (ms).
    pub timeout_ms: u32,
    /// Minimum spacing between periodic reads (ms).
    pub read_interval_ms: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            max_retry_count: 3,
            timeout_ms: 2000,
            read_interval_ms: 60_000,
        }
    }
}

/// One temperature/humidity measurement. Produced fresh on every read;
/// invalid readings are tagged rather than defaulted to zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub temperature: f32,
    pub humidity: f32,
    pub is_valid: bool,
    pub timestamp_micros: u64,
    pub retry_count: u32,
}

impl SensorReading {
    pub fn invalid(timestamp_micros: u64, retry_count: u32) -> Self {
        Self {
            temperature: 0.0,
            humidity: 0.0,
            is_valid: false,
            timestamp_micros,
            retry_count,
        }
    }

    /// Fixed-schema status record. Temperature and humidity serialize
    /// as null when invalid, so "no reading" is distinguishable from
    /// zero degrees.
    pub fn to_status_json(&self) -> String {
        if self.is_valid {
            alloc::format!(
                "{{\"driver\":\"{}\",\"temperature\":{:.1},\"humidity\":{:.1},\"is_valid\":true,\"timestamp\":{},\"retry_count\":{}}}",
                DRIVER_NAME,
                self.temperature,
                self.humidity,
                self.timestamp_micros,
                self.retry_count
            )
        } else {
            alloc::format!(
                "{{\"driver\":\"{}\",\"temperature\":null,\"humidity\":null,\"is_valid\":false,\"timestamp\":{},\"retry_count\":{}}}",
                DRIVER_NAME,
                self.timestamp_micros,
                self.retry_count
            )
        }
    }
}

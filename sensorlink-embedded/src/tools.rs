//! Parameterless operations exposed to the remote tool-invocation
//! layer. Each method maps to one external tool call and answers with
//! plain text; registration against the actual command transport
//! happens in the board bring-up layer.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io::Read;

use crate::sensor::{GatedSensor, SensorPoller};

/// Sentinel returned by `get_temperature` when no valid reading exists.
pub const INVALID_TEMPERATURE: &str = "-999.0";
/// Sentinel returned by `get_humidity` when no valid reading exists.
pub const INVALID_HUMIDITY: &str = "-1.0";

pub struct SensorTools<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    sensor: Arc<GatedSensor<M, IO>>,
    poller: Arc<SensorPoller<M, IO>>,
}

impl<M, IO> SensorTools<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    pub fn new(sensor: Arc<GatedSensor<M, IO>>, poller: Arc<SensorPoller<M, IO>>) -> Self {
        Self { sensor, poller }
    }

    /// Current temperature as a decimal string, or the invalid
    /// sentinel.
    pub fn get_temperature(&self) -> String {
        let reading = self.sensor.read();
        if reading.is_valid {
            format!("{:.1}", reading.temperature)
        } else {
            String::from(INVALID_TEMPERATURE)
        }
    }

    /// Current relative humidity as a decimal string, or the invalid
    /// sentinel.
    pub fn get_humidity(&self) -> String {
        let reading = self.sensor.read();
        if reading.is_valid {
            format!("{:.1}", reading.humidity)
        } else {
            String::from(INVALID_HUMIDITY)
        }
    }

    /// Full status record for the most recent reading.
    pub fn get_combined_status(&self) -> String {
        self.sensor.status_json()
    }

    /// Opens the sensor gate and starts periodic polling.
    pub fn enable_sensor(&self) -> String {
        match self.sensor.enable() {
            Ok(()) => {
                if let Err(e) = self.poller.start() {
                    log::warn!("sensor enabled but poller did not start: {}", e);
                }
                String::from("temperature/humidity monitoring enabled")
            }
            Err(_) => String::from("failed to enable sensor, check the wiring"),
        }
    }

    /// Stops periodic polling and closes the sensor gate.
    pub fn disable_sensor(&self) -> String {
        self.poller.stop();
        match self.sensor.disable() {
            Ok(()) => String::from("temperature/humidity monitoring disabled"),
            Err(_) => String::from("failed to disable sensor"),
        }
    }

    /// Gate and poll-timer state snapshot.
    pub fn get_sensor_status(&self) -> String {
        let last_read = self
            .sensor
            .last_read_at()
            .map(|t| t.as_micros())
            .unwrap_or(0);

        format!(
            "{{\"enabled\":{},\"timer_running\":{},\"last_read_time\":{}}}",
            self.sensor.is_enabled(),
            self.poller.is_running(),
            last_read
        )
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
    use embassy_time::Duration;

    use crate::sensor::Dht11Driver;
    use crate::sensor::mock::{ScriptedDht, frame};
    use super::*;

    fn tools(frames: &[Option<[u8; 5]>]) -> SensorTools<CriticalSectionRawMutex, ScriptedDht> {
        let sensor = Arc::new(GatedSensor::new(Dht11Driver::new(ScriptedDht::new(frames))));
        let poller = Arc::new(SensorPoller::new(sensor.clone(), Duration::from_secs(60)));
        SensorTools::new(sensor, poller)
    }

    #[test]
    fn temperature_and_humidity_report_sentinels_while_disabled() {
        let t = tools(&[Some(frame(56, 0, 23, 4))]);

        assert_eq!(t.get_temperature(), INVALID_TEMPERATURE);
        assert_eq!(t.get_humidity(), INVALID_HUMIDITY);
    }

    #[test]
    fn enabled_sensor_reports_decimal_values() {
        let t = tools(&[Some(frame(56, 0, 23, 4)); 3]);

        t.enable_sensor();
        assert_eq!(t.get_temperature(), "23.4");
        assert_eq!(t.get_humidity(), "56.0");
    }

    #[test]
    fn enable_starts_the_poller_and_disable_stops_it() {
        let t = tools(&[Some(frame(56, 0, 23, 4)); 2]);

        let enabled = t.enable_sensor();
        assert!(enabled.contains("enabled"));
        assert!(t.poller.is_running());

        let disabled = t.disable_sensor();
        assert!(disabled.contains("disabled"));
        assert!(!t.poller.is_running());
        assert!(!t.sensor.is_enabled());
    }

    #[test]
    fn enable_failure_reports_text_and_keeps_the_gate_closed() {
        let t = tools(&[None]);

        let response = t.enable_sensor();
        assert!(response.contains("failed"));
        assert!(!t.sensor.is_enabled());
        assert!(!t.poller.is_running());
    }

    #[test]
    fn sensor_status_reflects_gate_and_timer_flags() {
        let t = tools(&[Some(frame(56, 0, 23, 4)); 3]);

        assert_eq!(
            t.get_sensor_status(),
            "{\"enabled\":false,\"timer_running\":false,\"last_read_time\":0}"
        );

        t.enable_sensor();
        let status = t.get_sensor_status();
        assert!(status.contains("\"enabled\":true"));
        assert!(status.contains("\"timer_running\":true"));
    }

    #[test]
    fn combined_status_tracks_validity() {
        let t = tools(&[Some(frame(56, 0, 23, 4)); 3]);

        assert!(t.get_combined_status().contains("\"temperature\":null"));

        t.enable_sensor();
        let status = t.get_combined_status();
        assert!(status.contains("\"temperature\":23.4"));
        assert!(status.contains("\"is_valid\":true"));
    }
}

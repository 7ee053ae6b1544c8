use alloc::string::String;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};
use embedded_io::Read;

use crate::error::Result;

use super::dht11::Dht11Driver;
use super::SensorReading;

struct GateState<IO>
where
    IO: Read,
{
    driver: Dht11Driver<IO>,
    enabled: bool,
    retry_count: u32,
    last_reading: Option<SensorReading>,
    last_read_at: Option<Instant>,
}

/// Enable gate around an environmental sensor driver.
///
/// Created disabled: unreliable hardware stays silent until a caller
/// explicitly enables it, and enabling requires a successful test
/// read. Gate transitions and the read path serialize through one
/// lock, so a control-plane toggle cannot interleave with a
/// timer-driven poll.
pub struct GatedSensor<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    state: Mutex<M, RefCell<GateState<IO>>>,
}

impl<M, IO> GatedSensor<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    pub fn new(driver: Dht11Driver<IO>) -> Self {
        Self {
            state: Mutex::new(RefCell::new(GateState {
                driver,
                enabled: false,
                retry_count: 0,
                last_reading: None,
                last_read_at: None,
            })),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock(|s| s.borrow().enabled)
    }

    /// Opens the gate. A synchronous test read must succeed first;
    /// enabling an already-enabled sensor is a no-op.
    pub fn enable(&self) -> Result<()> {
        self.state.lock(|s| {
            let mut state = s.borrow_mut();

            if state.enabled {
                log::warn!("sensor is already enabled");
                return Ok(());
            }

            match state.driver.read_frame() {
                Ok((temperature, humidity)) => {
                    log::info!(
                        "sensor connection test passed: {:.1}C, {:.1}%",
                        temperature,
                        humidity
                    );
                    state.enabled = true;
                    Ok(())
                }
                Err(e) => {
                    log::error!("failed to enable sensor: {}", e);
                    Err(e)
                }
            }
        })
    }

    /// Closes the gate unconditionally; no read required.
    pub fn disable(&self) -> Result<()> {
        self.state.lock(|s| {
            let mut state = s.borrow_mut();

            if !state.enabled {
                log::warn!("sensor is already disabled");
                return Ok(());
            }

            state.enabled = false;
            log::info!("sensor disabled");
            Ok(())
        })
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled { self.enable() } else { self.disable() }
    }

    /// Single-shot read. While disabled this performs no I/O at all
    /// and returns an invalid reading immediately.
    pub fn read(&self) -> SensorReading {
        self.state.lock(|s| {
            let mut state = s.borrow_mut();
            let now = Instant::now();

            if !state.enabled {
                log::debug!("sensor is disabled, returning invalid reading");
                return SensorReading::invalid(now.as_micros(), 0);
            }

            match state.driver.read_frame() {
                Ok((temperature, humidity)) => {
                    state.retry_count = 0;
                    let reading = SensorReading {
                        temperature,
                        humidity,
                        is_valid: true,
                        timestamp_micros: now.as_micros(),
                        retry_count: 0,
                    };
                    state.last_reading = Some(reading);
                    state.last_read_at = Some(now);
                    log::info!("sensor read: {:.1}C, {:.1}%", temperature, humidity);
                    reading
                }
                Err(e) => {
                    // Consecutive-failure tally, reset only by the
                    // next successful read.
                    state.retry_count += 1;
                    log::warn!("sensor read failed: {} (failure #{})", e, state.retry_count);
                    SensorReading::invalid(now.as_micros(), state.retry_count)
                }
            }
        })
    }

    /// Forces a fresh read and serializes it into the status schema.
    pub fn status_json(&self) -> String {
        self.read().to_status_json()
    }

    pub fn last_retry_count(&self) -> u32 {
        self.state.lock(|s| s.borrow().retry_count)
    }

    pub fn last_reading(&self) -> Option<SensorReading> {
        self.state.lock(|s| s.borrow().last_reading)
    }

    /// Timestamp of the last successful read, if any.
    pub fn last_read_at(&self) -> Option<Instant> {
        self.state.lock(|s| s.borrow().last_read_at)
    }

    /// Minimum spacing between periodic reads, from the driver config.
    pub fn read_interval(&self) -> Duration {
        self.state
            .lock(|s| Duration::from_millis(u64::from(s.borrow().driver.config().read_interval_ms)))
    }
}

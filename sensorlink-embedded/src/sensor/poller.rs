use alloc::sync::Arc;
use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant, Ticker, Timer};
use embedded_io::Read;

use crate::error::{Error, Result};

use super::gate::GatedSensor;

/// Cadence at which a stopped poller re-checks for a start request.
const IDLE_CHECK_INTERVAL: Duration = Duration::from_secs(1);

struct PollState {
    running: bool,
    interval: Duration,
}

/// Timer-driven read scheduler for a gated sensor.
///
/// The interval ticker exists only while the poller runs: `start`
/// arms it lazily, `stop` releases it entirely rather than pausing.
/// The power subsystem's tick loop is the opposite policy and never
/// tears its ticker down.
pub struct SensorPoller<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    sensor: Arc<GatedSensor<M, IO>>,
    state: Mutex<M, RefCell<PollState>>,
}

impl<M, IO> SensorPoller<M, IO>
where
    M: RawMutex,
    IO: Read,
{
    pub fn new(sensor: Arc<GatedSensor<M, IO>>, interval: Duration) -> Self {
        Self {
            sensor,
            state: Mutex::new(RefCell::new(PollState {
                running: false,
                interval,
            })),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.lock(|s| s.borrow().running)
    }

    pub fn interval(&self) -> Duration {
        self.state.lock(|s| s.borrow().interval)
    }

    /// Begins periodic polling. No-op when already running; fails when
    /// the sensor gate is closed.
    pub fn start(&self) -> Result<()> {
        if self.is_running() {
            log::warn!("sensor poller is already running");
            return Ok(());
        }

        if !self.sensor.is_enabled() {
            log::warn!("cannot start sensor poller: sensor not enabled");
            return Err(Error::InvalidState);
        }

        self.state.lock(|s| s.borrow_mut().running = true);
        log::info!("sensor poller started");
        Ok(())
    }

    /// Halts periodic polling. No-op when not running. Does not
    /// interrupt an in-flight read, only future scheduling.
    pub fn stop(&self) {
        self.state.lock(|s| {
            let mut state = s.borrow_mut();

            if !state.running {
                log::warn!("sensor poller is not running");
                return;
            }

            state.running = false;
            log::info!("sensor poller stopped");
        });
    }

    /// One poll step. Skips when a foreground read already refreshed
    /// the sensor within the poll interval, so the timer and manual
    /// reads never double-fire.
    pub fn poll(&self) {
        if let Some(last) = self.sensor.last_read_at() {
            if Instant::now().duration_since(last) < self.interval() {
                log::debug!("skipping poll, last read is recent");
                return;
            }
        }

        let reading = self.sensor.read();
        if !reading.is_valid {
            log::warn!("periodic sensor read failed, failure #{}", reading.retry_count);
        }
    }

    /// Poll loop. Parks while stopped; the interval ticker is created
    /// on start and dropped again on stop.
    pub async fn run(&self) -> ! {
        loop {
            while !self.is_running() {
                Timer::after(IDLE_CHECK_INTERVAL).await;
            }

            let mut ticker = Ticker::every(self.interval());
            while self.is_running() {
                ticker.next().await;
                if self.is_running() {
                    self.poll();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::Ordering;

    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    use super::super::dht11::Dht11Driver;
    use super::super::dht11::mock::{ScriptedDht, frame};
    use super::*;

    fn fixture(
        frames: &[Option<[u8; 5]>],
    ) -> (
        Arc<GatedSensor<CriticalSectionRawMutex, ScriptedDht>>,
        SensorPoller<CriticalSectionRawMutex, ScriptedDht>,
        alloc::sync::Arc<core::sync::atomic::AtomicU32>,
    ) {
        let transport = ScriptedDht::new(frames);
        let reads = transport.read_counter();
        let sensor = Arc::new(GatedSensor::new(Dht11Driver::new(transport)));
        let poller = SensorPoller::new(sensor.clone(), Duration::from_secs(60));
        (sensor, poller, reads)
    }

    #[test]
    fn start_fails_while_sensor_is_disabled() {
        let (_, poller, _) = fixture(&[Some(frame(56, 0, 23, 4))]);

        assert_eq!(poller.start(), Err(Error::InvalidState));
        assert!(!poller.is_running());
    }

    #[test]
    fn start_is_idempotent_once_running() {
        let (sensor, poller, _) = fixture(&[Some(frame(56, 0, 23, 4))]);
        sensor.enable().unwrap();

        assert!(poller.start().is_ok());
        assert!(poller.is_running());
        assert!(poller.start().is_ok());
        assert!(poller.is_running());
    }

    #[test]
    fn stop_twice_is_a_no_op() {
        let (sensor, poller, _) = fixture(&[Some(frame(56, 0, 23, 4))]);
        sensor.enable().unwrap();
        poller.start().unwrap();

        poller.stop();
        assert!(!poller.is_running());
        poller.stop();
        assert!(!poller.is_running());
    }

    #[test]
    fn poll_skips_when_a_manual_read_is_recent() {
        let (sensor, poller, reads) = fixture(&[
            Some(frame(56, 0, 23, 4)),
            Some(frame(56, 0, 23, 4)),
            Some(frame(56, 0, 23, 4)),
        ]);
        sensor.enable().unwrap();
        poller.start().unwrap();

        // Foreground read refreshes the shared timestamp.
        assert!(sensor.read().is_valid);
        let before = reads.load(Ordering::SeqCst);

        poller.poll();
        assert_eq!(reads.load(Ordering::SeqCst), before);
    }

    #[test]
    fn poll_reads_when_no_recent_read_exists() {
        let (sensor, poller, reads) = fixture(&[Some(frame(56, 0, 23, 4)); 2]);
        sensor.enable().unwrap();
        poller.start().unwrap();

        let before = reads.load(Ordering::SeqCst);
        poller.poll();
        assert_eq!(reads.load(Ordering::SeqCst), before + 1);
    }
}

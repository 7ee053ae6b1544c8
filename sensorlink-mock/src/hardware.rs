//! Fake board peripherals. Each mock implements the same embedded-hal
//! or embedded-io trait the real part would sit behind, so the
//! monitoring stack runs unmodified on the host.

use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const ADC_MAX: u16 = 4095;

/// Shared battery cell. The scenario driver moves the stored ADC
/// count; the mock ADC reads it back with noise.
#[derive(Clone)]
pub struct BatteryCell {
    raw: Arc<AtomicU16>,
}

impl BatteryCell {
    pub fn new(initial: u16) -> Self {
        Self {
            raw: Arc::new(AtomicU16::new(initial)),
        }
    }

    pub fn raw(&self) -> u16 {
        self.raw.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: u16) {
        self.raw.store(value.min(ADC_MAX), Ordering::Relaxed);
    }

    pub fn drain(&self, counts: u16) {
        let current = self.raw();
        self.set(current.saturating_sub(counts));
    }

    pub fn charge(&self, counts: u16) {
        let current = self.raw();
        self.set(current.saturating_add(counts));
    }
}

/// ADC front-end for the battery divider. Yields the cell value plus
/// gaussian noise as a big-endian word.
pub struct MockBatteryAdc {
    cell: BatteryCell,
    noise: Normal<f64>,
    rng: StdRng,
}

impl MockBatteryAdc {
    pub fn new(cell: BatteryCell, noise_sigma: f64) -> Self {
        Self {
            cell,
            noise: Normal::new(0.0, noise_sigma.max(f64::MIN_POSITIVE))
                .unwrap_or_else(|_| Normal::new(0.0, 1.0).unwrap()),
            rng: StdRng::from_os_rng(),
        }
    }
}

impl embedded_io::ErrorType for MockBatteryAdc {
    type Error = Infallible;
}

impl embedded_io::Read for MockBatteryAdc {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let noisy = self.cell.raw() as f64 + self.noise.sample(&mut self.rng);
        let sample = noisy.clamp(0.0, ADC_MAX as f64) as u16;

        let bytes = sample.to_be_bytes();
        let len = bytes.len().min(buf.len());
        buf[..len].copy_from_slice(&bytes[..len]);
        Ok(len)
    }
}

/// Shared charger-present line, active low at the pin.
#[derive(Clone)]
pub struct ChargeLine {
    plugged: Arc<AtomicBool>,
}

impl ChargeLine {
    pub fn new() -> Self {
        Self {
            plugged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn plug(&self) {
        self.plugged.store(true, Ordering::Relaxed);
    }

    pub fn unplug(&self) {
        self.plugged.store(false, Ordering::Relaxed);
    }

    pub fn is_plugged(&self) -> bool {
        self.plugged.load(Ordering::Relaxed)
    }
}

impl Default for ChargeLine {
    fn default() -> Self {
        Self::new()
    }
}

pub struct MockChargePin {
    line: ChargeLine,
}

impl MockChargePin {
    pub fn new(line: ChargeLine) -> Self {
        Self { line }
    }
}

impl PinErrorType for MockChargePin {
    type Error = Infallible;
}

impl InputPin for MockChargePin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.line.is_plugged())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.line.is_plugged())
    }
}

/// Environmental sensor that walks a slow daily curve and drops a
/// configurable fraction of reads on the floor.
pub struct MockDht11 {
    step: u32,
    fault_rate: f64,
    rng: StdRng,
}

impl MockDht11 {
    pub fn new(fault_rate: f64) -> Self {
        Self {
            step: 0,
            fault_rate: fault_rate.clamp(0.0, 1.0),
            rng: StdRng::from_os_rng(),
        }
    }

    fn frame(&mut self) -> [u8; 5] {
        let phase = f64::from(self.step % 240) / 240.0 * std::f64::consts::TAU;
        self.step = self.step.wrapping_add(1);

        let temperature = 22.0 + phase.sin() * 6.0;
        let humidity = 55.0 + phase.cos() * 15.0;

        let temp_int = temperature.trunc() as u8;
        let temp_dec = ((temperature.fract() * 10.0).round() as u8).min(9);
        let hum_int = humidity.trunc() as u8;
        let hum_dec = ((humidity.fract() * 10.0).round() as u8).min(9);

        let checksum = hum_int
            .wrapping_add(hum_dec)
            .wrapping_add(temp_int)
            .wrapping_add(temp_dec);

        [hum_int, hum_dec, temp_int, temp_dec, checksum]
    }
}

impl embedded_io::ErrorType for MockDht11 {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for MockDht11 {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.rng.random_bool(self.fault_rate) {
            return Err(embedded_io::ErrorKind::TimedOut);
        }

        let frame = self.frame();
        let len = frame.len().min(buf.len());
        buf[..len].copy_from_slice(&frame[..len]);
        Ok(len)
    }
}

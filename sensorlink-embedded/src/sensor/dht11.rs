use alloc::vec::Vec;

use embedded_io::Read;

use crate::error::Error;

use super::SensorConfig;

/// A DHT11 frame: humidity integral/decimal, temperature
/// integral/decimal, checksum (low byte of the sum of the first four).
const FRAME_LEN: usize = 5;

/// Blocking single-shot DHT11 protocol over a byte transport.
pub struct Dht11Driver<IO>
where
    IO: Read,
{
    io_device: IO,
    buffer: Vec<u8>,
    config: SensorConfig,
}

impl<IO> Dht11Driver<IO>
where
    IO: Read,
{
    pub fn new(io_device: IO) -> Self {
        Self::with_config(io_device, SensorConfig::default())
    }

    pub fn with_config(io_device: IO, config: SensorConfig) -> Self {
        Self {
            io_device,
            buffer: Vec::with_capacity(FRAME_LEN),
            config,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Reads one frame and returns `(temperature, humidity)`.
    pub fn read_frame(&mut self) -> Result<(f32, f32), Error> {
        self.buffer.clear();
        self.buffer.resize(FRAME_LEN, 0);

        let read_count = self
            .io_device
            .read(&mut self.buffer)
            .map_err(|_| Error::DeviceNotFound)?;

        if read_count < FRAME_LEN {
            return Err(Error::ReadTimeout);
        }

        let sum = self.buffer[..4]
            .iter()
            .fold(0u8, |acc, &byte| acc.wrapping_add(byte));
        if sum != self.buffer[4] {
            return Err(Error::ChecksumMismatch);
        }

        let humidity = f32::from(self.buffer[0]) + f32::from(self.buffer[1]) / 10.0;
        let magnitude = f32::from(self.buffer[2]) + f32::from(self.buffer[3] & 0x7F) / 10.0;
        let temperature = if self.buffer[3] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        };

        if !(0.0..=100.0).contains(&humidity) || !(-40.0..=80.0).contains(&temperature) {
            return Err(Error::ReadingOutOfRange);
        }

        Ok((temperature, humidity))
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{ScriptedDht, frame};
    use super::*;

    #[test]
    fn parses_a_valid_frame() {
        let mut driver = Dht11Driver::new(ScriptedDht::new(&[Some(frame(56, 0, 23, 4))]));

        let (temperature, humidity) = driver.read_frame().unwrap();
        assert_eq!(temperature, 23.4);
        assert_eq!(humidity, 56.0);
    }

    #[test]
    fn sign_bit_negates_temperature() {
        let mut driver = Dht11Driver::new(ScriptedDht::new(&[Some(frame(40, 0, 10, 0x85))]));

        let (temperature, _) = driver.read_frame().unwrap();
        assert_eq!(temperature, -10.5);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let mut bad = frame(56, 0, 23, 4);
        bad[4] = bad[4].wrapping_add(1);
        let mut driver = Dht11Driver::new(ScriptedDht::new(&[Some(bad)]));

        assert_eq!(driver.read_frame(), Err(Error::ChecksumMismatch));
    }

    #[test]
    fn short_read_is_a_timeout() {
        // A 2-byte buffer can only deliver a truncated frame.
        struct Short;

        impl embedded_io::ErrorType for Short {
            type Error = embedded_io::ErrorKind;
        }

        impl Read for Short {
            fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
                buf[0] = 56;
                buf[1] = 0;
                Ok(2)
            }
        }

        let mut driver = Dht11Driver::new(Short);
        assert_eq!(driver.read_frame(), Err(Error::ReadTimeout));
    }

    #[test]
    fn rejects_out_of_range_humidity() {
        let mut driver = Dht11Driver::new(ScriptedDht::new(&[Some(frame(101, 0, 23, 4))]));

        assert_eq!(driver.read_frame(), Err(Error::ReadingOutOfRange));
    }

    #[test]
    fn transport_failure_maps_to_device_not_found() {
        let mut driver = Dht11Driver::new(ScriptedDht::new(&[None]));

        assert_eq!(driver.read_frame(), Err(Error::DeviceNotFound));
    }
}

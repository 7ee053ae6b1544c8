use alloc::vec::Vec;

use embedded_io::Read;

use crate::error::Error;

/// On-demand reader for one quantized analog channel.
///
/// The transport delivers each conversion as a 2-byte big-endian frame.
pub struct AdcSampler<IO>
where
    IO: Read,
{
    io_device: IO,
    buffer: Vec<u8>,
    max_value: u16,
}

impl<IO> AdcSampler<IO>
where
    IO: Read,
{
    pub fn new(io_device: IO) -> Self {
        Self::with_max_value(io_device, 4095)
    }

    pub fn with_max_value(io_device: IO, max_value: u16) -> Self {
        Self {
            io_device,
            buffer: Vec::with_capacity(2),
            max_value,
        }
    }

    pub fn sample(&mut self) -> Result<u16, Error> {
        self.buffer.clear();
        self.buffer.resize(2, 0);

        let read_count = self
            .io_device
            .read(&mut self.buffer)
            .map_err(|_| Error::DeviceNotFound)?;

        if read_count < 2 {
            return Err(Error::ReadTimeout);
        }

        let raw = u16::from_be_bytes([self.buffer[0], self.buffer[1]]);

        if raw > self.max_value {
            return Err(Error::ReadingOutOfRange);
        }

        Ok(raw)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::{BrokenAdc, ScriptedAdc};
    use super::*;

    #[test]
    fn samples_big_endian_value() {
        let mut sampler = AdcSampler::new(ScriptedAdc::new(&[2815, 3940]));
        assert_eq!(sampler.sample(), Ok(2815));
        assert_eq!(sampler.sample(), Ok(3940));
        // Scripted values exhausted, the last one repeats.
        assert_eq!(sampler.sample(), Ok(3940));
    }

    #[test]
    fn rejects_values_above_full_scale() {
        let mut sampler = AdcSampler::new(ScriptedAdc::new(&[4096]));
        assert_eq!(sampler.sample(), Err(Error::ReadingOutOfRange));
    }

    #[test]
    fn propagates_transport_failure() {
        let mut sampler = AdcSampler::new(BrokenAdc);
        assert_eq!(sampler.sample(), Err(Error::DeviceNotFound));
    }
}

use core::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    DeviceNotFound,
    InvalidState,
    InvalidCalibration,
    ReadTimeout,
    ChecksumMismatch,
    ReadingOutOfRange,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DeviceNotFound => write!(f, "Device not found"),
            Error::InvalidState => write!(f, "Invalid state"),
            Error::InvalidCalibration => write!(f, "Invalid calibration table"),
            Error::ReadTimeout => write!(f, "Read timed out"),
            Error::ChecksumMismatch => write!(f, "Checksum mismatch"),
            Error::ReadingOutOfRange => write!(f, "Reading out of valid range"),
        }
    }
}

pub type Result<T> = core::result::Result<T, Error>;

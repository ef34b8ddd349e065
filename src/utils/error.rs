use std::fmt::{Debug, Display, Error, Formatter};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    CapacityExceeded,
    InvalidInput,
    UnsupportedEci,
    CorruptSerialization,
    InternalInvariantViolated,
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let msg = match *self {
            Self::CapacityExceeded => "Data does not fit the requested symbol capacity",
            Self::InvalidInput => "Input contains characters invalid for the requested encoding",
            Self::UnsupportedEci => "ECI assignment number names no known code page",
            Self::CorruptSerialization => "Serialized matrix is malformed",
            Self::InternalInvariantViolated => "Encoder post-condition failed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for QRError {}

pub type QRResult<T> = Result<T, QRError>;

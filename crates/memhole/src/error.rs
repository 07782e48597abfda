use thiserror::Error;

/// Failures reported by the memhole device or by the client's state checks.
///
/// The device encodes each of these as a negated discriminant; [`Error::code`]
/// gives the positive magnitude for interop with other memhole clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Error {
    /// Not connected, already connected, or the handle itself misbehaved.
    #[error("invalid memhole device")]
    InvalidDevice,

    #[error("memhole device not found")]
    DeviceNotFound,

    #[error("memhole device is busy")]
    DeviceBusy,

    #[error("invalid or missing target pid")]
    InvalidPid,

    #[error("memhole device could not allocate its transfer buffer")]
    AllocationFailure,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Every variant, in discriminant order.
    pub const ALL: [Error; 5] = [
        Error::InvalidDevice,
        Error::DeviceNotFound,
        Error::DeviceBusy,
        Error::InvalidPid,
        Error::AllocationFailure,
    ];

    /// Fixed discriminant shared with the kernel module and other wrappers.
    pub const fn code(self) -> i64 {
        match self {
            Error::InvalidDevice => 4,
            Error::DeviceNotFound => 8,
            Error::DeviceBusy => 16,
            Error::InvalidPid => 32,
            Error::AllocationFailure => 64,
        }
    }

    /// Decode a positive discriminant.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.code() == code)
    }

    /// Decode a raw transport status (a negated discriminant).
    ///
    /// Non-negative values are successes and yield `None`, as do negative
    /// values that are not one of the known discriminants.
    pub fn from_status(raw: i64) -> Option<Self> {
        if raw >= 0 {
            return None;
        }
        raw.checked_neg().and_then(Self::from_code)
    }

    /// Check if this error is a connection state error
    pub fn is_connection_state(&self) -> bool {
        matches!(self, Error::InvalidDevice)
    }
}

/// Map a raw transport status onto a result.
///
/// Non-negative values pass through unchanged. Negative values decode to
/// their variant, or to `fallback` when the magnitude is unknown.
pub fn check_status(raw: i64, fallback: Error) -> Result<i64> {
    if raw >= 0 {
        return Ok(raw);
    }
    Err(Error::from_status(raw).unwrap_or(fallback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_powers_of_two() {
        let codes: Vec<i64> = Error::ALL.iter().map(|e| e.code()).collect();
        assert_eq!(codes, vec![4, 8, 16, 32, 64]);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Error::from_code(32), Some(Error::InvalidPid));
        assert_eq!(Error::from_code(64), Some(Error::AllocationFailure));
        assert_eq!(Error::from_code(5), None);
        assert_eq!(Error::from_code(-4), None);
    }

    #[test]
    fn test_from_status_decodes_negated_codes() {
        for err in Error::ALL {
            assert_eq!(Error::from_status(-err.code()), Some(err));
        }
        assert_eq!(Error::from_status(0), None);
        assert_eq!(Error::from_status(16), None);
        assert_eq!(Error::from_status(-1), None);
        assert_eq!(Error::from_status(i64::MIN), None);
    }

    #[test]
    fn test_check_status() {
        assert_eq!(check_status(0x1000, Error::InvalidDevice), Ok(0x1000));
        assert_eq!(check_status(0, Error::InvalidDevice), Ok(0));
        assert_eq!(
            check_status(-16, Error::InvalidDevice),
            Err(Error::DeviceBusy)
        );
        assert_eq!(
            check_status(-1, Error::AllocationFailure),
            Err(Error::AllocationFailure)
        );
    }

    #[test]
    fn test_is_connection_state() {
        assert!(Error::InvalidDevice.is_connection_state());
        assert!(!Error::DeviceBusy.is_connection_state());
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::DeviceNotFound.to_string(), "memhole device not found");
    }
}

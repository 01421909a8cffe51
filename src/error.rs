use thiserror::Error;

/// Codec error taxonomy. Nothing here is recovered inside the codec; errors
/// propagate to the connection worker, which logs and terminates the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IsoError {
    /// Serialization requested before the MTI was set, or an MTI of the
    /// wrong length was supplied.
    #[error("invalid MTI {0:?}")]
    InvalidMti(String),

    /// A format code (MTI, bitmap or value encoding) outside its enum.
    #[error("invalid {what} format")]
    InvalidFormat { what: &'static str },

    /// Redefinition with an illegal length family for the field.
    #[error("field {field}: illegal length family")]
    InvalidBitType { field: u8 },

    /// Redefinition with a length-indicator form that does not match the
    /// length family.
    #[error("field {field}: illegal length indicator form")]
    InvalidLenForm { field: u8 },

    /// Value material that cannot be represented in the field's encoding,
    /// e.g. non-hex characters destined for a packed field.
    #[error("field {field}: invalid value material")]
    InvalidValueType { field: u8 },

    #[error("field {field} does not exist")]
    BitNonexistent { field: u8 },

    #[error("field {field} is not present in the bitmap")]
    BitNotSet { field: u8 },

    #[error("field {field}: value length {len} exceeds limit {limit}")]
    ValueTooLarge { field: u8, len: usize, limit: usize },

    /// Input byte string too short, or framing inconsistent.
    #[error("not a valid ISO 8583 message: {0}")]
    InvalidIso8583(String),
}

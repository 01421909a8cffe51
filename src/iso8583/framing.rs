//! 16-bit length framing for stream transports.
//!
//! The prefix counts the bytes after itself; endianness is the caller's
//! choice (big-endian is the conventional network order).

use crate::error::IsoError;

pub fn to_framed(message: &[u8], big_endian: bool) -> Result<Vec<u8>, IsoError> {
    let len = u16::try_from(message.len()).map_err(|_| {
        IsoError::InvalidIso8583(format!("message of {} bytes cannot be framed", message.len()))
    })?;
    let prefix = if big_endian {
        len.to_be_bytes()
    } else {
        len.to_le_bytes()
    };
    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&prefix);
    framed.extend_from_slice(message);
    Ok(framed)
}

pub fn from_framed(buffer: &[u8], big_endian: bool) -> Result<&[u8], IsoError> {
    let prefix: [u8; 2] = buffer
        .get(..2)
        .ok_or_else(|| IsoError::InvalidIso8583("framed input shorter than its prefix".into()))?
        .try_into()
        .unwrap();
    let len = if big_endian {
        u16::from_be_bytes(prefix)
    } else {
        u16::from_le_bytes(prefix)
    } as usize;

    buffer.get(2..2 + len).ok_or_else(|| {
        IsoError::InvalidIso8583(format!(
            "frame promises {} bytes but only {} are available",
            len,
            buffer.len() - 2
        ))
    })
}

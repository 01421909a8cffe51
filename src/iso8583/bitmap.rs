//! 128-bit field presence set.
//!
//! Bit 1 is the continuation marker: it is set exactly when any of bits
//! 65..=128 is set, and its presence on the wire means a secondary bitmap
//! follows the primary one. Within each wire byte bits are MSB-first, so
//! field f lives in byte (f - 1) / 8 at mask 0x80 >> ((f - 1) % 8).

use crate::ebcdic;
use crate::error::IsoError;
use crate::iso8583::BitmapFormat;

/// Mask of bits 65..=128, the secondary half.
const SECONDARY: u128 = u64::MAX as u128;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bitmap {
    bits: u128,
}

fn mask(field: u8) -> u128 {
    debug_assert!((1..=128).contains(&field));
    1u128 << (128 - field as u32)
}

impl Bitmap {
    pub fn set(&mut self, field: u8) {
        self.bits |= mask(field);
        if field > 64 {
            self.bits |= mask(1);
        }
    }

    pub fn unset(&mut self, field: u8) {
        self.bits &= !mask(field);
        if field > 64 && self.bits & SECONDARY == 0 {
            self.bits &= !mask(1);
        }
    }

    pub fn is_set(&self, field: u8) -> bool {
        self.bits & mask(field) != 0
    }

    pub fn has_secondary(&self) -> bool {
        self.is_set(1)
    }

    /// Payload fields present, in ascending order. Bit 1 is bookkeeping and
    /// is not yielded.
    pub fn iter_ascending(&self) -> impl Iterator<Item = u8> + '_ {
        (2..=128).filter(|&field| self.is_set(field))
    }

    fn raw_bytes(&self) -> Vec<u8> {
        let all = self.bits.to_be_bytes();
        let len = if self.has_secondary() { 16 } else { 8 };
        all[..len].to_vec()
    }

    /// Hex rendition of the bitmap as it appears in the ASCII wire format.
    pub fn hex_string(&self, uppercase: bool) -> String {
        let hex = hex::encode(self.raw_bytes());
        if uppercase {
            hex.to_ascii_uppercase()
        } else {
            hex
        }
    }

    pub fn to_wire(&self, format: BitmapFormat, uppercase: bool) -> Vec<u8> {
        match format {
            BitmapFormat::Ascii => self.hex_string(uppercase).into_bytes(),
            BitmapFormat::Ebcdic => ebcdic::encode(&self.hex_string(uppercase))
                .expect("hex digits always translate to cp1148"),
            BitmapFormat::Packed => self.raw_bytes(),
        }
    }

    /// Decode a bitmap from the front of `input`, reading the secondary half
    /// when the continuation bit of the first byte is set. Returns the bitmap
    /// and the number of wire bytes consumed.
    pub fn from_wire(input: &[u8], format: BitmapFormat) -> Result<(Self, usize), IsoError> {
        match format {
            BitmapFormat::Ascii => Self::from_hex_chars(input, |b| b as char),
            BitmapFormat::Ebcdic => {
                Self::from_hex_chars(input, |b| ebcdic::decode(&[b]).remove(0))
            }
            BitmapFormat::Packed => {
                let half = take(input, 0, 8)?;
                let mut raw = [0u8; 16];
                raw[..8].copy_from_slice(half);
                let consumed = if raw[0] & 0x80 != 0 {
                    raw[8..].copy_from_slice(take(input, 8, 8)?);
                    16
                } else {
                    8
                };
                Ok((
                    Bitmap {
                        bits: u128::from_be_bytes(raw),
                    },
                    consumed,
                ))
            }
        }
    }

    fn from_hex_chars(
        input: &[u8],
        to_char: impl Fn(u8) -> char,
    ) -> Result<(Self, usize), IsoError> {
        let parse_half = |offset: usize| -> Result<u64, IsoError> {
            let chars = take(input, offset, 16)?;
            let mut half = 0u64;
            for &b in chars {
                let digit = to_char(b)
                    .to_digit(16)
                    .ok_or_else(|| IsoError::InvalidIso8583("bitmap is not hex".into()))?;
                half = half << 4 | digit as u64;
            }
            Ok(half)
        };

        let primary = parse_half(0)?;
        if primary & (1 << 63) != 0 {
            let secondary = parse_half(16)?;
            Ok((
                Bitmap {
                    bits: (primary as u128) << 64 | secondary as u128,
                },
                32,
            ))
        } else {
            Ok((
                Bitmap {
                    bits: (primary as u128) << 64,
                },
                16,
            ))
        }
    }
}

fn take(input: &[u8], offset: usize, len: usize) -> Result<&[u8], IsoError> {
    input
        .get(offset..offset + len)
        .ok_or_else(|| IsoError::InvalidIso8583("input ends inside the bitmap".into()))
}

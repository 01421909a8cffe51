//! Length-indicator codec for the LL, LLL and LLLLLL families.
//!
//! | family | ASCII/EBCDIC      | BCD                  | packed            |
//! |--------|-------------------|----------------------|-------------------|
//! | LL     | 2 decimal digits  | 1 byte, two nibbles  | 1 byte unsigned   |
//! | LLL    | 3 decimal digits  | 2 bytes, low 3 nibbles | 2 bytes big-endian |
//! | LLLLLL | 6 decimal digits  | 3 bytes, six nibbles | 3 bytes big-endian |

use crate::ebcdic;
use crate::error::IsoError;
use crate::iso8583::catalog::{Family, LenForm};

/// Wire bytes the indicator of `family` occupies under `form`.
pub fn indicator_len(family: Family, form: LenForm) -> usize {
    let digits = match family {
        Family::Ll => 2,
        Family::Lll => 3,
        Family::Llllll => 6,
        _ => return 0,
    };
    match form {
        LenForm::Fixed => 0,
        LenForm::Ascii | LenForm::Ebcdic => digits,
        // Two decimal nibbles per byte, rounded up.
        LenForm::Bcd => (digits + 1) / 2,
        LenForm::Packed => match family {
            Family::Ll => 1,
            Family::Lll => 2,
            _ => 3,
        },
    }
}

/// Encode a logical length. The caller has already checked `len` against the
/// family's absolute maximum and the catalog maximum.
pub fn encode(family: Family, form: LenForm, len: usize) -> Vec<u8> {
    let digits = match family {
        Family::Ll => 2,
        Family::Lll => 3,
        _ => 6,
    };
    match form {
        LenForm::Fixed => Vec::new(),
        LenForm::Ascii => format!("{:0width$}", len, width = digits).into_bytes(),
        LenForm::Ebcdic => ebcdic::encode(&format!("{:0width$}", len, width = digits))
            .expect("decimal digits always translate to cp1148"),
        LenForm::Bcd => {
            let text = format!("{:0width$}", len, width = indicator_len(family, form) * 2);
            hex::decode(text).expect("zero-padded decimal digits are valid hex")
        }
        LenForm::Packed => {
            let bytes = (len as u32).to_be_bytes();
            bytes[4 - indicator_len(family, form)..].to_vec()
        }
    }
}

/// Decode a logical length from the front of `input`, returning the length
/// and the number of wire bytes consumed.
pub fn decode(family: Family, form: LenForm, input: &[u8]) -> Result<(usize, usize), IsoError> {
    let width = indicator_len(family, form);
    let bytes = input
        .get(..width)
        .ok_or_else(|| IsoError::InvalidIso8583("input ends inside a length indicator".into()))?;

    let len = match form {
        LenForm::Fixed => 0,
        LenForm::Ascii => parse_digits(std::str::from_utf8(bytes).ok())?,
        LenForm::Ebcdic => parse_digits(Some(&ebcdic::decode(bytes)))?,
        // Each nibble counts as a decimal digit; the high nibble of the
        // first LLL byte is ignored.
        LenForm::Bcd => match family {
            Family::Ll => nibbles(bytes[0]).0 * 10 + nibbles(bytes[0]).1,
            Family::Lll => {
                nibbles(bytes[0]).1 * 100 + nibbles(bytes[1]).0 * 10 + nibbles(bytes[1]).1
            }
            _ => bytes.iter().fold(0, |acc, &b| {
                acc * 100 + nibbles(b).0 * 10 + nibbles(b).1
            }),
        },
        LenForm::Packed => match family {
            Family::Ll => bytes[0] as usize,
            Family::Lll => (bytes[0] & 0x0F) as usize * 256 + bytes[1] as usize,
            _ => bytes.iter().fold(0, |acc, &b| acc * 256 + b as usize),
        },
    };
    Ok((len, width))
}

fn nibbles(byte: u8) -> (usize, usize) {
    ((byte >> 4) as usize, (byte & 0x0F) as usize)
}

fn parse_digits(text: Option<&str>) -> Result<usize, IsoError> {
    text.and_then(|t| t.parse::<usize>().ok())
        .ok_or_else(|| IsoError::InvalidIso8583("length indicator is not decimal".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_indicators() {
        assert_eq!(encode(Family::Ll, LenForm::Ascii, 2), b"02".to_vec());
        assert_eq!(encode(Family::Lll, LenForm::Ascii, 14), b"014".to_vec());
        assert_eq!(encode(Family::Llllll, LenForm::Ascii, 14), b"000014".to_vec());
        assert_eq!(decode(Family::Lll, LenForm::Ascii, b"014rest").unwrap(), (14, 3));
    }

    #[test]
    fn ebcdic_indicators() {
        let wire = encode(Family::Ll, LenForm::Ebcdic, 37);
        assert_eq!(wire, vec![0xF3, 0xF7]);
        assert_eq!(decode(Family::Ll, LenForm::Ebcdic, &wire).unwrap(), (37, 2));
    }

    #[test]
    fn bcd_indicators() {
        assert_eq!(encode(Family::Ll, LenForm::Bcd, 12), vec![0x12]);
        assert_eq!(encode(Family::Lll, LenForm::Bcd, 14), vec![0x00, 0x14]);
        assert_eq!(encode(Family::Lll, LenForm::Bcd, 999), vec![0x09, 0x99]);
        assert_eq!(encode(Family::Llllll, LenForm::Bcd, 123456), vec![0x12, 0x34, 0x56]);

        assert_eq!(decode(Family::Ll, LenForm::Bcd, &[0x12]).unwrap(), (12, 1));
        assert_eq!(decode(Family::Lll, LenForm::Bcd, &[0x09, 0x99]).unwrap(), (999, 2));
        assert_eq!(
            decode(Family::Llllll, LenForm::Bcd, &[0x12, 0x34, 0x56]).unwrap(),
            (123456, 3)
        );
    }

    #[test]
    fn packed_indicators() {
        assert_eq!(encode(Family::Ll, LenForm::Packed, 99), vec![99]);
        assert_eq!(encode(Family::Lll, LenForm::Packed, 999), vec![0x03, 0xE7]);
        assert_eq!(encode(Family::Llllll, LenForm::Packed, 70000), vec![0x01, 0x11, 0x70]);

        assert_eq!(decode(Family::Ll, LenForm::Packed, &[99]).unwrap(), (99, 1));
        assert_eq!(decode(Family::Lll, LenForm::Packed, &[0x03, 0xE7]).unwrap(), (999, 2));
        assert_eq!(
            decode(Family::Llllll, LenForm::Packed, &[0x01, 0x11, 0x70]).unwrap(),
            (70000, 3)
        );
    }

    #[test]
    fn truncated_indicator() {
        assert!(matches!(
            decode(Family::Lll, LenForm::Ascii, b"01"),
            Err(IsoError::InvalidIso8583(_))
        ));
    }

    #[test]
    fn non_decimal_ascii_indicator() {
        assert!(matches!(
            decode(Family::Ll, LenForm::Ascii, b"xy"),
            Err(IsoError::InvalidIso8583(_))
        ));
    }
}

//! Per-field value codec: logical text <-> wire bytes.
//!
//! Fixed families are zero-padded on the left to the catalog maximum before
//! encoding. Variable families prepend a length indicator carrying the
//! logical length; packed values of odd logical length gain a trailing pad
//! nibble on the wire (the indicator still carries the odd length), while
//! packed fixed values gain a leading pad nibble when the catalog maximum is
//! odd.

use crate::ebcdic;
use crate::error::IsoError;
use crate::iso8583::catalog::{FieldSpec, ValueEncoding};
use crate::iso8583::length;

/// Wire image of one field, length indicator included.
pub fn encode(field: u8, spec: &FieldSpec, value: &str) -> Result<Vec<u8>, IsoError> {
    if !value.is_ascii() {
        return Err(IsoError::InvalidValueType { field });
    }

    if spec.family.is_variable() {
        let absolute = spec.family.absolute_max().unwrap_or(usize::MAX);
        let limit = spec.max.min(absolute);
        if value.len() > limit {
            return Err(IsoError::ValueTooLarge {
                field,
                len: value.len(),
                limit,
            });
        }

        let mut wire = length::encode(spec.family, spec.len_form, value.len());
        match spec.encoding {
            ValueEncoding::Ascii => wire.extend_from_slice(value.as_bytes()),
            ValueEncoding::Ebcdic => wire.extend(
                ebcdic::encode(value).map_err(|_| IsoError::InvalidValueType { field })?,
            ),
            ValueEncoding::Packed => {
                // Right-pad odd logical lengths to a whole number of bytes.
                let mut material = value.to_string();
                if material.len() % 2 != 0 {
                    material.push('0');
                }
                wire.extend(
                    hex::decode(material).map_err(|_| IsoError::InvalidValueType { field })?,
                );
            }
        }
        Ok(wire)
    } else {
        if value.len() > spec.max {
            return Err(IsoError::ValueTooLarge {
                field,
                len: value.len(),
                limit: spec.max,
            });
        }

        match spec.encoding {
            ValueEncoding::Ascii => Ok(zfill(value, spec.max).into_bytes()),
            ValueEncoding::Ebcdic => ebcdic::encode(&zfill(value, spec.max))
                .map_err(|_| IsoError::InvalidValueType { field }),
            ValueEncoding::Packed => {
                // Left-pad to an even number of hex digits.
                let material = zfill(value, (spec.max + 1) / 2 * 2);
                hex::decode(material).map_err(|_| IsoError::InvalidValueType { field })
            }
        }
    }
}

/// Consume one field from the front of `input`. Returns the number of wire
/// bytes consumed and the logical value text, indicator and pad nibbles
/// stripped.
pub fn decode(field: u8, spec: &FieldSpec, input: &[u8]) -> Result<(usize, String), IsoError> {
    let (len, indicator) = if spec.family.is_variable() {
        let (len, indicator) = length::decode(spec.family, spec.len_form, input)?;
        if len > spec.max {
            return Err(IsoError::ValueTooLarge {
                field,
                len,
                limit: spec.max,
            });
        }
        (len, indicator)
    } else {
        (spec.max, 0)
    };

    let wire_len = match spec.encoding {
        ValueEncoding::Packed => (len + 1) / 2,
        _ => len,
    };
    let body = input.get(indicator..indicator + wire_len).ok_or_else(|| {
        IsoError::InvalidIso8583(format!("input ends inside field {field}"))
    })?;

    let text = match spec.encoding {
        ValueEncoding::Ascii => std::str::from_utf8(body)
            .map_err(|_| IsoError::InvalidIso8583(format!("field {field} is not ASCII")))?
            .to_string(),
        ValueEncoding::Ebcdic => ebcdic::decode(body),
        ValueEncoding::Packed => {
            let mut text = hex::encode(body);
            if spec.family.is_variable() {
                text.truncate(len);
            } else if spec.max % 2 != 0 {
                text.remove(0);
            }
            text
        }
    };

    Ok((indicator + wire_len, text))
}

fn zfill(value: &str, width: usize) -> String {
    format!("{value:0>width$}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iso8583::catalog::{Alphabet, Family, FieldCatalog, LenForm};
    use std::borrow::Cow;

    fn spec_of(field: u8) -> FieldSpec {
        FieldCatalog::default().lookup(field).unwrap().clone()
    }

    #[test]
    fn fixed_numeric_is_left_padded() {
        let wire = encode(4, &spec_of(4), "4").unwrap();
        assert_eq!(wire, b"000000000004".to_vec());

        let (consumed, text) = decode(4, &spec_of(4), &wire).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(text, "000000000004");
    }

    #[test]
    fn variable_carries_logical_length() {
        let wire = encode(2, &spec_of(2), "2").unwrap();
        assert_eq!(wire, b"012".to_vec());

        let (consumed, text) = decode(2, &spec_of(2), &wire).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(text, "2");
    }

    #[test]
    fn oversized_values_are_rejected() {
        assert_eq!(
            encode(3, &spec_of(3), "1234567"),
            Err(IsoError::ValueTooLarge {
                field: 3,
                len: 7,
                limit: 6
            })
        );
        assert_eq!(
            encode(2, &spec_of(2), &"1".repeat(20)),
            Err(IsoError::ValueTooLarge {
                field: 2,
                len: 20,
                limit: 19
            })
        );
    }

    #[test]
    fn oversized_wire_length_is_rejected_on_decode() {
        // Indicator promises 30 digits, PAN caps at 19.
        let mut wire = b"30".to_vec();
        wire.extend_from_slice("4".repeat(30).as_bytes());
        assert_eq!(
            decode(2, &spec_of(2), &wire),
            Err(IsoError::ValueTooLarge {
                field: 2,
                len: 30,
                limit: 19
            })
        );
    }

    #[test]
    fn packed_variable_odd_length_pads_right() {
        let spec = FieldSpec {
            label: Cow::Borrowed("2"),
            description: Cow::Borrowed("PAN"),
            family: Family::Ll,
            len_form: LenForm::Ascii,
            max: 19,
            alphabet: Alphabet::Numeric,
            encoding: ValueEncoding::Packed,
        };
        let wire = encode(2, &spec, "123").unwrap();
        // Indicator carries the odd logical length, value occupies two bytes.
        assert_eq!(wire, vec![b'0', b'3', 0x12, 0x30]);

        let (consumed, text) = decode(2, &spec, &wire).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(text, "123");
    }

    #[test]
    fn packed_fixed_odd_max_pads_left() {
        let spec = FieldSpec {
            label: Cow::Borrowed("19"),
            description: Cow::Borrowed("Country code"),
            family: Family::Numeric,
            len_form: LenForm::Fixed,
            max: 3,
            alphabet: Alphabet::Numeric,
            encoding: ValueEncoding::Packed,
        };
        let wire = encode(19, &spec, "76").unwrap();
        assert_eq!(wire, vec![0x00, 0x76]);

        let (consumed, text) = decode(19, &spec, &wire).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(text, "076");
    }

    #[test]
    fn packed_rejects_non_hex_material() {
        let mut spec = spec_of(2);
        spec.encoding = ValueEncoding::Packed;
        assert_eq!(
            encode(2, &spec, "12XY"),
            Err(IsoError::InvalidValueType { field: 2 })
        );
    }

    #[test]
    fn ebcdic_value_round_trip() {
        let mut spec = spec_of(43);
        spec.encoding = ValueEncoding::Ebcdic;
        let wire = encode(43, &spec, "ACME STORE LISBOA").unwrap();
        assert_eq!(wire.len(), 40);
        let (consumed, text) = decode(43, &spec, &wire).unwrap();
        assert_eq!(consumed, 40);
        assert_eq!(text, zfill("ACME STORE LISBOA", 40));
    }

    #[test]
    fn truncated_body_is_rejected() {
        assert!(matches!(
            decode(4, &spec_of(4), b"0000"),
            Err(IsoError::InvalidIso8583(_))
        ));
    }
}

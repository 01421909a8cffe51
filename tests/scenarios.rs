//! End-to-end codec and dispatcher scenarios over the public API.

use iso_switch::dispatch::{Dispatcher, TransactionProcessor};
use iso_switch::iso8583::catalog::LenForm;
use iso_switch::iso8583::framing;
use iso_switch::{BitmapFormat, CodecConfig, Iso8583, IsoError, MtiFormat};

struct NullProcessor;
impl TransactionProcessor for NullProcessor {}

#[test]
fn minimal_echo_wire_image() {
    let mut message = Iso8583::new();
    message.set_mti("0800").unwrap();
    message.set_field(2, "2").unwrap();
    message.set_field(4, "4").unwrap();
    message.set_field(12, "12").unwrap();
    message.set_field(17, "17").unwrap();
    message.set_field(99, "99").unwrap();

    let wire = message.to_wire().unwrap();
    let expected = concat!(
        "0800",
        "d010800000000000", // primary bitmap, continuation bit set
        "0000000020000000", // secondary bitmap, bit 99
        "012",              // field 2: LL indicator 01, value 2
        "000000000004",     // field 4: N padded to 12
        "000012",           // field 12
        "0017",             // field 17
        "0299",             // field 99: LL indicator 02, value 99
    );
    assert_eq!(wire, expected.as_bytes());

    let mut parsed = Iso8583::new();
    parsed.from_wire(&wire).unwrap();
    assert_eq!(parsed, message);
}

#[test]
fn secondary_bitmap_continuation() {
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    message.set_field(3, "000000").unwrap();
    message.set_field(70, "001").unwrap();

    let raw = message.bitmap().to_wire(BitmapFormat::Packed, false);
    assert_eq!(raw.len(), 16);
    assert_eq!(raw[0] & 0x80, 0x80, "continuation bit ored into first byte");
    assert_eq!(raw[8], 0x04, "bit 70 - 64 = 6 of the secondary half");
}

#[test]
fn lll_value_carries_three_digit_indicator() {
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    message.set_field(104, "12345ABCD67890").unwrap();

    let wire = message.to_wire().unwrap();
    let tail = &wire[wire.len() - 17..];
    assert_eq!(tail, b"01412345ABCD67890");
}

#[test]
fn bcd_length_indicator_after_redefine() {
    let mut message = Iso8583::new();
    let mut spec = message.catalog().lookup(2).unwrap().clone();
    spec.len_form = LenForm::Bcd;
    message.redefine_field(2, spec).unwrap();

    message.set_mti("0200").unwrap();
    message.set_field(2, "411111111111").unwrap();

    let wire = message.to_wire().unwrap();
    // header-less ASCII layout: 4 MTI bytes + 16 bitmap chars, then field 2
    assert_eq!(wire[20], 0x12);
    assert_eq!(&wire[21..33], b"411111111111");
}

#[test]
fn dispatcher_miss_builds_invalid_transaction_response() {
    let mut request = Iso8583::new();
    request.set_mti("0200").unwrap();
    request.set_field(3, "999999").unwrap();

    let mut dispatcher = Dispatcher::new(NullProcessor, CodecConfig::default());
    let wire = dispatcher.handle(&request.to_wire().unwrap()).unwrap();

    let mut response = Iso8583::new();
    response.from_wire(&wire).unwrap();
    assert_eq!(response.mti(), "0220");
    assert_eq!(response.field(3).unwrap(), "000000");
    assert_eq!(response.field(39).unwrap(), "12");
}

#[test]
fn framing_prefixes_and_truncation() {
    let message = vec![b'x'; 137];

    let big = framing::to_framed(&message, true).unwrap();
    assert_eq!(&big[..2], &[0x00, 0x89]);
    assert_eq!(framing::from_framed(&big, true).unwrap(), message.as_slice());

    let little = framing::to_framed(&message, false).unwrap();
    assert_eq!(&little[..2], &[0x89, 0x00]);
    assert_eq!(
        framing::from_framed(&little, false).unwrap(),
        message.as_slice()
    );

    let truncated = &big[..102]; // prefix promises 137, only 100 delivered
    assert!(matches!(
        framing::from_framed(truncated, true),
        Err(IsoError::InvalidIso8583(_))
    ));
}

#[test]
fn round_trip_across_format_matrix() {
    let mti_formats = [MtiFormat::Ascii, MtiFormat::Ebcdic, MtiFormat::Bcd];
    let bitmap_formats = [
        BitmapFormat::Ascii,
        BitmapFormat::Ebcdic,
        BitmapFormat::Packed,
    ];

    for mti_format in mti_formats {
        for bitmap_format in bitmap_formats {
            let config = CodecConfig {
                mti_format,
                bitmap_format,
                bitmap_uppercase: true,
                ..Default::default()
            };

            let mut message = config.message();
            message.set_mti("0210").unwrap();
            message.set_field(2, "4111111111111111").unwrap();
            message.set_field(3, "000000").unwrap();
            message.set_field(39, "00").unwrap();
            message.set_field(104, "TEST PAYMENT").unwrap();

            let mut parsed = config.message();
            parsed.from_wire(&message.to_wire().unwrap()).unwrap();
            assert_eq!(
                parsed, message,
                "round trip under {mti_format:?}/{bitmap_format:?}"
            );
        }
    }
}

#[test]
fn bitmap_tracks_field_mutations() {
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    for field in [2u8, 11, 39, 70, 128] {
        message.set_field(field, "1").unwrap();
    }
    for field in 2..=128u8 {
        assert_eq!(
            message.bitmap().is_set(field),
            message.field(field).is_ok(),
            "bit {field} agrees with stored value"
        );
    }

    message.unset_field(70).unwrap();
    message.unset_field(128).unwrap();
    assert!(!message.bitmap().has_secondary());
}

#[test]
fn serialization_orders_fields_ascending() {
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    // Set out of order on purpose.
    message.set_field(99, "99").unwrap();
    message.set_field(3, "000000").unwrap();
    message.set_field(49, "986").unwrap();

    let fields: Vec<u8> = message.fields().map(|(field, _)| field).collect();
    assert_eq!(fields, vec![3, 49, 99]);

    let wire = message.to_wire().unwrap();
    let body = &wire[4 + 32..]; // MTI + double-length ASCII bitmap
    assert_eq!(body, b"0000009860299");
}

#[test]
fn value_too_large_in_both_directions() {
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    assert!(matches!(
        message.set_field(3, "0000000"),
        Err(IsoError::ValueTooLarge { field: 3, .. })
    ));

    // An over-limit indicator on the wire is rejected on decode too.
    let mut message = Iso8583::new();
    message.set_mti("0200").unwrap();
    message.set_field(2, "4111").unwrap();
    let mut wire = message.to_wire().unwrap();
    // Rewrite the LL indicator from 04 to 94, beyond the 19-digit maximum.
    let offset = 4 + 16;
    wire[offset] = b'9';
    let mut parsed = Iso8583::new();
    assert!(matches!(
        parsed.from_wire(&wire),
        Err(IsoError::ValueTooLarge { field: 2, .. })
    ));
}

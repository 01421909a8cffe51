//! EBCDIC code page 1148 translation.
//!
//! Code page 1148 is the euro-currency update of code page 500
//! (EBCDIC International); the two differ only at 0x9F, which carries
//! the euro sign instead of the generic currency sign.

use std::collections::HashMap;
use std::sync::OnceLock;

/// cp1148 byte -> Unicode scalar, all 256 positions.
#[rustfmt::skip]
const TO_CHAR: [char; 256] = [
    // 0x00
    '\u{00}', '\u{01}', '\u{02}', '\u{03}', '\u{9c}', '\u{09}', '\u{86}', '\u{7f}',
    '\u{97}', '\u{8d}', '\u{8e}', '\u{0b}', '\u{0c}', '\u{0d}', '\u{0e}', '\u{0f}',
    // 0x10
    '\u{10}', '\u{11}', '\u{12}', '\u{13}', '\u{9d}', '\u{85}', '\u{08}', '\u{87}',
    '\u{18}', '\u{19}', '\u{92}', '\u{8f}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{1f}',
    // 0x20
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\u{0a}', '\u{17}', '\u{1b}',
    '\u{88}', '\u{89}', '\u{8a}', '\u{8b}', '\u{8c}', '\u{05}', '\u{06}', '\u{07}',
    // 0x30
    '\u{90}', '\u{91}', '\u{16}', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\u{04}',
    '\u{98}', '\u{99}', '\u{9a}', '\u{9b}', '\u{14}', '\u{15}', '\u{9e}', '\u{1a}',
    // 0x40
    ' ', '\u{a0}', 'â', 'ä', 'à', 'á', 'ã', 'å', 'ç', 'ñ', '[', '.', '<', '(', '+', '!',
    // 0x50
    '&', 'é', 'ê', 'ë', 'è', 'í', 'î', 'ï', 'ì', 'ß', ']', '$', '*', ')', ';', '^',
    // 0x60
    '-', '/', 'Â', 'Ä', 'À', 'Á', 'Ã', 'Å', 'Ç', 'Ñ', '¦', ',', '%', '_', '>', '?',
    // 0x70
    'ø', 'É', 'Ê', 'Ë', 'È', 'Í', 'Î', 'Ï', 'Ì', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80
    'Ø', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', '«', '»', 'ð', 'ý', 'þ', '±',
    // 0x90
    '°', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 'ª', 'º', 'æ', '¸', 'Æ', '€',
    // 0xA0
    'µ', '~', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '¡', '¿', 'Ð', 'Ý', 'Þ', '®',
    // 0xB0
    '¢', '£', '¥', '·', '©', '§', '¶', '¼', '½', '¾', '¬', '|', '¯', '¨', '´', '×',
    // 0xC0
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', '\u{ad}', 'ô', 'ö', 'ò', 'ó', 'õ',
    // 0xD0
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', '¹', 'û', 'ü', 'ù', 'ú', 'ÿ',
    // 0xE0
    '\\', '÷', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '²', 'Ô', 'Ö', 'Ò', 'Ó', 'Õ',
    // 0xF0
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '³', 'Û', 'Ü', 'Ù', 'Ú', '\u{9f}',
];

fn from_char() -> &'static HashMap<char, u8> {
    static FROM_CHAR: OnceLock<HashMap<char, u8>> = OnceLock::new();
    FROM_CHAR.get_or_init(|| {
        TO_CHAR
            .iter()
            .enumerate()
            .map(|(byte, &c)| (c, byte as u8))
            .collect()
    })
}

/// Translate text to cp1148 bytes. Returns the first untranslatable
/// character on failure.
pub(crate) fn encode(text: &str) -> Result<Vec<u8>, char> {
    text.chars()
        .map(|c| from_char().get(&c).copied().ok_or(c))
        .collect()
}

/// Translate cp1148 bytes to text. Every byte value maps, so this cannot
/// fail.
pub(crate) fn decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| TO_CHAR[b as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_letters() {
        assert_eq!(encode("0800").unwrap(), vec![0xF0, 0xF8, 0xF0, 0xF0]);
        assert_eq!(encode("AZ").unwrap(), vec![0xC1, 0xE9]);
        assert_eq!(encode("az").unwrap(), vec![0x81, 0xA9]);
        assert_eq!(decode(&[0xF1, 0xF2, 0xC1, 0x40, 0x81]), "12A a");
    }

    #[test]
    fn punctuation() {
        assert_eq!(encode(" .<(+!").unwrap(), vec![0x40, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F]);
        assert_eq!(encode("-/").unwrap(), vec![0x60, 0x61]);
    }

    #[test]
    fn euro_position() {
        assert_eq!(decode(&[0x9F]), "€");
        assert_eq!(encode("€").unwrap(), vec![0x9F]);
    }

    #[test]
    fn round_trip_all_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        assert_eq!(encode(&decode(&bytes)).unwrap(), bytes);
    }

    #[test]
    fn untranslatable() {
        assert_eq!(encode("абв"), Err('а'));
    }
}

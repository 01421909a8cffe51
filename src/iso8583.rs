//! ISO 8583:1987 message model: MTI, presence bitmap and a sparse map of
//! field values, with the field catalog driving every byte on the wire.
//!
//! A message holds logical value text; length indicators and padding are
//! computed when the wire image is built. Serialization is pure over the
//! current state and requires only that the MTI has been set.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::ebcdic;
use crate::error::IsoError;
use bitmap::Bitmap;
use catalog::{FieldCatalog, FieldSpec, ValueEncoding};

pub mod bitmap;
pub mod catalog;
pub mod fields;
pub mod framing;
pub mod length;
pub mod timestamp;

/// MTI on-wire encoding: 4 bytes ASCII, 4 bytes cp1148, or 2 bytes BCD.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MtiFormat {
    #[default]
    Ascii,
    Ebcdic,
    Bcd,
}

impl MtiFormat {
    fn wire_len(self) -> usize {
        match self {
            MtiFormat::Ascii | MtiFormat::Ebcdic => 4,
            MtiFormat::Bcd => 2,
        }
    }
}

/// Bitmap on-wire encoding: 16/32 hex characters or 8/16 raw bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BitmapFormat {
    #[default]
    Ascii,
    Ebcdic,
    Packed,
}

impl BitmapFormat {
    fn min_wire_len(self) -> usize {
        match self {
            BitmapFormat::Ascii | BitmapFormat::Ebcdic => 16,
            BitmapFormat::Packed => 8,
        }
    }
}

/// Per-instance codec configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecConfig {
    pub mti_format: MtiFormat,
    pub bitmap_format: BitmapFormat,
    /// Hex-digit case of ASCII/EBCDIC bitmaps.
    pub bitmap_uppercase: bool,
    /// Fixed-length opaque prefix in front of the MTI.
    pub header_length: usize,
    /// Verbose per-field tracing at debug level.
    pub debug: bool,
}

impl CodecConfig {
    /// Build an empty message carrying this configuration.
    pub fn message(&self) -> Iso8583 {
        Iso8583::with_config(self.clone())
    }
}

/// One ISO 8583 message.
#[derive(Debug, Clone)]
pub struct Iso8583 {
    config: CodecConfig,
    catalog: FieldCatalog,
    /// Four digits once set; empty until then.
    mti: String,
    bitmap: Bitmap,
    values: BTreeMap<u8, String>,
    header: Vec<u8>,
}

impl Iso8583 {
    pub fn new() -> Self {
        Self::with_config(CodecConfig::default())
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Iso8583 {
            config,
            catalog: FieldCatalog::default(),
            mti: String::new(),
            bitmap: Bitmap::default(),
            values: BTreeMap::new(),
            header: Vec::new(),
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Replace a field descriptor for this message instance. Only safe
    /// before the instance starts parsing or emitting wire images.
    pub fn redefine_field(&mut self, field: u8, spec: FieldSpec) -> Result<(), IsoError> {
        self.catalog.redefine(field, spec)
    }

    pub fn set_mti(&mut self, mti: &str) -> Result<(), IsoError> {
        if mti.len() > 4 || !mti.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IsoError::InvalidMti(mti.to_string()));
        }
        self.mti = format!("{mti:0>4}");
        Ok(())
    }

    pub fn mti(&self) -> &str {
        &self.mti
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Store a field value and record its presence. Fixed-length families
    /// are normalized to their zero-padded catalog width immediately, so the
    /// stored text matches what a decode of the wire image yields.
    pub fn set_field(&mut self, field: u8, value: &str) -> Result<(), IsoError> {
        if field < 2 || field > 128 {
            return Err(IsoError::BitNonexistent { field });
        }
        let spec = self.catalog.lookup(field)?;
        let normalized = normalize(spec, value);
        // Surface encoding problems at set time rather than at serialize.
        fields::encode(field, spec, &normalized)?;
        if self.config.debug {
            debug!("set field {field} [{}] = {normalized:?}", spec.family);
        }
        self.values.insert(field, normalized);
        self.bitmap.set(field);
        Ok(())
    }

    /// Clear a field's value and its bitmap bit. Clearing the last field of
    /// the high half also clears the continuation bit.
    pub fn unset_field(&mut self, field: u8) -> Result<(), IsoError> {
        if field < 2 || field > 128 {
            return Err(IsoError::BitNonexistent { field });
        }
        self.values.remove(&field);
        self.bitmap.unset(field);
        Ok(())
    }

    /// Decoded value of a present field, indicator and padding stripped.
    pub fn field(&self, field: u8) -> Result<&str, IsoError> {
        if field < 1 || field > 128 {
            return Err(IsoError::BitNonexistent { field });
        }
        self.values
            .get(&field)
            .map(String::as_str)
            .ok_or(IsoError::BitNotSet { field })
    }

    /// Present fields and their decoded values, in ascending field order.
    pub fn fields(&self) -> impl Iterator<Item = (u8, &str)> {
        self.values.iter().map(|(&field, value)| (field, value.as_str()))
    }

    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Install a header; the configured header length follows the bytes.
    pub fn set_header(&mut self, header: &[u8]) {
        self.header = header.to_vec();
        self.config.header_length = header.len();
    }

    /// Resize the configured header length. An existing header is truncated
    /// or right-padded with spaces to fit.
    pub fn set_header_length(&mut self, len: usize) {
        self.config.header_length = len;
        if self.header.len() > len {
            self.header.truncate(len);
        } else {
            self.header.resize(len, b' ');
        }
    }

    /// Wire image: header ‖ MTI ‖ bitmap ‖ fields in ascending field order.
    pub fn to_wire(&self) -> Result<Vec<u8>, IsoError> {
        self.build_wire(true)
    }

    /// Wire image without the header prefix.
    pub fn to_wire_body(&self) -> Result<Vec<u8>, IsoError> {
        self.build_wire(false)
    }

    fn build_wire(&self, include_header: bool) -> Result<Vec<u8>, IsoError> {
        if self.mti.is_empty() {
            return Err(IsoError::InvalidMti(String::new()));
        }

        let mut wire = Vec::new();
        if include_header {
            wire.extend_from_slice(&self.header);
        }
        wire.extend(self.mti_bytes()?);
        wire.extend(
            self.bitmap
                .to_wire(self.config.bitmap_format, self.config.bitmap_uppercase),
        );
        for (&field, value) in &self.values {
            let spec = self.catalog.lookup(field)?;
            wire.extend(fields::encode(field, spec, value)?);
        }

        if self.config.debug {
            debug!("built {} wire bytes for MTI {}", wire.len(), self.mti);
        }
        Ok(wire)
    }

    fn mti_bytes(&self) -> Result<Vec<u8>, IsoError> {
        match self.config.mti_format {
            MtiFormat::Ascii => Ok(self.mti.clone().into_bytes()),
            MtiFormat::Ebcdic => {
                ebcdic::encode(&self.mti).map_err(|_| IsoError::InvalidMti(self.mti.clone()))
            }
            MtiFormat::Bcd => {
                hex::decode(&self.mti).map_err(|_| IsoError::InvalidMti(self.mti.clone()))
            }
        }
    }

    /// Parse a complete wire image into this message, replacing any previous
    /// state. Field bytes are consumed left to right in ascending field
    /// order, as directed by the bitmap.
    pub fn from_wire(&mut self, input: &[u8]) -> Result<(), IsoError> {
        let header_len = self.config.header_length;
        let mti_len = self.config.mti_format.wire_len();
        let minimum = header_len + mti_len + self.config.bitmap_format.min_wire_len();
        if input.len() < minimum {
            return Err(IsoError::InvalidIso8583(format!(
                "{} bytes is shorter than the {minimum}-byte minimum",
                input.len()
            )));
        }

        self.header = input[..header_len].to_vec();
        let mti_raw = &input[header_len..header_len + mti_len];
        self.mti = match self.config.mti_format {
            MtiFormat::Ascii => std::str::from_utf8(mti_raw)
                .map_err(|_| IsoError::InvalidIso8583("MTI is not ASCII".into()))?
                .to_string(),
            MtiFormat::Ebcdic => ebcdic::decode(mti_raw),
            MtiFormat::Bcd => hex::encode(mti_raw),
        };

        let (bitmap, bitmap_len) =
            Bitmap::from_wire(&input[header_len + mti_len..], self.config.bitmap_format)?;
        self.bitmap = bitmap;

        self.values.clear();
        let mut offset = header_len + mti_len + bitmap_len;
        for field in bitmap.iter_ascending() {
            let spec = self.catalog.lookup(field)?;
            let (consumed, text) = fields::decode(field, spec, &input[offset..])?;
            if self.config.debug {
                debug!("field {field} ({}) = {text:?}, {consumed} wire bytes", spec.label);
            }
            self.values.insert(field, text);
            offset += consumed;
        }

        if self.config.debug && offset < input.len() {
            debug!("{} trailing bytes ignored", input.len() - offset);
        }
        Ok(())
    }

    /// Wire image wrapped in the 16-bit length frame for stream transports.
    pub fn to_network(&self, big_endian: bool) -> Result<Vec<u8>, IsoError> {
        framing::to_framed(&self.to_wire()?, big_endian)
    }

    /// Parse a length-framed wire image.
    pub fn from_network(&mut self, input: &[u8], big_endian: bool) -> Result<(), IsoError> {
        self.from_wire(framing::from_framed(input, big_endian)?)
    }

    /// Printable rendition: MTI text, bitmap hex and the decoded values of
    /// every present field, concatenated.
    pub fn content(&self) -> Result<String, IsoError> {
        if self.mti.is_empty() {
            return Err(IsoError::InvalidMti(String::new()));
        }
        let mut out = self.mti.clone();
        out.push_str(&self.bitmap.hex_string(self.config.bitmap_uppercase));
        for value in self.values.values() {
            out.push_str(value);
        }
        Ok(out)
    }
}

impl Default for Iso8583 {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit-by-bit listing of the present fields, for diagnostics.
impl fmt::Display for Iso8583 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "MTI {}",
            if self.mti.is_empty() { "(unset)" } else { &self.mti }
        )?;
        for (field, value) in self.fields() {
            if let Ok(spec) = self.catalog.lookup(field) {
                writeln!(
                    f,
                    "  field {field} [{} {}, limit {}] {} = {value}",
                    spec.family, spec.alphabet, spec.max, spec.label
                )?;
            }
        }
        Ok(())
    }
}

/// Messages compare by MTI text, bitmap image and the sparse field map;
/// configuration and header bytes do not participate.
impl PartialEq for Iso8583 {
    fn eq(&self, other: &Self) -> bool {
        self.mti == other.mti && self.bitmap == other.bitmap && self.values == other.values
    }
}

impl Eq for Iso8583 {}

fn normalize(spec: &FieldSpec, value: &str) -> String {
    // Packed material re-hexes lowercase on decode; store it that way.
    let value = if spec.encoding == ValueEncoding::Packed {
        value.to_ascii_lowercase()
    } else {
        value.to_string()
    };
    if spec.family.is_variable() {
        value
    } else {
        format!("{value:0>width$}", width = spec.max)
    }
}

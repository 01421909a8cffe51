pub mod dispatch;
mod ebcdic;
pub mod error;
pub mod iso8583;

pub use error::IsoError;
pub use iso8583::{BitmapFormat, CodecConfig, Iso8583, MtiFormat};

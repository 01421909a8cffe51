use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use iso_switch::{BitmapFormat, CodecConfig, MtiFormat};

mod server;

#[derive(Parser, Debug)]
#[command(name = "iso-switchd", about = "ISO 8583 transaction switch")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8583)]
    port: u16,

    /// MTI on-wire encoding: A (ASCII), E (EBCDIC) or B (BCD)
    #[arg(long, default_value = "A", value_parser = parse_mti_format)]
    mti_format: MtiFormat,

    /// Bitmap on-wire encoding: A (ASCII), E (EBCDIC) or P (packed)
    #[arg(long, default_value = "A", value_parser = parse_bitmap_format)]
    bitmap_format: BitmapFormat,

    /// Emit ASCII/EBCDIC bitmap hex digits in uppercase
    #[arg(long)]
    bitmap_uppercase: bool,

    /// Fixed-length opaque header prefix on every message
    #[arg(long, default_value_t = 0)]
    header_length: usize,

    /// Frame length prefixes are little-endian instead of big-endian
    #[arg(long)]
    little_endian: bool,

    /// Per-connection read timeout in seconds, 0 to wait forever
    #[arg(long, default_value_t = 0)]
    read_timeout: u64,

    /// Verbose per-field codec tracing
    #[arg(long)]
    debug: bool,
}

fn parse_mti_format(code: &str) -> Result<MtiFormat, String> {
    match code {
        "A" => Ok(MtiFormat::Ascii),
        "E" => Ok(MtiFormat::Ebcdic),
        "B" => Ok(MtiFormat::Bcd),
        other => Err(format!("invalid MTI format {other:?}, expected A, E or B")),
    }
}

fn parse_bitmap_format(code: &str) -> Result<BitmapFormat, String> {
    match code {
        "A" => Ok(BitmapFormat::Ascii),
        "E" => Ok(BitmapFormat::Ebcdic),
        "P" => Ok(BitmapFormat::Packed),
        other => Err(format!("invalid bitmap format {other:?}, expected A, E or P")),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(if args.debug {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env() // Overwrite from RUST_LOG env var
        .init();

    let config = CodecConfig {
        mti_format: args.mti_format,
        bitmap_format: args.bitmap_format,
        bitmap_uppercase: args.bitmap_uppercase,
        header_length: args.header_length,
        debug: args.debug,
    };

    let server = server::Server::new(
        args.host,
        args.port,
        config,
        !args.little_endian,
        args.read_timeout,
    );
    server.run()
}

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use iso_switch::dispatch::{Dispatcher, TransactionProcessor};
use iso_switch::iso8583::framing;
use iso_switch::CodecConfig;

/// Route handlers inherit the default (empty) bodies; the dispatcher's
/// pre-filled response is what goes back on the wire.
struct SwitchProcessor;

impl TransactionProcessor for SwitchProcessor {}

pub struct Server {
    host: String,
    port: u16,
    config: CodecConfig,
    big_endian: bool,
    read_timeout: Option<Duration>,
}

impl Server {
    pub fn new(
        host: String,
        port: u16,
        config: CodecConfig,
        big_endian: bool,
        read_timeout_secs: u64,
    ) -> Self {
        Server {
            host,
            port,
            config,
            big_endian,
            read_timeout: (read_timeout_secs > 0).then(|| Duration::from_secs(read_timeout_secs)),
        }
    }

    /// Accept connections forever, one worker thread per connection. A
    /// failed session never takes the accept loop down with it.
    pub fn run(&self) -> Result<()> {
        let listener = TcpListener::bind((self.host.as_str(), self.port))
            .with_context(|| format!("binding {}:{}", self.host, self.port))?;
        info!("Server is running on {}:{}", self.host, self.port);

        loop {
            match listener.accept() {
                Ok((stream, peer)) => {
                    let config = self.config.clone();
                    let big_endian = self.big_endian;
                    let read_timeout = self.read_timeout;
                    thread::spawn(move || {
                        info!("Connection established with {peer}");
                        if let Err(err) = serve_connection(stream, config, big_endian, read_timeout)
                        {
                            warn!("Connection error with {peer}: {err:#}");
                        }
                        info!("Connection with {peer} closed");
                    });
                }
                Err(err) => warn!("Failed to accept connection: {err}"),
            }
        }
    }
}

/// Per-connection worker: read one framed request, dispatch it, write the
/// framed response, until the peer closes or any error ends the session.
fn serve_connection(
    mut stream: TcpStream,
    config: CodecConfig,
    big_endian: bool,
    read_timeout: Option<Duration>,
) -> Result<()> {
    stream.set_read_timeout(read_timeout)?;
    let mut dispatcher = Dispatcher::new(SwitchProcessor, config);

    loop {
        let request = match read_frame(&mut stream, big_endian)? {
            Some(request) => request,
            None => return Ok(()), // clean EOF
        };

        let response = dispatcher.handle(&request)?;
        stream.write_all(&framing::to_framed(&response, big_endian)?)?;
    }
}

/// Read one length-framed message: the 2-byte prefix first, then exactly as
/// many bytes as it promises, across as many reads as the transport needs.
/// Returns None when the peer closed before a new frame began.
fn read_frame(stream: &mut TcpStream, big_endian: bool) -> Result<Option<Vec<u8>>> {
    let mut prefix = [0u8; 2];
    match stream.read(&mut prefix) {
        Ok(0) => return Ok(None),
        Ok(1) => stream
            .read_exact(&mut prefix[1..])
            .context("reading second prefix byte")?,
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::WouldBlock || err.kind() == ErrorKind::TimedOut => {
            return Err(err).context("timed out waiting for a frame");
        }
        Err(err) => return Err(err.into()),
    }

    let len = if big_endian {
        u16::from_be_bytes(prefix)
    } else {
        u16::from_le_bytes(prefix)
    };

    let mut body = vec![0u8; len as usize];
    stream
        .read_exact(&mut body)
        .with_context(|| format!("frame promised {len} bytes"))?;
    Ok(Some(body))
}

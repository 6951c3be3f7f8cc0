//! Realtime telemetry client.
//!
//! Connects to a realtime telemetry server, performs the line-oriented
//! handshake and hands the remaining stream to the text reader. The wire
//! exchange, server first:
//!
//! ```text
//! server: XtraLib.Stream.0 \n Tacview.RealTimeTelemetry.0 \n <hostname> \n \0
//! client: XtraLib.Stream.0 \n Tacview.RealTimeTelemetry.0 \n Client <username> \n <hash-hex> \0 \n
//! ```
//!
//! after which the server streams a standard ACMI text recording.

pub mod auth;

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use tracklog_core::text::TextReader;
use tracklog_core::{Error, Result};

pub use auth::hash_password;

/// Port used when the connection string does not carry one.
pub const DEFAULT_PORT: u16 = 42674;

const STREAM_PROTOCOL: &str = "XtraLib.Stream.0";
const TELEMETRY_PROTOCOL: &str = "Tacview.RealTimeTelemetry.0";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const HANDSHAKE_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Connect to a realtime server and return a text reader positioned at
/// the start of the frame stream. `server` is `host` or `host:port`.
pub async fn connect(
    server: &str,
    username: &str,
    password: &str,
) -> Result<TextReader<BufReader<TcpStream>>> {
    let address = if server.contains(':') {
        server.to_string()
    } else {
        format!("{server}:{DEFAULT_PORT}")
    };

    debug!(%address, "connecting to realtime server");
    let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(&address))
        .await
        .map_err(|_| timed_out("connect"))??;

    let mut reader = BufReader::new(stream);

    expect_line(&mut reader, STREAM_PROTOCOL).await?;
    expect_line(&mut reader, TELEMETRY_PROTOCOL).await?;
    // Remote hostname, unused.
    let hostname = read_handshake_line(&mut reader).await?;
    debug!(%hostname, "remote host identified");

    let terminator = timeout(HANDSHAKE_READ_TIMEOUT, reader.read_u8())
        .await
        .map_err(|_| timed_out("handshake"))??;
    if terminator != 0 {
        return Err(Error::Protocol("bad or missing end of header".into()));
    }

    let stream = reader.get_mut();
    stream
        .write_all(format!("{STREAM_PROTOCOL}\n{TELEMETRY_PROTOCOL}\nClient {username}\n").as_bytes())
        .await?;
    if password.is_empty() {
        stream.write_all(b"\x00\n").await?;
    } else {
        stream
            .write_all(format!("{:x}\x00\n", hash_password(password)).as_bytes())
            .await?;
    }
    stream.flush().await?;

    // Bytes already buffered past the handshake belong to the recording,
    // so the reader itself is handed over.
    TextReader::open(reader).await
}

async fn expect_line(reader: &mut BufReader<TcpStream>, expected: &str) -> Result<()> {
    let line = read_handshake_line(reader).await?;
    if line != expected {
        return Err(Error::Protocol(format!(
            "unexpected handshake line: `{line}` (wanted `{expected}`)"
        )));
    }
    Ok(())
}

async fn read_handshake_line(reader: &mut BufReader<TcpStream>) -> Result<String> {
    let mut line = Vec::new();
    let read = timeout(HANDSHAKE_READ_TIMEOUT, reader.read_until(b'\n', &mut line))
        .await
        .map_err(|_| timed_out("handshake"))??;
    if read == 0 || !line.ends_with(b"\n") {
        return Err(Error::Protocol(
            "connection closed during handshake".into(),
        ));
    }
    line.pop();
    String::from_utf8(line)
        .map_err(|_| Error::Protocol("handshake line is not valid UTF-8".into()))
}

fn timed_out(phase: &str) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("{phase} timed out"),
    ))
}

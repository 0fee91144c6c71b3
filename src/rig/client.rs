use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use super::error::RigError;

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Command marker selecting hamlib's extended response protocol, where every
/// reply ends with an `RPRT <code>` status line.
const COMMAND_PREFIX: char = '+';
const STATUS_PREFIX: &str = "RPRT ";
const STATUS_OK: &str = "RPRT 0";

/// Client for one rigctld/rotctld-style TCP connection.
///
/// Strictly request/response: one command in flight at a time, no internal
/// retries. Retry policy belongs to the caller.
pub struct RigClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    read_timeout: Duration,
    /// Set after a timed-out exchange: the device may still deliver that
    /// response late, and it must not be read as the next command's reply.
    stale: bool,
}

impl RigClient {
    pub async fn connect(addr: &str, read_timeout: Duration) -> Result<Self, RigError> {
        let stream = tokio::time::timeout(DEFAULT_CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| {
                RigError::Connect(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect to {} timed out", addr),
                ))
            })?
            .map_err(RigError::Connect)?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            read_timeout,
            stale: false,
        })
    }

    /// Send one command and return the value of the last data line.
    pub async fn query(&mut self, command: &str) -> Result<String, RigError> {
        let lines = self.exchange(command).await?;
        extract_value(&lines[lines.len() - 2])
    }

    /// Send one command and return the values of every data line after the
    /// echo line. Needed for commands that report multiple fields (e.g. mode
    /// plus passband).
    pub async fn query_multi(&mut self, command: &str) -> Result<Vec<String>, RigError> {
        let lines = self.exchange(command).await?;
        lines[1..lines.len() - 1].iter().map(|l| extract_value(l)).collect()
    }

    /// Shut the connection down. Called exactly once, on session teardown.
    pub async fn close(&mut self) -> Result<(), RigError> {
        self.writer.shutdown().await?;
        Ok(())
    }

    /// One framed write plus the full response read, validated.
    ///
    /// Returns the response lines; guaranteed to hold at least two entries
    /// with the last one being the success status line.
    async fn exchange(&mut self, command: &str) -> Result<Vec<String>, RigError> {
        if self.stale {
            self.discard_stale().await?;
            self.stale = false;
        }

        let frame = format!("{}{}\n", COMMAND_PREFIX, command);
        self.writer.write_all(frame.as_bytes()).await?;

        let lines = match tokio::time::timeout(self.read_timeout, read_response(&mut self.reader))
            .await
        {
            Ok(result) => result?,
            Err(_) => {
                self.stale = true;
                return Err(RigError::Timeout);
            }
        };

        if lines.len() < 2 {
            return Err(RigError::MalformedResponse(format!(
                "expected at least 2 lines, got {}",
                lines.len()
            )));
        }
        let status = &lines[lines.len() - 1];
        if status != STATUS_OK {
            return Err(RigError::Device {
                status: status.clone(),
            });
        }
        Ok(lines)
    }

    /// Throw away whatever a late response has delivered so far, without
    /// blocking on anything that has not arrived yet.
    async fn discard_stale(&mut self) -> Result<(), RigError> {
        loop {
            let buffered = match tokio::time::timeout(Duration::ZERO, self.reader.fill_buf()).await
            {
                Ok(Ok(buf)) => buf.len(),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => 0,
            };
            if buffered == 0 {
                return Ok(());
            }
            log::debug!("discarding {} stale bytes after a timeout", buffered);
            self.reader.consume(buffered);
        }
    }
}

async fn read_response(reader: &mut BufReader<OwnedReadHalf>) -> Result<Vec<String>, RigError> {
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            // Stream closed mid-response; length validation classifies it.
            break;
        }
        let line = line.trim_end().to_string();
        let done = line.starts_with(STATUS_PREFIX);
        lines.push(line);
        if done {
            break;
        }
    }
    Ok(lines)
}

fn extract_value(line: &str) -> Result<String, RigError> {
    line.split_once(':')
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| RigError::MalformedResponse(format!("missing ':' separator in {:?}", line)))
}

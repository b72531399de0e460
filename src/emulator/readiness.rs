//! Readiness gating on container log output

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{timeout, Duration};

use crate::common::{Error, Result};

/// Read `reader` line by line until a line contains `pattern`
///
/// Returns the matching line. Fails when the stream ends first or when
/// `limit` elapses.
pub async fn await_log_line<R>(reader: R, pattern: &str, limit: Duration) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    let scan = async {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    tracing::trace!(line = %line, "emulator log");
                    if line.contains(pattern) {
                        return Ok(line);
                    }
                }
                Ok(None) => {
                    return Err(Error::LogStreamClosed(format!(
                        "no line matched '{}'",
                        pattern
                    )))
                }
                Err(e) => return Err(Error::LogStreamClosed(e.to_string())),
            }
        }
    };

    match timeout(limit, scan).await {
        Ok(result) => result,
        Err(_) => Err(Error::ReadinessTimeout {
            pattern: pattern.to_string(),
            secs: limit.as_secs(),
        }),
    }
}

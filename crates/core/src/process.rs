//! Helpers shared by the fetch and encode subprocesses.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::debug;

/// How long a tool gets to exit after SIGTERM before it is killed.
pub(crate) const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Bytes kept per stderr line; the rest of an overlong line is dropped.
const STDERR_LINE_BYTES: usize = 512;

/// Asks the child to stop, escalating to a kill if it ignores the request.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) {
    if request_stop(child, grace).await {
        return;
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "Child already gone");
    }
}

/// Sends SIGTERM and waits up to `grace` for the child to exit.
#[cfg(unix)]
async fn request_stop(child: &mut Child, grace: Duration) -> bool {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return false;
    };
    if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_err() {
        return false;
    }
    timeout(grace, child.wait()).await.is_ok()
}

#[cfg(not(unix))]
async fn request_stop(_child: &mut Child, _grace: Duration) -> bool {
    false
}

/// Keeps the last few lines a subprocess wrote to stderr.
///
/// The pipe is drained to EOF whatever the content, so the child never sees
/// a closed stderr. Both `\n` and `\r` end a line, since progress meters
/// redraw with carriage returns.
pub(crate) struct StderrTail {
    handle: JoinHandle<VecDeque<String>>,
}

impl StderrTail {
    pub(crate) fn spawn<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            let mut line = Vec::with_capacity(STDERR_LINE_BYTES);

            loop {
                let chunk = match reader.fill_buf().await {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        debug!(error = %e, "Stopped reading stderr");
                        break;
                    }
                };
                if chunk.is_empty() {
                    break;
                }

                let consumed = chunk.len();
                for &byte in chunk {
                    if byte == b'\n' || byte == b'\r' {
                        push_line(&mut tail, &mut line);
                    } else if line.len() < STDERR_LINE_BYTES {
                        line.push(byte);
                    }
                }
                reader.consume(consumed);
            }

            push_line(&mut tail, &mut line);
            tail
        });
        Self { handle }
    }

    /// Returns the collected tail, or `None` if nothing was written or the
    /// pipe is still held open by a descendant.
    pub(crate) async fn collect(self) -> Option<String> {
        let mut handle = self.handle;
        match timeout(Duration::from_secs(1), &mut handle).await {
            Ok(Ok(tail)) if !tail.is_empty() => Some(Vec::from(tail).join("\n")),
            Ok(_) => None,
            Err(_) => {
                handle.abort();
                None
            }
        }
    }
}

fn push_line(tail: &mut VecDeque<String>, line: &mut Vec<u8>) {
    if line.is_empty() {
        return;
    }
    if tail.len() == STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(String::from_utf8_lossy(line).into_owned());
    line.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stderr_tail_keeps_last_lines() {
        let text: String = (0..30).map(|i| format!("line {i}\n")).collect();
        let tail = StderrTail::spawn(std::io::Cursor::new(text.into_bytes()));
        let collected = tail.collect().await.unwrap();

        let lines: Vec<_> = collected.lines().collect();
        assert_eq!(lines.len(), STDERR_TAIL_LINES);
        assert_eq!(lines[0], "line 10");
        assert_eq!(lines[19], "line 29");
    }

    #[tokio::test]
    async fn test_stderr_tail_survives_invalid_utf8() {
        let mut bytes = b"Title: caf".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"\nstill going\nlast line\n");
        let tail = StderrTail::spawn(std::io::Cursor::new(bytes));
        let collected = tail.collect().await.unwrap();

        let lines: Vec<_> = collected.lines().collect();
        assert_eq!(lines, vec!["Title: caf\u{FFFD}", "still going", "last line"]);
    }

    #[tokio::test]
    async fn test_stderr_tail_splits_carriage_returns() {
        let text = "frame=1\rframe=2\rframe=3\r\nEncoding done\r\n";
        let tail = StderrTail::spawn(std::io::Cursor::new(text.as_bytes().to_vec()));
        let collected = tail.collect().await.unwrap();

        let lines: Vec<_> = collected.lines().collect();
        assert_eq!(lines, vec!["frame=1", "frame=2", "frame=3", "Encoding done"]);
    }

    #[tokio::test]
    async fn test_stderr_tail_truncates_long_lines() {
        let text = format!("{}\nshort\n", "x".repeat(STDERR_LINE_BYTES * 4));
        let tail = StderrTail::spawn(std::io::Cursor::new(text.into_bytes()));
        let collected = tail.collect().await.unwrap();

        let lines: Vec<_> = collected.lines().collect();
        assert_eq!(lines[0].len(), STDERR_LINE_BYTES);
        assert_eq!(lines[1], "short");
    }

    #[tokio::test]
    async fn test_stderr_tail_empty() {
        let tail = StderrTail::spawn(std::io::Cursor::new(Vec::new()));
        assert!(tail.collect().await.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_stops_sleeping_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        terminate(&mut child, Duration::from_secs(2)).await;
        let status = timeout(Duration::from_secs(2), child.wait())
            .await
            .expect("child should have exited")
            .unwrap();
        assert!(!status.success());
    }
}

//! Asynchronous IRC message reading.
//!
//! This exposes an alternative to tokio's `BufReader::read_line`, with a bound on the length of
//! messages.

use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Asynchronous IRC message reader.
pub struct IrcReader<R> {
    inner: BufReader<R>,
    message_max: usize,
}

/// Appends `chunk` to `bytes` without letting `bytes` grow over `max` bytes.
fn keep(bytes: &mut Vec<u8>, chunk: &[u8], max: usize) {
    let room = max.saturating_sub(bytes.len());
    bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
}

impl<R> IrcReader<R>
    where R: AsyncRead + Unpin
{
    /// Creates a new `IrcReader` with the given maximum length for messages, CRLF included.
    ///
    /// Lines longer than `message_max` are truncated and their remaining bytes are discarded.
    pub fn new(r: R, message_max: usize) -> Self {
        Self { inner: BufReader::new(r), message_max }
    }

    /// Equivalent of tokio's `AsyncBufReadExt::read_line` for IRC messages.
    ///
    /// Appends the message to `buf`, without its line ending, and returns the number of bytes
    /// consumed from the connection.  Returns 0 on end of file.  Invalid UTF-8 sequences are
    /// replaced with U+FFFD.
    pub async fn read_message(&mut self, buf: &mut String) -> io::Result<usize> {
        let max = self.message_max.saturating_sub(2);
        let mut bytes = Vec::with_capacity(max);
        let mut read = 0;

        loop {
            let (done, used) = {
                let available = self.inner.fill_buf().await?;
                if available.is_empty() {
                    (true, 0)
                } else if let Some(i) = memchr::memchr(b'\n', available) {
                    keep(&mut bytes, &available[..i], max + 1);
                    (true, i + 1)
                } else {
                    keep(&mut bytes, available, max + 1);
                    (false, available.len())
                }
            };
            self.inner.consume(used);
            read += used;
            if done {
                break;
            }
        }

        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        bytes.truncate(max);
        buf.push_str(&String::from_utf8_lossy(&bytes));
        Ok(read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_messages() {
        let input: &[u8] = b"NICK alice\r\nUSER a 0 * :Alice\nPING x";
        let mut reader = IrcReader::new(input, 512);
        let mut buf = String::new();

        assert_eq!(reader.read_message(&mut buf).await.unwrap(), 12);
        assert_eq!(buf, "NICK alice");

        buf.clear();
        reader.read_message(&mut buf).await.unwrap();
        assert_eq!(buf, "USER a 0 * :Alice");

        buf.clear();
        assert_eq!(reader.read_message(&mut buf).await.unwrap(), 6);
        assert_eq!(buf, "PING x");

        buf.clear();
        assert_eq!(reader.read_message(&mut buf).await.unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[tokio::test]
    async fn test_long_lines_are_truncated() {
        let mut input = format!("PRIVMSG #c :{}", "a".repeat(1000)).into_bytes();
        input.extend_from_slice(b"\r\nPING next\r\n");
        let mut reader = IrcReader::new(&input[..], 512);
        let mut buf = String::new();

        reader.read_message(&mut buf).await.unwrap();
        assert_eq!(buf.len(), 510);
        assert!(buf.starts_with("PRIVMSG #c :aaa"));

        buf.clear();
        reader.read_message(&mut buf).await.unwrap();
        assert_eq!(buf, "PING next");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_replaced() {
        let input: &[u8] = b"PRIVMSG #c :caf\xe9\r\n";
        let mut reader = IrcReader::new(input, 512);
        let mut buf = String::new();

        reader.read_message(&mut buf).await.unwrap();
        assert_eq!(buf, "PRIVMSG #c :caf\u{fffd}");
    }
}

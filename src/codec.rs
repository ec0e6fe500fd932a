//! Line framing off a buffered socket
//!
//! The wire format is newline-delimited text with no escaping and no
//! length prefix. The only protocol rule is the read cap: a line must
//! contain its `\n` within `max_line_bytes` bytes, or the read fails and
//! the connection is torn down.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::RelayError;

/// Read one `\n`-terminated line into `line`, delimiter included.
///
/// Returns `Ok(true)` when a complete line was read, `Ok(false)` on a
/// clean end of stream (a partial line at EOF is discarded), and
/// `Err(RelayError::LineTooLong)` when `max_line_bytes` bytes accumulate
/// without a delimiter.
pub async fn read_line_capped<R>(
    reader: &mut R,
    line: &mut Vec<u8>,
    max_line_bytes: usize,
) -> Result<bool, RelayError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();

    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            // EOF. A buffered partial line has no delimiter and is dropped.
            return Ok(false);
        }

        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                if line.len() + pos + 1 > max_line_bytes {
                    return Err(RelayError::LineTooLong {
                        limit: max_line_bytes,
                    });
                }
                line.extend_from_slice(&chunk[..=pos]);
                reader.consume(pos + 1);
                return Ok(true);
            }
            None => {
                if line.len() + chunk.len() >= max_line_bytes {
                    return Err(RelayError::LineTooLong {
                        limit: max_line_bytes,
                    });
                }
                let len = chunk.len();
                line.extend_from_slice(chunk);
                reader.consume(len);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn test_reads_single_line_with_delimiter() {
        let mut reader = BufReader::new(&b"hello\n"[..]);
        let mut line = Vec::new();

        let got = read_line_capped(&mut reader, &mut line, 1024).await.unwrap();

        assert!(got);
        assert_eq!(line, b"hello\n");
    }

    #[tokio::test]
    async fn test_reads_consecutive_lines() {
        let mut reader = BufReader::new(&b"one\ntwo\n"[..]);
        let mut line = Vec::new();

        assert!(read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
        assert_eq!(line, b"one\n");

        assert!(read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
        assert_eq!(line, b"two\n");

        assert!(!read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
    }

    #[tokio::test]
    async fn test_eof_discards_partial_line() {
        let mut reader = BufReader::new(&b"no newline here"[..]);
        let mut line = Vec::new();

        let got = read_line_capped(&mut reader, &mut line, 1024).await.unwrap();

        assert!(!got);
    }

    #[tokio::test]
    async fn test_carriage_return_passes_through() {
        let mut reader = BufReader::new(&b"hi\r\n"[..]);
        let mut line = Vec::new();

        assert!(read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
        assert_eq!(line, b"hi\r\n");
    }

    #[tokio::test]
    async fn test_line_at_exactly_the_cap_is_accepted() {
        // 7 content bytes + delimiter == cap of 8
        let mut reader = BufReader::new(&b"1234567\n"[..]);
        let mut line = Vec::new();

        assert!(read_line_capped(&mut reader, &mut line, 8).await.unwrap());
        assert_eq!(line, b"1234567\n");
    }

    #[tokio::test]
    async fn test_oversized_line_is_an_error() {
        let mut reader = BufReader::new(&b"123456789\n"[..]);
        let mut line = Vec::new();

        let err = read_line_capped(&mut reader, &mut line, 8).await.unwrap_err();

        assert!(matches!(err, RelayError::LineTooLong { limit: 8 }));
    }

    #[tokio::test]
    async fn test_oversized_without_any_delimiter_is_an_error() {
        let data = vec![b'x'; 4096];
        let mut reader = BufReader::new(&data[..]);
        let mut line = Vec::new();

        let err = read_line_capped(&mut reader, &mut line, 1024).await.unwrap_err();

        assert!(matches!(err, RelayError::LineTooLong { limit: 1024 }));
    }

    #[tokio::test]
    async fn test_delimiter_split_across_buffer_refills() {
        // A 3-byte buffer forces the delimiter into a later fill_buf chunk.
        let mut reader = BufReader::with_capacity(3, &b"abcdef\n"[..]);
        let mut line = Vec::new();

        assert!(read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
        assert_eq!(line, b"abcdef\n");
    }

    #[tokio::test]
    async fn test_empty_line_is_a_complete_line() {
        let mut reader = BufReader::new(&b"\n"[..]);
        let mut line = Vec::new();

        assert!(read_line_capped(&mut reader, &mut line, 1024).await.unwrap());
        assert_eq!(line, b"\n");
    }
}

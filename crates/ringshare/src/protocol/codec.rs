//! Frame codec for RingShare.
//!
//! Each side writes a single JSON document and then shuts down its write
//! half; the reader consumes everything up to EOF. A frame longer than the
//! configured limit or malformed JSON is a protocol violation; a connection
//! that closes without sending anything reads as `UnexpectedEof`.

use std::io;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

/// Room reserved for everything in a frame that is not payload
const FRAME_OVERHEAD: usize = 64 * 1024;

/// Largest frame needed to carry `max_payload` bytes of base64 payload
pub fn max_frame_len(max_payload: usize) -> usize {
    max_payload.div_ceil(3).saturating_mul(4).saturating_add(FRAME_OVERHEAD)
}

/// Read one frame up to EOF and decode it
pub async fn read_frame<T, R>(io: &mut R, limit: usize) -> Result<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    (&mut *io).take(limit as u64 + 1).read_to_end(&mut buf).await?;

    if buf.is_empty() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed before a message arrived");
        return Err(eof.into());
    }
    if buf.len() > limit {
        return Err(Error::Protocol(format!("message exceeds {limit} bytes")));
    }

    Ok(serde_json::from_slice(&buf)?)
}

/// Encode one frame and close the write half
pub async fn write_frame<T, W>(io: &mut W, message: &T) -> Result<()>
where
    T: Serialize,
    W: AsyncWrite + Unpin,
{
    let bytes = serde_json::to_vec(message)?;

    io.write_all(&bytes).await?;
    io.shutdown().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Request, Response};

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let (mut client, mut server) = tokio::io::duplex(4096);

        let request = Request::Search { filename: "a.txt".into() };
        write_frame(&mut client, &request).await.unwrap();

        let received: Request = read_frame(&mut server, 4096).await.unwrap();
        assert_eq!(received, request);
    }

    #[tokio::test]
    async fn test_truncated_frame_is_protocol_error() {
        let (mut client, mut server) = tokio::io::duplex(4096);
        client.write_all(br#"{"verb":"SEARCH","filena"#).await.unwrap();
        client.shutdown().await.unwrap();

        let err = read_frame::<Request, _>(&mut server, 4096).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_empty_frame_is_eof() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.shutdown().await.unwrap();

        let err = read_frame::<Response, _>(&mut server, 64).await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64 * 1024);
        let request = Request::Upload { filename: "big".into(), sender_id: 1, payload: vec![7; 2048] };
        write_frame(&mut client, &request).await.unwrap();

        let err = read_frame::<Request, _>(&mut server, 1024).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn test_max_frame_len_covers_base64() {
        assert_eq!(max_frame_len(0), FRAME_OVERHEAD);
        assert_eq!(max_frame_len(3), 4 + FRAME_OVERHEAD);
        assert_eq!(max_frame_len(4), 8 + FRAME_OVERHEAD);
    }
}

// ABOUTME: Frame based I/O over the two halves of an SMPP TCP connection
// ABOUTME: A buffered reader turns bytes into Frames, a buffered writer flushes one PDU at a time

use crate::codec::{CodecError, Encodable, Frame, PduHeader};
use bytes::{Buf, BytesMut};
use std::io::{self, Cursor};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Errors raised while reading frames.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The peer closed the socket in the middle of a frame.
    #[error("connection reset by peer")]
    Reset,

    /// A complete frame was received but its body could not be decoded. The
    /// frame has been discarded and the stream is still in sync.
    #[error("invalid PDU {command_id:#010x} (sequence {sequence_number}): {source}")]
    InvalidPdu {
        command_id: u32,
        sequence_number: u32,
        #[source]
        source: CodecError,
    },

    /// The length prefix is unusable, the stream cannot be resynchronised.
    #[error("framing error: {0}")]
    Framing(#[source] CodecError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Split a connected socket into a frame reader and a frame writer so that
/// the read loop and request senders can run concurrently.
pub fn split(socket: TcpStream) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
    let (read, write) = socket.into_split();
    (FrameReader::new(read), FrameWriter::new(write))
}

/// Read half of an SMPP connection.
#[derive(Debug)]
pub struct FrameReader<R> {
    stream: R,

    // The buffer for reading frames.
    buffer: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(stream: R) -> Self {
        FrameReader {
            stream,
            // 4KB holds several submit_sm_resp / deliver_sm PDUs
            buffer: BytesMut::with_capacity(4 * 1024),
        }
    }

    /// Read a single `Frame` value from the underlying stream.
    ///
    /// Waits until a whole frame is buffered. Any data remaining in the read
    /// buffer after the frame has been parsed is kept for the next call.
    ///
    /// Returns `None` when the peer closed the stream on a frame boundary.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            // `0` indicates "end of stream".
            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                // For this to be a clean shutdown, there should be no data in
                // the read buffer.
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ConnectionError::Reset)
                };
            }
        }
    }

    /// Tries to parse a frame from the buffer. If the buffer contains enough
    /// data, the frame is returned and the data removed from the buffer. If not
    /// enough data has been buffered yet, `Ok(None)` is returned.
    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectionError> {
        let mut buf = Cursor::new(&self.buffer[..]);

        // Checking the length prefix is much cheaper than a full parse and
        // avoids allocating anything until the whole frame has arrived.
        let len = match Frame::check(&mut buf) {
            Ok(len) => len,
            Err(CodecError::Incomplete) => return Ok(None),
            Err(e) => return Err(ConnectionError::Framing(e)),
        };

        let parsed = Frame::parse(&mut buf);
        let header = &self.buffer[..PduHeader::SIZE];
        let command_id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        let sequence_number = u32::from_be_bytes([header[12], header[13], header[14], header[15]]);

        // Discard the frame whether or not its body was valid.
        self.buffer.advance(len);

        parsed.map(Some).map_err(|source| ConnectionError::InvalidPdu {
            command_id,
            sequence_number,
            source,
        })
    }
}

/// Write half of an SMPP connection.
#[derive(Debug)]
pub struct FrameWriter<W> {
    // Decorated with a `BufWriter` so each PDU reaches the socket in one write.
    stream: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(stream: W) -> Self {
        FrameWriter {
            stream: BufWriter::new(stream),
        }
    }

    /// Encode and write one PDU, then flush.
    pub async fn write_pdu<P: Encodable>(&mut self, pdu: &P) -> io::Result<()> {
        let bytes = pdu
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await
    }

    /// Flush and shut down the write direction.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}

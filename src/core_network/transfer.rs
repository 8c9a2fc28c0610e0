//! Byte pump between a driver stream and the data socket.

use crate::core_driver::DriverError;
use crate::core_network::error::TransferError;
use crate::core_network::throttle::Throttle;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context as TaskContext, Poll};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Chunks queued between the socket reader and the driver during an upload.
const UPLOAD_QUEUE_DEPTH: usize = 4;

#[derive(Clone)]
pub struct TransferOpts {
    pub throttle: Throttle,
    pub cancel: CancellationToken,
    pub buffer_size: usize,
    /// Translate line endings (`TYPE A`).
    pub ascii: bool,
}

/// LF to CRLF for outgoing ASCII data. A CR already in front of an LF is
/// kept as is, across chunk boundaries too.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len() + input.len() / 16);
        for &byte in input {
            if byte == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(byte);
            self.last_was_cr = byte == b'\r';
        }
    }
}

/// CRLF to LF for incoming ASCII data. A lone CR is passed through.
#[derive(Debug, Default)]
pub struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len());
        for &byte in input {
            if self.pending_cr {
                self.pending_cr = false;
                if byte != b'\n' {
                    out.push(b'\r');
                }
            }
            if byte == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(byte);
            }
        }
    }

    /// Flushes a CR held back at the very end of the stream.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if std::mem::take(&mut self.pending_cr) {
            out.push(b'\r');
        }
    }
}

/// Copies `reader` (a driver stream) to `writer` (the data socket). Returns
/// the number of bytes read from the driver.
pub async fn send_stream<R, W>(
    reader: &mut R,
    writer: &mut W,
    opts: &TransferOpts,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; opts.buffer_size.max(1)];
    let mut encoded = Vec::new();
    let mut encoder = AsciiEncoder::default();
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => return Err(TransferError::Aborted),
            read = reader.read(&mut buf) => read.map_err(DriverError::from)?,
        };
        if n == 0 {
            break;
        }

        tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => return Err(TransferError::Aborted),
            _ = opts.throttle.consume(n) => {}
        }

        let chunk = if opts.ascii {
            encoded.clear();
            encoder.encode(&buf[..n], &mut encoded);
            &encoded[..]
        } else {
            &buf[..n]
        };

        tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => return Err(TransferError::Aborted),
            written = writer.write_all(chunk) => written?,
        }
        total += n as u64;
    }

    writer.shutdown().await?;
    Ok(total)
}

/// Reads the data socket and forwards chunks to `tx`, which feeds a
/// [`ChannelReader`] handed to the driver.
///
/// On abort or socket error an `Err` is queued last so the driver never sees
/// a clean end of stream for a partial upload. Stops quietly once the
/// receiving side is dropped. Returns the number of bytes received.
pub async fn receive_stream<R>(
    reader: &mut R,
    tx: mpsc::Sender<io::Result<Vec<u8>>>,
    opts: &TransferOpts,
) -> Result<u64, TransferError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; opts.buffer_size.max(1)];
    let mut decoder = AsciiDecoder::default();
    let mut total = 0u64;

    loop {
        let read = tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => {
                let _ = tx.send(Err(aborted())).await;
                return Err(TransferError::Aborted);
            }
            read = reader.read(&mut buf) => read,
        };
        let n = match read {
            Ok(n) => n,
            Err(e) => {
                let _ = tx.send(Err(io::Error::new(e.kind(), e.to_string()))).await;
                return Err(TransferError::Io(e));
            }
        };

        if n == 0 {
            if opts.ascii {
                let mut tail = Vec::new();
                decoder.finish(&mut tail);
                if !tail.is_empty() {
                    let _ = tx.send(Ok(tail)).await;
                }
            }
            break;
        }

        tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => {
                let _ = tx.send(Err(aborted())).await;
                return Err(TransferError::Aborted);
            }
            _ = opts.throttle.consume(n) => {}
        }

        let chunk = if opts.ascii {
            let mut decoded = Vec::with_capacity(n);
            decoder.decode(&buf[..n], &mut decoded);
            decoded
        } else {
            buf[..n].to_vec()
        };
        total += n as u64;

        if tx.send(Ok(chunk)).await.is_err() {
            break;
        }
    }
    Ok(total)
}

/// Upload queue exposed to the driver as an `AsyncRead`.
pub struct ChannelReader {
    rx: mpsc::Receiver<io::Result<Vec<u8>>>,
    chunk: Vec<u8>,
    pos: usize,
}

impl ChannelReader {
    pub fn new(rx: mpsc::Receiver<io::Result<Vec<u8>>>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
        }
    }
}

impl AsyncRead for ChannelReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut TaskContext<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            if this.pos < this.chunk.len() {
                let n = out.remaining().min(this.chunk.len() - this.pos);
                out.put_slice(&this.chunk[this.pos..this.pos + n]);
                this.pos += n;
                return Poll::Ready(Ok(()));
            }
            match ready!(this.rx.poll_recv(cx)) {
                Some(Ok(chunk)) => {
                    this.chunk = chunk;
                    this.pos = 0;
                }
                Some(Err(e)) => return Poll::Ready(Err(e)),
                None => return Poll::Ready(Ok(())),
            }
        }
    }
}

/// Channel pair for one upload.
pub fn upload_channel() -> (mpsc::Sender<io::Result<Vec<u8>>>, ChannelReader) {
    let (tx, rx) = mpsc::channel(UPLOAD_QUEUE_DEPTH);
    (tx, ChannelReader::new(rx))
}

fn aborted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "transfer aborted")
}

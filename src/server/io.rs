//! Line ending translation for ASCII mode transfers.
//!
//! TYPE A transfers carry CRLF line endings on the wire. These readers
//! translate between the wire form and the host form while streaming, so
//! neither side ever needs the whole file in memory. TYPE I transfers
//! bypass this module entirely.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

const SCRATCH_SIZE: usize = 4096;

/// Rewrites bare LF to CRLF. Wraps the storage reader of an outbound
/// (RETR) ASCII transfer. Existing CRLF sequences pass through unchanged.
pub struct LfToCrlfReader<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    last_was_cr: bool,
}

impl<R> LfToCrlfReader<R> {
    pub fn new(inner: R) -> Self {
        LfToCrlfReader {
            inner,
            buf: Vec::new(),
            pos: 0,
            last_was_cr: false,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for LfToCrlfReader<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, out: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        if this.pos >= this.buf.len() {
            let mut scratch = [0u8; SCRATCH_SIZE];
            let mut rb = ReadBuf::new(&mut scratch);
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut rb))?;
            let filled = rb.filled();
            if filled.is_empty() {
                return Poll::Ready(Ok(()));
            }
            this.buf.clear();
            this.pos = 0;
            for &b in filled {
                if b == b'\n' && !this.last_was_cr {
                    this.buf.push(b'\r');
                }
                this.last_was_cr = b == b'\r';
                this.buf.push(b);
            }
        }
        let n = std::cmp::min(out.remaining(), this.buf.len() - this.pos);
        out.put_slice(&this.buf[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

/// Rewrites CRLF to LF. Wraps the data socket of an inbound (STOR/APPE)
/// ASCII transfer. A CR that is not followed by LF is kept, even across
/// read boundaries.
pub struct CrlfToLfReader<R> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    pending_cr: bool,
}

impl<R> CrlfToLfReader<R> {
    pub fn new(inner: R) -> Self {
        CrlfToLfReader {
            inner,
            buf: Vec::new(),
            pos: 0,
            pending_cr: false,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for CrlfToLfReader<R> {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, out: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;
        while this.pos >= this.buf.len() {
            let mut scratch = [0u8; SCRATCH_SIZE];
            let mut rb = ReadBuf::new(&mut scratch);
            ready!(Pin::new(&mut this.inner).poll_read(cx, &mut rb))?;
            let filled = rb.filled();
            this.buf.clear();
            this.pos = 0;
            if filled.is_empty() {
                if this.pending_cr {
                    // EOF directly after a CR: the CR was real.
                    this.pending_cr = false;
                    this.buf.push(b'\r');
                    break;
                }
                return Poll::Ready(Ok(()));
            }
            let mut i = 0;
            if this.pending_cr {
                this.pending_cr = false;
                if filled[0] == b'\n' {
                    this.buf.push(b'\n');
                    i = 1;
                } else {
                    this.buf.push(b'\r');
                }
            }
            while i < filled.len() {
                let b = filled[i];
                if b == b'\r' {
                    if i + 1 < filled.len() {
                        if filled[i + 1] == b'\n' {
                            this.buf.push(b'\n');
                            i += 2;
                        } else {
                            this.buf.push(b'\r');
                            i += 1;
                        }
                    } else {
                        // Chunk ends in CR, decide when the next one arrives.
                        this.pending_cr = true;
                        i += 1;
                    }
                } else {
                    this.buf.push(b);
                    i += 1;
                }
            }
            // A chunk of just a CR leaves nothing to emit; read more.
        }
        let n = std::cmp::min(out.remaining(), this.buf.len() - this.pos);
        out.put_slice(&this.buf[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::AsyncReadExt;

    // Serves a preset sequence of chunks, one per read call, so the
    // translation can be exercised across read boundaries.
    struct Chunked {
        chunks: Vec<Vec<u8>>,
    }

    impl Chunked {
        fn new(chunks: &[&[u8]]) -> Self {
            Chunked {
                chunks: chunks.iter().rev().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl AsyncRead for Chunked {
        fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, out: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if let Some(chunk) = self.chunks.pop() {
                out.put_slice(&chunk);
            }
            Poll::Ready(Ok(()))
        }
    }

    async fn collect<R: AsyncRead + Unpin>(mut r: R) -> Vec<u8> {
        let mut out = Vec::new();
        r.read_to_end(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn lf_becomes_crlf() {
        let out = collect(LfToCrlfReader::new(Chunked::new(&[b"one\ntwo\n"]))).await;
        assert_eq!(out, b"one\r\ntwo\r\n");
    }

    #[tokio::test]
    async fn existing_crlf_is_kept() {
        let out = collect(LfToCrlfReader::new(Chunked::new(&[b"one\r\ntwo\n"]))).await;
        assert_eq!(out, b"one\r\ntwo\r\n");
    }

    #[tokio::test]
    async fn crlf_split_over_reads_is_kept() {
        let out = collect(LfToCrlfReader::new(Chunked::new(&[b"one\r", b"\ntwo"]))).await;
        assert_eq!(out, b"one\r\ntwo");
    }

    #[tokio::test]
    async fn crlf_becomes_lf() {
        let out = collect(CrlfToLfReader::new(Chunked::new(&[b"one\r\ntwo\r\n"]))).await;
        assert_eq!(out, b"one\ntwo\n");
    }

    #[tokio::test]
    async fn crlf_split_over_reads_becomes_lf() {
        let out = collect(CrlfToLfReader::new(Chunked::new(&[b"one\r", b"\ntwo"]))).await;
        assert_eq!(out, b"one\ntwo");
    }

    #[tokio::test]
    async fn lone_cr_is_kept() {
        let out = collect(CrlfToLfReader::new(Chunked::new(&[b"one\rtwo"]))).await;
        assert_eq!(out, b"one\rtwo");
    }

    #[tokio::test]
    async fn trailing_cr_at_eof_is_kept() {
        let out = collect(CrlfToLfReader::new(Chunked::new(&[b"one\r"]))).await;
        assert_eq!(out, b"one\r");
    }
}

//! Streaming reads over the container file
//!
//! A virtual file's bytes live at a fixed range inside the container; the
//! readers here hold their own short-lived descriptor positioned at the
//! range start and clamp every read to the window, so concurrent streams
//! never share a handle.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, ReadBuf};

/// Synchronous byte stream over one resource's window of the container
pub struct ResourceReader {
    inner: io::Take<File>,
}

impl ResourceReader {
    /// Open `container` and position a reader over `[start, start + length)`
    pub fn open(container: &Path, start: u64, length: u64) -> io::Result<Self> {
        let mut file = File::open(container)?;
        file.seek(SeekFrom::Start(start))?;
        Ok(ResourceReader {
            inner: file.take(length),
        })
    }

    /// Bytes remaining in the window
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl Read for ResourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

/// Asynchronous counterpart of [`ResourceReader`]
pub struct AsyncResourceReader {
    inner: tokio::io::Take<tokio::fs::File>,
}

impl AsyncResourceReader {
    /// Open `container` and position a reader over `[start, start + length)`
    pub async fn open(container: &Path, start: u64, length: u64) -> io::Result<Self> {
        let mut file = tokio::fs::File::open(container).await?;
        file.seek(SeekFrom::Start(start)).await?;
        Ok(AsyncResourceReader {
            inner: file.take(length),
        })
    }

    /// Bytes remaining in the window
    pub fn remaining(&self) -> u64 {
        self.inner.limit()
    }
}

impl AsyncRead for AsyncResourceReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

/// Byte stream returned by the overlay's streamed read: a windowed
/// container reader for virtual paths, the real file otherwise.
pub enum FileStream {
    /// Windowed read over the container's resource region
    Resource(ResourceReader),
    /// Real file opened by the fallback
    Real(File),
}

impl Read for FileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            FileStream::Resource(reader) => reader.read(buf),
            FileStream::Real(file) => file.read(buf),
        }
    }
}

/// Asynchronous counterpart of [`FileStream`]
pub enum AsyncFileStream {
    /// Windowed read over the container's resource region
    Resource(AsyncResourceReader),
    /// Real file opened by the fallback
    Real(tokio::fs::File),
}

impl AsyncRead for AsyncFileStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            AsyncFileStream::Resource(reader) => Pin::new(reader).poll_read(cx, buf),
            AsyncFileStream::Real(file) => Pin::new(file).poll_read(cx, buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn container_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_windowed_read() {
        let container = container_with(b"HEADERpayloadTRAILER");

        let mut reader = ResourceReader::open(container.path(), 6, 7).unwrap();
        assert_eq!(reader.remaining(), 7);

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"payload");
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_window_clamps_past_range() {
        let container = container_with(b"0123456789");

        let mut reader = ResourceReader::open(container.path(), 8, 5).unwrap();
        let mut buf = Vec::new();
        // the container ends before the window does; the reader stops there
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"89");
    }

    #[tokio::test]
    async fn test_async_windowed_read() {
        let container = container_with(b"xxABCDEFxx");

        let mut reader = AsyncResourceReader::open(container.path(), 2, 6).await.unwrap();
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ABCDEF");
    }

    #[tokio::test]
    async fn test_async_stream_enum_reads() {
        let container = container_with(b"__windowed__");

        let reader = AsyncResourceReader::open(container.path(), 2, 8).await.unwrap();
        let mut stream = AsyncFileStream::Resource(reader);
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"windowed");
    }
}

//! Byte sources feeding the peak finder.
//!
//! A source delivers the raw PCM stream in order as chunks of whatever size it
//! chooses. `Ok(None)` signals end of stream; an error aborts the extraction.

use crate::error::{PeaksError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Trait for ordered chunk delivery.
///
/// This trait allows swapping implementations (file, in-memory, mock).
#[async_trait]
pub trait ByteSource: Send {
    /// Read the next chunk.
    ///
    /// # Returns
    /// The next chunk, `None` at end of stream, or an error
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Source reading fixed-size chunks from any async reader.
pub struct ReaderSource<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> ReaderSource<R> {
    /// Reads at most `chunk_size` bytes per chunk (minimum 1).
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: vec![0; chunk_size.max(1)],
        }
    }
}

impl ReaderSource<tokio::fs::File> {
    /// Open a file on disk as a byte source.
    pub async fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| PeaksError::Stream {
                message: format!("failed to open {}: {}", path.display(), e),
            })?;
        Ok(Self::new(file, chunk_size))
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> ByteSource for ReaderSource<R> {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let read = self
            .reader
            .read(&mut self.buffer)
            .await
            .map_err(|e| PeaksError::Stream {
                message: format!("read failed: {}", e),
            })?;

        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(self.buffer[..read].to_vec()))
        }
    }
}

/// In-memory source that cuts its data according to a chunk plan.
///
/// The plan is cycled until the data is exhausted. Zero entries yield empty
/// chunks, which lets callers exercise zero-length deliveries.
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    plan: Vec<usize>,
    position: usize,
    step: usize,
}

impl MemorySource {
    /// Fixed-size chunks of `chunk_size` bytes (minimum 1).
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self::with_plan(data, vec![chunk_size.max(1)])
    }

    /// Chunks sized by cycling through `plan`.
    ///
    /// A plan without any non-zero entry delivers the data as one chunk.
    pub fn with_plan(data: Vec<u8>, plan: Vec<usize>) -> Self {
        let plan = if plan.iter().any(|&size| size > 0) {
            plan
        } else {
            vec![data.len().max(1)]
        };
        Self {
            data,
            plan,
            position: 0,
            step: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.position >= self.data.len() {
            return Ok(None);
        }

        let size = self.plan[self.step % self.plan.len()];
        self.step += 1;
        let end = (self.position + size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;
        Ok(Some(chunk))
    }
}

/// Mock byte source for testing
#[derive(Debug, Clone)]
pub struct MockByteSource {
    inner: MemorySource,
    fail_after: Option<usize>,
    delivered: usize,
    error_message: String,
}

impl MockByteSource {
    /// Create a mock delivering `data` in `chunk_size` pieces.
    pub fn new(data: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            inner: MemorySource::new(data, chunk_size),
            fail_after: None,
            delivered: 0,
            error_message: "mock stream error".to_string(),
        }
    }

    /// Configure the mock to fail once `chunks` chunks have been delivered
    pub fn with_failure_after(mut self, chunks: usize) -> Self {
        self.fail_after = Some(chunks);
        self
    }

    /// Configure the error message for failures
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    /// Chunks delivered so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

#[async_trait]
impl ByteSource for MockByteSource {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.fail_after.is_some_and(|limit| self.delivered >= limit) {
            return Err(PeaksError::Stream {
                message: self.error_message.clone(),
            });
        }
        let chunk = self.inner.next_chunk().await?;
        if chunk.is_some() {
            self.delivered += 1;
        }
        Ok(chunk)
    }
}

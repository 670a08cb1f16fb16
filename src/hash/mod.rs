//! Content hashing for snapshots.
//!
//! [`hash_file`] streams a file through SHA-256 in 1 MiB chunks and can
//! write a (optionally gzip-compressed) copy into content-addressed storage
//! on the way. An existing destination is never overwritten.

pub mod progress;

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};

pub use progress::ProgressIndicator;

/// Chunk size for streaming reads.
pub const BUFFER_SIZE: usize = 1 << 20;

/// Errors from hashing and storing file content.
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// The storage destination already exists.
    #[error(
        "hash conflict: {} already exists; refusing to overwrite stored content",
        path.display()
    )]
    DestinationExists {
        /// The existing destination.
        path: PathBuf,
    },

    /// Reading the source or writing the copy failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result of [`hash_file`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHash {
    /// Lowercase hex SHA-256 of the file content.
    pub digest: String,
    /// On-disk size of the written copy, or 0 if none was written.
    pub written: u64,
}

/// Lowercase hex SHA-256 of a string, used for path name hashes.
#[must_use]
pub fn hash_str(s: &str) -> String {
    to_hex(&Sha256::digest(s.as_bytes()))
}

fn to_hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write as _;
        let _ = write!(hex, "{b:02x}");
    }
    hex
}

// ---------------------------------------------------------------------------
// Storage sink
// ---------------------------------------------------------------------------

enum SinkWriter {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

/// The stored copy being written; errors name its path.
struct Sink {
    path: PathBuf,
    writer: SinkWriter,
}

impl Sink {
    fn create(path: &Path, compress: bool) -> Result<Self, HashError> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|source| {
                if source.kind() == io::ErrorKind::AlreadyExists {
                    HashError::DestinationExists {
                        path: path.to_owned(),
                    }
                } else {
                    HashError::Io {
                        path: path.to_owned(),
                        source,
                    }
                }
            })?;
        let writer = BufWriter::new(file);
        let writer = if compress {
            SinkWriter::Gzip(GzEncoder::new(writer, Compression::default()))
        } else {
            SinkWriter::Plain(writer)
        };
        Ok(Self {
            path: path.to_owned(),
            writer,
        })
    }

    fn io_error(&self, source: io::Error) -> HashError {
        HashError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), HashError> {
        let written = match &mut self.writer {
            SinkWriter::Plain(w) => w.write_all(buf),
            SinkWriter::Gzip(w) => w.write_all(buf),
        };
        written.map_err(|e| self.io_error(e))
    }

    /// Flush and sync the copy, returning its on-disk size.
    fn finish(self) -> Result<u64, HashError> {
        let path = self.path;
        let io_err = |source| HashError::Io {
            path: path.clone(),
            source,
        };
        let mut writer = match self.writer {
            SinkWriter::Plain(w) => w,
            SinkWriter::Gzip(w) => w.finish().map_err(io_err)?,
        };
        writer.flush().map_err(io_err)?;
        writer.get_ref().sync_all().map_err(io_err)?;
        Ok(fs::metadata(&path).map_err(io_err)?.len())
    }
}

// ---------------------------------------------------------------------------
// hash_file
// ---------------------------------------------------------------------------

/// Hash `path`, optionally storing a copy at `save_to`.
///
/// With `compress`, the copy is gzip-compressed. The progress indicator, if
/// given, is polled once per full chunk and never affects the digest.
///
/// # Errors
/// Returns [`HashError::DestinationExists`] if `save_to` already exists, or
/// [`HashError::Io`] on read/write failures. A partially written copy is
/// removed before an I/O error is returned.
#[tracing::instrument(level = "debug", skip(progress))]
pub fn hash_file(
    path: &Path,
    compress: bool,
    save_to: Option<&Path>,
    progress: Option<&mut ProgressIndicator<'_>>,
) -> Result<FileHash, HashError> {
    let mut sink = save_to.map(|dest| Sink::create(dest, compress)).transpose()?;
    let result = stream_into(path, sink.as_mut(), progress).and_then(|digest| {
        let written = sink.map_or(Ok(0), Sink::finish)?;
        Ok(FileHash { digest, written })
    });
    if result.is_err()
        && let Some(dest) = save_to
    {
        let _ = fs::remove_file(dest);
    }
    result
}

fn stream_into(
    path: &Path,
    mut sink: Option<&mut Sink>,
    mut progress: Option<&mut ProgressIndicator<'_>>,
) -> Result<String, HashError> {
    let read_err = |source| HashError::Io {
        path: path.to_owned(),
        source,
    };
    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0_u8; BUFFER_SIZE];
    loop {
        let filled = fill(&mut file, &mut buffer).map_err(read_err)?;
        let chunk = &buffer[..filled];
        hasher.update(chunk);
        if let Some(sink) = sink.as_deref_mut() {
            sink.write_all(chunk)?;
        }
        if filled < BUFFER_SIZE {
            break;
        }
        if let Some(indicator) = progress.as_deref_mut() {
            indicator.tick();
        }
    }
    Ok(to_hex(&hasher.finalize()))
}

/// Read until `buffer` is full or the file ends.
fn fill(file: &mut File, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read back a stored copy written by [`hash_file`].
///
/// # Errors
/// Returns the I/O error if the file cannot be read or decompressed.
pub fn read_stored(path: &Path, compressed: bool) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut content = Vec::new();
    if compressed {
        GzDecoder::new(file).read_to_end(&mut content)?;
    } else {
        io::BufReader::new(file).read_to_end(&mut content)?;
    }
    Ok(content)
}

//! File providers backing the archive locator
//!
//! The locator only ever asks for a file by name. Providers decide where
//! the bytes come from: a directory on disk, named in-memory blobs, or a
//! bundle container holding many archives in one file.

use crate::error::{ResourceError, Result};
use binrw::{BinRead, BinReaderExt};
use scumm_formats::FormatError;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// A readable, seekable archive stream
pub trait ArchiveSource: Read + Seek {}

impl<T: Read + Seek> ArchiveSource for T {}

/// Opens archive files by name
///
/// A missing file is reported as [`io::ErrorKind::NotFound`]; any other
/// error is passed on unchanged.
pub trait FileProvider {
    /// Open `name` for reading
    fn open(&self, name: &str) -> io::Result<Box<dyn ArchiveSource>>;

    /// Whether `name` can be opened
    fn exists(&self, name: &str) -> bool {
        self.open(name).is_ok()
    }
}

fn not_found(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{name} not found"))
}

/// Files under a root directory
///
/// Game files ship in upper case on some media and lower case on others;
/// the exact name is tried first, then both case-folded forms.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Serve files from `root`
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProvider for DirectoryProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArchiveSource>> {
        let candidates = [name.to_string(), name.to_lowercase(), name.to_uppercase()];
        for candidate in &candidates {
            match File::open(self.root.join(candidate)) {
                Ok(file) => {
                    trace!("opened {}", self.root.join(candidate).display());
                    return Ok(Box::new(BufReader::new(file)));
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Err(not_found(name))
    }
}

/// Named in-memory files
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn insert<S: Into<String>>(&mut self, name: S, data: Vec<u8>) {
        self.files.insert(name.into(), Arc::from(data));
    }

    /// Builder form of [`Self::insert`]
    #[must_use]
    pub fn with_file<S: Into<String>>(mut self, name: S, data: Vec<u8>) -> Self {
        self.insert(name, data);
        self
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.files.remove(name).is_some()
    }
}

/// `Arc<[u8]>` adapter so a cursor can share the blob
#[derive(Clone)]
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FileProvider for MemoryProvider {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArchiveSource>> {
        let data = self
            .files
            .get(name)
            .or_else(|| {
                self.files
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .ok_or_else(|| not_found(name))?;
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(data)))))
    }
}

/// Container table header: `[record_offset: u32be][record_length: u32be]`
#[derive(Debug, Clone, Copy, BinRead)]
#[br(big)]
struct ContainerHeader {
    record_offset: u32,
    record_length: u32,
}

/// One container record: `[offset: u32be][length: u32be][name: 32 bytes]`
#[derive(Debug, Clone, BinRead)]
#[br(big)]
struct ContainerRecord {
    offset: u32,
    length: u32,
    name: [u8; 32],
}

impl ContainerRecord {
    const SIZE: u32 = 0x28;

    fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(32);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Window onto `[start, start + len)` of an inner stream
struct SubRange<R> {
    inner: R,
    start: u64,
    len: u64,
    pos: u64,
}

impl<R: Seek> SubRange<R> {
    fn new(mut inner: R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self {
            inner,
            start,
            len,
            pos: 0,
        })
    }
}

impl<R: Read> Read for SubRange<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.pos);
        let max = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        if max == 0 {
            return Ok(0);
        }
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Seek> Seek for SubRange<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::End(d) => self.len.checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        }
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of sub-file")
        })?;
        self.inner.seek(SeekFrom::Start(self.start + target))?;
        self.pos = target;
        Ok(target)
    }
}

/// A bundle container holding many archives in one file
///
/// Lookups that miss the container's table fall back to the inner
/// provider, so loose files next to the bundle still open.
pub struct ContainerProvider<P> {
    inner: P,
    container: String,
    entries: HashMap<String, (u64, u64)>,
}

impl<P: FileProvider> ContainerProvider<P> {
    /// Read the table of `container` through `inner`
    pub fn new(inner: P, container: &str) -> Result<Self> {
        let mut stream = inner.open(container)?;
        let file_len = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;

        let header: ContainerHeader = stream.read_be().map_err(FormatError::from)?;
        if header.record_length % ContainerRecord::SIZE != 0 {
            return Err(ResourceError::Config(format!(
                "container {container}: record table length {} is not a multiple of {}",
                header.record_length,
                ContainerRecord::SIZE
            )));
        }

        stream.seek(SeekFrom::Start(u64::from(header.record_offset)))?;
        let count = header.record_length / ContainerRecord::SIZE;
        let mut entries = HashMap::new();
        for _ in 0..count {
            let record: ContainerRecord = stream.read_be().map_err(FormatError::from)?;
            let end = u64::from(record.offset) + u64::from(record.length);
            if end > file_len {
                return Err(ResourceError::Config(format!(
                    "container {container}: entry {} runs past end of file",
                    record.name()
                )));
            }
            entries.insert(
                record.name().to_lowercase(),
                (u64::from(record.offset), u64::from(record.length)),
            );
        }
        debug!("container {} holds {} files", container, entries.len());

        Ok(Self {
            inner,
            container: container.to_string(),
            entries,
        })
    }

    /// Names stored in the container (lower case)
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<P: FileProvider> FileProvider for ContainerProvider<P> {
    fn open(&self, name: &str) -> io::Result<Box<dyn ArchiveSource>> {
        if let Some(&(start, len)) = self.entries.get(&name.to_lowercase()) {
            let stream = self.inner.open(&self.container)?;
            return Ok(Box::new(SubRange::new(stream, start, len)?));
        }
        self.inner.open(name)
    }
}

impl<P> fmt::Debug for ContainerProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerProvider")
            .field("container", &self.container)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

/// Build a container image from `(name, data)` pairs
///
/// Files are laid out after the 8-byte header, the record table last.
pub fn build_container(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    let mut records = Vec::new();
    let mut offset = 8u32;
    for (name, data) in files {
        let mut raw_name = [0u8; 32];
        let n = name.len().min(31);
        raw_name[..n].copy_from_slice(&name.as_bytes()[..n]);
        records.extend_from_slice(&offset.to_be_bytes());
        records.extend_from_slice(&(data.len() as u32).to_be_bytes());
        records.extend_from_slice(&raw_name);
        body.extend_from_slice(data);
        offset += data.len() as u32;
    }

    let mut out = Vec::with_capacity(8 + body.len() + records.len());
    out.extend_from_slice(&offset.to_be_bytes());
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    out.extend(body);
    out.extend(records);
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn read_all(mut source: Box<dyn ArchiveSource>) -> Vec<u8> {
        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_memory_provider() {
        let provider = MemoryProvider::new().with_file("MONKEY.000", vec![1, 2, 3]);
        assert_eq!(read_all(provider.open("MONKEY.000").unwrap()), vec![1, 2, 3]);
        assert_eq!(read_all(provider.open("monkey.000").unwrap()), vec![1, 2, 3]);
        let err = provider.open("monkey.001").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!provider.exists("monkey.001"));
    }

    #[test]
    fn test_directory_provider_case_folding() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("tentacle.000"), b"index").unwrap();
        std::fs::write(dir.path().join("TENTACLE.001"), b"rooms").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert_eq!(read_all(provider.open("TENTACLE.000").unwrap()), b"index");
        assert_eq!(read_all(provider.open("tentacle.001").unwrap()), b"rooms");
        assert_eq!(
            provider.open("tentacle.002").err().unwrap().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_container_lookup_and_fallback() {
        let image = build_container(&[("Game.000", b"zero"), ("game.001", b"one!")]);
        let inner = MemoryProvider::new()
            .with_file("bundle.dat", image)
            .with_file("loose.lfl", b"loose".to_vec());

        let provider = ContainerProvider::new(inner, "bundle.dat").unwrap();
        assert_eq!(read_all(provider.open("GAME.000").unwrap()), b"zero");

        let mut sub = provider.open("game.001").unwrap();
        sub.seek(SeekFrom::Start(2)).unwrap();
        let mut rest = Vec::new();
        sub.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"e!");

        assert_eq!(read_all(provider.open("loose.lfl").unwrap()), b"loose");
        assert!(provider.open("absent").is_err());
    }

    #[test]
    fn test_container_rejects_bad_table() {
        let mut image = build_container(&[("a", b"data")]);
        // Record length no longer a multiple of the record size
        image[7] = 0x27;
        let inner = MemoryProvider::new().with_file("bundle.dat", image);
        assert!(ContainerProvider::new(inner, "bundle.dat").is_err());
    }
}

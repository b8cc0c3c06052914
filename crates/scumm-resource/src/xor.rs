//! XOR-keyed archive streams

use std::io::{self, Read, Seek, SeekFrom};

/// XOR every byte of `data` with `key`
pub fn xor_in_place(data: &mut [u8], key: u8) {
    if key == 0 {
        return;
    }
    for byte in data {
        *byte ^= key;
    }
}

/// Reader that decodes a single-byte XOR key on the fly
///
/// Seeks pass straight through; the key does not depend on position.
#[derive(Debug)]
pub struct XorReader<R> {
    inner: R,
    key: u8,
}

impl<R> XorReader<R> {
    /// Wrap `inner` with `key` (0 disables decoding)
    pub const fn new(inner: R, key: u8) -> Self {
        Self { inner, key }
    }

    /// Current key
    pub const fn key(&self) -> u8 {
        self.key
    }

    /// Unwrap the inner stream
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for XorReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        xor_in_place(&mut buf[..n], self.key);
        Ok(n)
    }
}

impl<R: Seek> Seek for XorReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decodes_after_seek() {
        let mut encoded = b"LECFxxxx".to_vec();
        xor_in_place(&mut encoded, 0x69);
        assert_ne!(&encoded[..4], b"LECF");

        let mut reader = XorReader::new(Cursor::new(encoded), 0x69);
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag).unwrap();
        assert_eq!(&tag, b"LECF");

        reader.seek(SeekFrom::Start(1)).unwrap();
        reader.read_exact(&mut tag).unwrap();
        assert_eq!(&tag, b"ECFx");
    }

    #[test]
    fn test_zero_key_is_identity() {
        let mut reader = XorReader::new(Cursor::new(vec![1, 2, 3]), 0);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }
}

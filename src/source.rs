//! Lazy byte-line iteration over plain or gzip-compressed log files.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use bstr::io::BufReadExt;
use flate2::read::MultiGzDecoder;

/// A finite, non-restartable stream of newline-delimited byte lines.
/// Gzip input (`.gz`) is decompressed incrementally, so memory stays O(1)
/// in the file size. Re-reading means opening a fresh source.
pub struct LineSource {
    reader: Box<dyn BufRead>,
}

impl LineSource {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = match is_compressed(path) {
            true => Box::new(BufReader::new(MultiGzDecoder::new(file))),
            false => Box::new(BufReader::new(file)),
        };
        Ok(Self { reader })
    }

    /// Lines without their terminators. A corrupt gzip stream surfaces as an
    /// `io::Error` item; nothing read before it should be trusted.
    pub fn byte_lines(self) -> impl Iterator<Item = io::Result<Vec<u8>>> {
        self.reader.byte_lines()
    }
}

pub(crate) fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(| ext | ext == "gz")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    #[test]
    fn reads_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.log");
        std::fs::write(&path, "100,cpu_usage,42\n200,mem_usage,99\n").unwrap();

        let lines: Vec<Vec<u8>> = LineSource::open(&path)
            .unwrap()
            .byte_lines()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec![b"100,cpu_usage,42".to_vec(), b"200,mem_usage,99".to_vec()]);
    }

    #[test]
    fn decompresses_gzip_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("example.log.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(b"100,cpu_usage,42\n300,cpu_usage,58\n").unwrap();
        encoder.finish().unwrap();

        let lines: Vec<Vec<u8>> = LineSource::open(&path)
            .unwrap()
            .byte_lines()
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], b"300,cpu_usage,58");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(LineSource::open(Path::new("/nonexistent/example.log")).is_err());
    }

    #[test]
    fn corrupt_gzip_surfaces_mid_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.gz");
        std::fs::write(&path, b"not actually gzip data").unwrap();

        let result: io::Result<Vec<Vec<u8>>> =
            LineSource::open(&path).unwrap().byte_lines().collect();
        assert!(result.is_err());
    }
}

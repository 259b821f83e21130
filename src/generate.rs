//! Log file generator: the producing side of the three-field format.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;
use rand::Rng;

use crate::source::is_compressed;

/// Write `lines` records of the form `<epoch>,<metric>,<value>\n`, epochs
/// counting up from now, values uniform in 0..=100. Output is gzipped when
/// the path ends in `.gz`. The parser round-trips this output exactly.
pub fn generate(path: &Path, lines: u64, metric: &str) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer: Box<dyn Write> = match is_compressed(path) {
        true => Box::new(GzEncoder::new(file, Compression::default())),
        false => Box::new(BufWriter::new(file)),
    };

    let mut rng = rand::rng();
    let mut epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(| elapsed | elapsed.as_secs() as i64)
        .unwrap_or(0);

    for _ in 0..lines {
        let value: i64 = rng.random_range(0..=100);
        writeln!(writer, "{epoch},{metric},{value}")?;
        epoch += 1;
    }
    writer.flush()
    // GzEncoder writes its trailer when the boxed writer drops.
}

#[cfg(test)]
mod tests {
    use crate::parse::{LineParser, SplitParser};
    use crate::source::LineSource;

    use super::*;

    #[test]
    fn output_round_trips_through_the_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.log");
        generate(&path, 25, "cpu_usage").unwrap();

        let mut previous_epoch = None;
        let mut count = 0;
        for line in LineSource::open(&path).unwrap().byte_lines() {
            let line = line.unwrap();
            let record = SplitParser.parse(&line).unwrap();
            assert_eq!(record.metric, b"cpu_usage");
            let value: i64 = crate::parse::parse_int(record.value).unwrap();
            assert!((0..=100).contains(&value));
            if let Some(previous) = previous_epoch {
                assert_eq!(record.timestamp, previous + 1);
            }
            previous_epoch = Some(record.timestamp);
            count += 1;
        }
        assert_eq!(count, 25);
    }

    #[test]
    fn compressed_output_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generated.log.gz");
        generate(&path, 10, "cpu_usage").unwrap();

        let lines: Vec<_> = LineSource::open(&path)
            .unwrap()
            .byte_lines()
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(lines.len(), 10);
        assert!(SplitParser.parse(&lines[0]).is_ok());
    }
}

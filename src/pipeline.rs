//! The scan itself: drive lines through parse, filter and aggregation,
//! sequentially or chunked across rayon workers.

use std::fs::File;
use std::io;
use std::path::Path;

use bstr::ByteSlice;
use memmap2::MmapOptions;
use rayon::prelude::*;
use tracing::debug;

use crate::aggregate::Aggregator;
use crate::error::Error;
use crate::extract::extract;
use crate::parse::{LineParser, ParseFailure};
use crate::source::{is_compressed, LineSource};

const NEWLINE: u8 = 10;

/// Per-run accounting: every line read lands in exactly one of matched,
/// filtered, malformed or invalid_value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub lines_read: u64,
    pub matched: u64,
    pub filtered: u64,
    pub malformed: u64,
    pub invalid_value: u64,
    pub aggregator: Aggregator,
}

impl RunReport {
    fn new(distribution: bool) -> Self {
        let aggregator = match distribution {
            true => Aggregator::with_distribution(),
            false => Aggregator::new(),
        };
        Self {
            lines_read: 0,
            matched: 0,
            filtered: 0,
            malformed: 0,
            invalid_value: 0,
            aggregator,
        }
    }

    pub fn rejected(&self) -> u64 {
        self.malformed + self.invalid_value
    }

    fn merge(&mut self, other: Self) {
        self.lines_read += other.lines_read;
        self.matched += other.matched;
        self.filtered += other.filtered;
        self.malformed += other.malformed;
        self.invalid_value += other.invalid_value;
        self.aggregator.merge(other.aggregator);
    }
}

/// One logical owner of the running state. Per-line failures are counted and
/// recovered here; only stream-level I/O aborts a run, and even then the
/// partially-filled report stays queryable through `finish`.
pub struct Pipeline<P> {
    parser: P,
    target: Vec<u8>,
    report: RunReport,
}

impl<P: LineParser> Pipeline<P> {
    pub fn new(parser: P, target: &[u8], distribution: bool) -> Self {
        Self {
            parser,
            target: target.to_vec(),
            report: RunReport::new(distribution),
        }
    }

    pub fn process(&mut self, line: &[u8]) {
        self.report.lines_read += 1;
        let outcome = self
            .parser
            .parse(line)
            .and_then(| record | extract(&record, &self.target));
        match outcome {
            Ok(Some(value)) => {
                self.report.matched += 1;
                self.report.aggregator.observe(value);
            }
            Ok(None) => self.report.filtered += 1,
            Err(ParseFailure::MalformedLine) => self.report.malformed += 1,
            Err(ParseFailure::InvalidValue) => self.report.invalid_value += 1,
        }
    }

    /// Consume lines until the source is exhausted or fails. On failure the
    /// pipeline keeps everything folded in so far.
    pub fn consume<I>(&mut self, lines: I) -> Result<(), Error>
    where
        I: Iterator<Item = io::Result<Vec<u8>>>,
    {
        for line in lines {
            let line = line?;
            self.process(&line);
        }
        Ok(())
    }

    pub fn finish(self) -> RunReport {
        self.report
    }
}

/// Sequential scan of one file, compressed or plain. Matches the source
/// semantics exactly: one line at a time, in order, no buffering beyond the
/// current line.
pub fn run<P: LineParser>(
    path: &Path,
    parser: P,
    target: &[u8],
    distribution: bool,
) -> Result<RunReport, Error> {
    let mut pipeline = Pipeline::new(parser, target, distribution);
    pipeline.consume(LineSource::open(path)?.byte_lines())?;
    Ok(pipeline.finish())
}

/// Chunked parallel scan of a plain text file: boundaries snapped to
/// newlines, one private pipeline per chunk, reports merged at the end.
/// Produces a report identical to `run` on the same input.
///
/// Compressed input has no random access and is rejected; use `run`.
pub fn run_parallel<P: LineParser + Sync>(
    path: &Path,
    parser: &P,
    target: &[u8],
    distribution: bool,
    chunks: Option<usize>,
) -> Result<RunReport, Error> {
    if is_compressed(path) {
        return Err(Error::CompressedInput(path.to_path_buf()));
    }

    let chunks = chunks
        .or_else(|| std::thread::available_parallelism().map(usize::from).ok())
        .unwrap_or(1)
        .max(1);

    let file = File::open(path)?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };
    let boundaries = find_chunk_boundaries(&mmap, chunks);
    debug!(chunks = boundaries.len(), bytes = mmap.len(), "parallel scan");

    let report = boundaries
        .par_iter()
        .map(| &(start, end) | {
            let mut pipeline = Pipeline::new(parser, target, distribution);
            for line in mmap[start..end].lines() {
                pipeline.process(line);
            }
            pipeline.finish()
        })
        .reduce_with(| mut left, right | {
            left.merge(right);
            left
        });

    Ok(report.unwrap_or_else(|| RunReport::new(distribution)))
}

/// Split `data` into up to `parts` contiguous ranges, each starting just
/// after a newline so no line straddles two chunks.
fn find_chunk_boundaries(data: &[u8], parts: usize) -> Vec<(usize, usize)> {
    let size = data.len();
    let chunk_size = (size / parts).max(1);

    let mut starts: Vec<usize> = Vec::with_capacity(parts);
    starts.push(0);
    for _ in 1..parts {
        let probe = starts[starts.len() - 1] + chunk_size;
        if probe >= size {
            break;
        }
        match data[probe..].iter().position(| &byte | byte == NEWLINE) {
            Some(offset) => starts.push(probe + offset + 1),
            None => break,
        }
    }
    starts.dedup();

    let mut ends: Vec<usize> = starts[1..].to_vec();
    ends.push(size);
    starts.into_iter().zip(ends).collect()
}

use std::path::PathBuf;

use crate::aggregate::EmptyAggregate;

/// Stream-level failures. Per-line problems are counted and skipped by the
/// pipeline instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parallel scan needs a plain text file, `{0}` is compressed")]
    CompressedInput(PathBuf),
    #[error(transparent)]
    EmptyAggregate(#[from] EmptyAggregate),
}

//! Lines-of-code history per category, rebuilt from `git log --numstat`.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod commands;
pub mod engine;
pub mod error;
pub mod export;
pub mod git;
pub mod model;
pub mod parse;
pub mod range;
pub mod series;
pub mod taxonomy;
pub mod util;

pub use aggregate::{Aggregator, RunStats, Snapshot};
pub use error::{LocError, Result};
pub use model::{CommitBoundary, FileDelta, LogRecord, XCoord};
pub use parse::{parse_line, BoundaryFormat, LineRecord, RecordReader};
pub use series::{StepSeries, StepSeriesBuilder, Terminal};
pub use taxonomy::{Category, PatternSpec, Taxonomy};

use crate::aggregate::RunStats;
use crate::series::StepSeries;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

pub const SCHEMA_VERSION: u32 = 1;

/// Horizontal position of a commit: its commit time when the log carries
/// one, otherwise its position in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum XCoord {
    Ordinal(u64),
    Time(DateTime<Utc>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Ordinal,
    Time,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Axis::Ordinal => "ordinal",
            Axis::Time => "time",
        }
    }
}

impl XCoord {
    pub fn axis(&self) -> Axis {
        match self {
            XCoord::Ordinal(_) => Axis::Ordinal,
            XCoord::Time(_) => Axis::Time,
        }
    }

    pub fn to_csv_field(&self) -> String {
        match self {
            XCoord::Ordinal(n) => n.to_string(),
            XCoord::Time(t) => t.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

// Coordinates on different axes are unordered.
impl PartialOrd for XCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (XCoord::Ordinal(a), XCoord::Ordinal(b)) => Some(a.cmp(b)),
            (XCoord::Time(a), XCoord::Time(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for XCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XCoord::Ordinal(n) => write!(f, "#{n}"),
            XCoord::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitBoundary {
    pub ordinal: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub id: Option<String>,
}

impl CommitBoundary {
    pub fn x(&self) -> XCoord {
        match self.timestamp {
            Some(t) => XCoord::Time(t),
            None => XCoord::Ordinal(self.ordinal),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDelta {
    pub added: u64,
    pub removed: u64,
    pub path: String,
}

impl FileDelta {
    /// `None` when the difference does not fit in an `i64`.
    pub fn net(&self) -> Option<i64> {
        let added = i64::try_from(self.added).ok()?;
        let removed = i64::try_from(self.removed).ok()?;
        added.checked_sub(removed)
    }
}

/// One meaningful entry of a numstat log, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Boundary(CommitBoundary),
    Delta(FileDelta),
    /// Numstat reported `-` for both counts; the magnitude is unknown.
    Binary { path: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySeries {
    pub taxonomy: String,
    pub stats: RunStats,
    pub series: StepSeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub branch: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub taxonomies: Vec<TaxonomySeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub lines: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySummary {
    pub taxonomy: String,
    pub stats: RunStats,
    pub first_commit: Option<XCoord>,
    pub last_commit: Option<XCoord>,
    pub totals: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub branch: Option<String>,
    pub taxonomies: Vec<TaxonomySummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub year: i32,
    pub series: StepSeries,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySeasons {
    pub taxonomy: String,
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub source: String,
    pub branch: Option<String>,
    pub taxonomies: Vec<TaxonomySeasons>,
}

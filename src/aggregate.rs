use crate::error::{LocError, Result};
use crate::model::{CommitBoundary, FileDelta, LogRecord, XCoord};
use crate::series::{StepSeriesBuilder, Terminal};
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    names: Arc<[String]>,
    values: Vec<i64>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<i64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn total(&self) -> i64 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub commits: u64,
    pub matched: u64,
    pub unmatched: u64,
    pub binary: u64,
}

#[derive(Debug, Clone)]
pub struct AggregateRun {
    pub taxonomy: String,
    pub totals: Snapshot,
    pub stats: RunStats,
    pub first: Option<XCoord>,
    pub last: Option<XCoord>,
    pub builder: StepSeriesBuilder,
}

impl AggregateRun {
    pub fn into_series(mut self, terminal: Terminal) -> Result<crate::series::StepSeries> {
        self.builder.terminate(terminal)?;
        Ok(self.builder.build())
    }
}

pub struct Aggregator<'t> {
    taxonomy: &'t Taxonomy,
    names: Arc<[String]>,
    counters: Vec<i64>,
    open: Option<CommitBoundary>,
    started: bool,
    first: Option<XCoord>,
    last: Option<XCoord>,
    builder: StepSeriesBuilder,
    stats: RunStats,
}

impl<'t> Aggregator<'t> {
    pub fn new(taxonomy: &'t Taxonomy) -> Self {
        let names = taxonomy.category_names();
        Self {
            taxonomy,
            counters: vec![0; names.len()],
            builder: StepSeriesBuilder::new(names.clone()),
            names: names.into(),
            open: None,
            started: false,
            first: None,
            last: None,
            stats: RunStats::default(),
        }
    }

    /// Start a category at `value` instead of zero.
    pub fn seed(&mut self, name: &str, value: i64) -> Result<()> {
        if self.started {
            return Err(LocError::SeedAfterStart);
        }
        let i = self
            .names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| LocError::UnknownCategory(name.to_string()))?;
        self.counters[i] = value;
        self.builder.set_baseline(&self.counters);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            names: Arc::clone(&self.names),
            values: self.counters.clone(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn begin_commit(&mut self, boundary: CommitBoundary) {
        self.close_commit();
        self.started = true;
        self.stats.commits += 1;
        let x = boundary.x();
        self.first.get_or_insert(x);
        self.last = Some(x);
        self.open = Some(boundary);
    }

    fn require_open(&self, path: &str) -> Result<()> {
        if self.open.is_none() {
            return Err(LocError::DeltaBeforeBoundary {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    pub fn apply(&mut self, delta: &FileDelta) -> Result<()> {
        self.require_open(&delta.path)?;
        match self.taxonomy.classify_index(&delta.path) {
            Some(i) => {
                let overflow = || LocError::CountOverflow {
                    path: delta.path.clone(),
                };
                let net = delta.net().ok_or_else(overflow)?;
                self.counters[i] = self.counters[i].checked_add(net).ok_or_else(overflow)?;
                self.stats.matched += 1;
            }
            None => self.stats.unmatched += 1,
        }
        Ok(())
    }

    pub fn apply_binary(&mut self, path: &str) -> Result<()> {
        self.require_open(path)?;
        self.stats.binary += 1;
        Ok(())
    }

    pub fn close_commit(&mut self) {
        if let Some(boundary) = self.open.take() {
            let snapshot = self.snapshot();
            self.builder.record(boundary.x(), &snapshot);
        }
    }

    pub fn feed(&mut self, record: &LogRecord) -> Result<()> {
        match record {
            LogRecord::Boundary(b) => {
                self.begin_commit(b.clone());
                Ok(())
            }
            LogRecord::Delta(d) => self.apply(d),
            LogRecord::Binary { path } => self.apply_binary(path),
        }
    }

    pub fn finish(mut self) -> AggregateRun {
        self.close_commit();
        log::debug!(
            "{}: {} commits, {} matched, {} unmatched, {} binary",
            self.taxonomy.name(),
            self.stats.commits,
            self.stats.matched,
            self.stats.unmatched,
            self.stats.binary
        );
        AggregateRun {
            taxonomy: self.taxonomy.name().to_string(),
            totals: self.snapshot(),
            stats: self.stats,
            first: self.first,
            last: self.last,
            builder: self.builder,
        }
    }
}

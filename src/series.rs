use crate::aggregate::Snapshot;
use crate::error::{LocError, Result};
use crate::model::{Axis, Season, XCoord};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub name: String,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSeries {
    pub x: Vec<XCoord>,
    pub categories: Vec<CategorySeries>,
}

/// How the right edge of a series is closed once the log is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminal {
    /// Leave the series ending at the last commit pair.
    Open,
    /// Repeat the last pair at the last commit's x.
    #[default]
    Last,
    /// Repeat the last pair on January 1st of the year after the last commit.
    /// Ordinal series fall back to [`Terminal::Last`].
    YearEnd,
    At(XCoord),
}

fn check_axis(bound: &XCoord, axis: Axis) -> Result<()> {
    if bound.axis() != axis {
        return Err(LocError::AxisMismatch {
            bound: bound.axis().as_str(),
            axis: axis.as_str(),
        });
    }
    Ok(())
}

fn within(x: &XCoord, start: &XCoord, end: &XCoord) -> bool {
    start <= x && x <= end
}

pub fn year_start(year: i32) -> Option<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}

impl StepSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn axis(&self) -> Option<Axis> {
        self.x.first().map(XCoord::axis)
    }

    pub fn values(&self, name: &str) -> Option<&[i64]> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn last_values(&self) -> Option<Vec<i64>> {
        if self.is_empty() {
            return None;
        }
        Some(
            self.categories
                .iter()
                .filter_map(|c| c.values.last().copied())
                .collect(),
        )
    }

    fn empty_like(&self) -> StepSeries {
        StepSeries {
            x: Vec::new(),
            categories: self
                .categories
                .iter()
                .map(|c| CategorySeries {
                    name: c.name.clone(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    fn push_pair(&mut self, x: XCoord, values: &[i64]) {
        self.x.push(x);
        self.x.push(x);
        for (c, v) in self.categories.iter_mut().zip(values) {
            c.values.push(*v);
            c.values.push(*v);
        }
    }

    /// Keep only the samples with `start <= x <= end`.
    pub fn restrict(&self, start: XCoord, end: XCoord) -> Result<StepSeries> {
        let Some(axis) = self.axis() else {
            return Ok(self.empty_like());
        };
        check_axis(&start, axis)?;
        check_axis(&end, axis)?;

        let keep: Vec<usize> = (0..self.x.len())
            .filter(|&i| within(&self.x[i], &start, &end))
            .collect();

        Ok(StepSeries {
            x: keep.iter().map(|&i| self.x[i]).collect(),
            categories: self
                .categories
                .iter()
                .map(|c| CategorySeries {
                    name: c.name.clone(),
                    values: keep.iter().map(|&i| c.values[i]).collect(),
                })
                .collect(),
        })
    }

    /// [`restrict`](Self::restrict) plus edge padding, so the window has a
    /// defined value across its whole width.
    pub fn window(&self, start: XCoord, end: XCoord) -> Result<StepSeries> {
        let inner = self.restrict(start, end)?;
        if self.is_empty() {
            return Ok(inner);
        }

        // Value in force at `start`: the last earlier sample, or the
        // baseline when the window opens before the first commit.
        let before = self.x.iter().rposition(|x| x < &start).unwrap_or(0);
        let carried: Vec<i64> = self.categories.iter().map(|c| c.values[before]).collect();

        let mut out = self.empty_like();
        if inner.x.first() != Some(&start) {
            out.push_pair(start, &carried);
        }
        out.x.extend(inner.x.iter().copied());
        for (o, c) in out.categories.iter_mut().zip(&inner.categories) {
            o.values.extend(c.values.iter().copied());
        }

        if inner.x.last() != Some(&end) {
            let last = inner.last_values().unwrap_or(carried);
            out.push_pair(end, &last);
        }
        Ok(out)
    }

    pub fn year_span(&self) -> Option<(i32, i32)> {
        let years: Vec<i32> = self
            .x
            .iter()
            .filter_map(|x| match x {
                XCoord::Time(t) => Some(t.year()),
                XCoord::Ordinal(_) => None,
            })
            .collect();
        Some((*years.iter().min()?, *years.iter().max()?))
    }

    /// One window per calendar year, `[Jan 1 y, Jan 1 y+1]`.
    pub fn seasons(&self, first_year: i32, last_year: i32) -> Result<Vec<Season>> {
        if let Some(Axis::Ordinal) = self.axis() {
            return Err(LocError::AxisMismatch {
                bound: Axis::Time.as_str(),
                axis: Axis::Ordinal.as_str(),
            });
        }
        let mut seasons = Vec::new();
        for year in first_year..=last_year {
            let (Some(start), Some(end)) = (year_start(year), year_start(year + 1)) else {
                return Err(LocError::InvalidDate(format!("year {year} out of range")));
            };
            seasons.push(Season {
                year,
                series: self.window(XCoord::Time(start), XCoord::Time(end))?,
            });
        }
        Ok(seasons)
    }
}

#[derive(Debug, Clone)]
pub struct StepSeriesBuilder {
    names: Vec<String>,
    x: Vec<XCoord>,
    values: Vec<Vec<i64>>,
    last: Vec<i64>,
}

impl StepSeriesBuilder {
    pub fn new(names: Vec<String>) -> Self {
        let n = names.len();
        Self {
            names,
            x: Vec::new(),
            values: vec![Vec::new(); n],
            last: vec![0; n],
        }
    }

    /// Replace the "before" values used by the first recorded commit.
    pub fn set_baseline(&mut self, baseline: &[i64]) {
        if self.x.is_empty() {
            self.last = baseline.to_vec();
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn last_x(&self) -> Option<XCoord> {
        self.x.last().copied()
    }

    pub fn record(&mut self, x: XCoord, snapshot: &Snapshot) {
        self.x.push(x);
        self.x.push(x);
        for ((column, last), now) in self
            .values
            .iter_mut()
            .zip(self.last.iter_mut())
            .zip(snapshot.values())
        {
            column.push(*last);
            column.push(*now);
            *last = *now;
        }
    }

    fn push_terminal(&mut self, x: XCoord) {
        self.x.push(x);
        self.x.push(x);
        for (column, last) in self.values.iter_mut().zip(&self.last) {
            column.push(*last);
            column.push(*last);
        }
    }

    /// Append a closing pair at the last recorded x. No-op when nothing has
    /// been recorded.
    pub fn finalize(&mut self) {
        if let Some(x) = self.last_x() {
            self.push_terminal(x);
        }
    }

    /// Append the closing pair at `x` instead of the last recorded x.
    pub fn finalize_at(&mut self, x: XCoord) -> Result<()> {
        let Some(last) = self.last_x() else {
            return Ok(());
        };
        check_axis(&x, last.axis())?;
        if x < last {
            return Err(LocError::FinalizeBeforeEnd);
        }
        self.push_terminal(x);
        Ok(())
    }

    pub fn terminate(&mut self, terminal: Terminal) -> Result<()> {
        match terminal {
            Terminal::Open => Ok(()),
            Terminal::Last => {
                self.finalize();
                Ok(())
            }
            Terminal::YearEnd => match self.last_x() {
                Some(XCoord::Time(t)) => {
                    let edge = year_start(t.year() + 1).ok_or_else(|| {
                        LocError::InvalidDate(format!("no year after {}", t.year()))
                    })?;
                    self.finalize_at(XCoord::Time(edge))
                }
                _ => {
                    self.finalize();
                    Ok(())
                }
            },
            Terminal::At(x) => self.finalize_at(x),
        }
    }

    pub fn build(self) -> StepSeries {
        StepSeries {
            x: self.x,
            categories: self
                .names
                .into_iter()
                .zip(self.values)
                .map(|(name, values)| CategorySeries { name, values })
                .collect(),
        }
    }
}

use crate::error::{LocError, Result};
use crate::git::GitRepo;
use crate::model::{Axis, LogRecord, XCoord};
use crate::util::{looks_like_commit_id, parse_absolute_date, parse_date};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangePoint {
    Time(DateTime<Utc>),
    /// A commit named by id or ref. `time` is known when a repository
    /// resolved it.
    Commit {
        id: String,
        time: Option<DateTime<Utc>>,
    },
}

impl RangePoint {
    /// Calendar dates come first. Hex strings are commit ids before they are
    /// durations, so `1234d` names a commit unless the repository has none.
    /// Without a repository, anything that is not a date is an id prefix.
    pub fn resolve(input: &str, repo: Option<&GitRepo>) -> Result<Self> {
        let input = input.trim();
        if let Some(t) = parse_absolute_date(input) {
            return Ok(RangePoint::Time(t));
        }
        if looks_like_commit_id(input) {
            return match Self::commit(input, repo) {
                Err(err) => parse_date(input).map(RangePoint::Time).ok_or(err),
                found => found,
            };
        }
        if let Some(t) = parse_date(input) {
            return Ok(RangePoint::Time(t));
        }
        Self::commit(input, repo)
    }

    fn commit(input: &str, repo: Option<&GitRepo>) -> Result<Self> {
        match repo {
            Some(repo) => {
                let (id, time) = repo.resolve_commit(input)?;
                Ok(RangePoint::Commit {
                    id,
                    time: Some(time),
                })
            }
            None => Ok(RangePoint::Commit {
                id: input.to_ascii_lowercase(),
                time: None,
            }),
        }
    }

    /// Place this point on `axis`, looking commit ids up in `records` when
    /// the point carries no usable time.
    pub fn to_x(&self, axis: Axis, records: &[LogRecord]) -> Result<XCoord> {
        match (self, axis) {
            (RangePoint::Time(t), Axis::Time) => Ok(XCoord::Time(*t)),
            (RangePoint::Time(_), Axis::Ordinal) => Err(LocError::AxisMismatch {
                bound: Axis::Time.as_str(),
                axis: Axis::Ordinal.as_str(),
            }),
            (RangePoint::Commit { time: Some(t), .. }, Axis::Time) => Ok(XCoord::Time(*t)),
            (RangePoint::Commit { id, .. }, _) => {
                let boundary = records
                    .iter()
                    .find_map(|r| match r {
                        LogRecord::Boundary(b)
                            if b.id.as_deref().is_some_and(|bid| bid.starts_with(id.as_str())) =>
                        {
                            Some(b)
                        }
                        _ => None,
                    })
                    .ok_or_else(|| {
                        LocError::Reference(format!("commit '{id}' does not appear in the log"))
                    })?;
                match axis {
                    Axis::Ordinal => Ok(XCoord::Ordinal(boundary.ordinal)),
                    Axis::Time => boundary.timestamp.map(XCoord::Time).ok_or_else(|| {
                        LocError::Reference(format!("commit '{id}' has no timestamp in the log"))
                    }),
                }
            }
        }
    }
}

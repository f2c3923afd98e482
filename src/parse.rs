use crate::error::Result;
use crate::model::{CommitBoundary, FileDelta, LogRecord};
use chrono::{DateTime, Utc};
use std::io::BufRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BoundaryFormat {
    /// `date 2014-05-03 12:00:00 -0400`, from `--format=date %ci`.
    #[default]
    Dated,
    /// `<commit id> <subject>`, from `--pretty=oneline`.
    Oneline,
}

impl BoundaryFormat {
    pub fn git_arg(self) -> &'static str {
        match self {
            BoundaryFormat::Dated => "--format=date %ci",
            BoundaryFormat::Oneline => "--pretty=oneline",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundaryFormat::Dated => "dated",
            BoundaryFormat::Oneline => "oneline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineRecord {
    Boundary {
        timestamp: Option<DateTime<Utc>>,
        id: Option<String>,
    },
    Delta(FileDelta),
    Binary {
        path: String,
    },
    Unrecognized,
}

pub fn parse_line(line: &str, format: BoundaryFormat) -> LineRecord {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return LineRecord::Unrecognized;
    }

    match format {
        BoundaryFormat::Dated => {
            if let Some(rest) = line.strip_prefix("date ") {
                return match parse_commit_date(rest.trim()) {
                    Some(timestamp) => LineRecord::Boundary {
                        timestamp: Some(timestamp),
                        id: None,
                    },
                    None => LineRecord::Unrecognized,
                };
            }
            parse_numstat(line).unwrap_or(LineRecord::Unrecognized)
        }
        BoundaryFormat::Oneline => {
            let head = first_field(line);
            // A full-length id can never be a numstat count, so check it first.
            if is_hex_id(head) && (head.len() == 40 || head.len() == 64) {
                return oneline_boundary(head);
            }
            if let Some(record) = parse_numstat(line) {
                return record;
            }
            if is_hex_id(head) && head.len() >= 7 {
                return oneline_boundary(head);
            }
            LineRecord::Unrecognized
        }
    }
}

fn oneline_boundary(id: &str) -> LineRecord {
    LineRecord::Boundary {
        timestamp: None,
        id: Some(id.to_ascii_lowercase()),
    }
}

fn first_field(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or("")
}

fn is_hex_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn parse_commit_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn split_field(s: &str) -> Option<(&str, &str)> {
    let end = s.find(char::is_whitespace)?;
    Some((&s[..end], s[end..].trim_start()))
}

fn parse_count(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|&n| n <= i64::MAX as u64)
}

fn parse_numstat(line: &str) -> Option<LineRecord> {
    let (added, rest) = split_field(line)?;
    let (removed, path) = split_field(rest)?;
    if path.is_empty() {
        return None;
    }
    let path = normalize_rename(path);

    if added == "-" && removed == "-" {
        return Some(LineRecord::Binary { path });
    }

    Some(LineRecord::Delta(FileDelta {
        added: parse_count(added)?,
        removed: parse_count(removed)?,
        path,
    }))
}

/// Reduce numstat rename notation to the destination path.
///
/// `src/{old => new}/f.rs` becomes `src/new/f.rs` and `a.rs => b.rs`
/// becomes `b.rs`.
pub fn normalize_rename(path: &str) -> String {
    if let (Some(open), Some(close)) = (path.find('{'), path.rfind('}')) {
        if open < close {
            let inner = &path[open + 1..close];
            if let Some((_, new)) = inner.split_once("=>") {
                let joined = format!("{}{}{}", &path[..open], new.trim(), &path[close + 1..]);
                return joined.replace("//", "/").trim_start_matches('/').to_string();
            }
        }
    }
    match path.split_once(" => ") {
        Some((_, new)) => new.to_string(),
        None => path.to_string(),
    }
}

pub struct RecordReader<I> {
    lines: I,
    format: BoundaryFormat,
    next_ordinal: u64,
    skipped: u64,
}

impl<I> RecordReader<I> {
    pub fn new(lines: I, format: BoundaryFormat) -> Self {
        Self {
            lines,
            format,
            next_ordinal: 0,
            skipped: 0,
        }
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<I, S> Iterator for RecordReader<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = LogRecord;

    fn next(&mut self) -> Option<LogRecord> {
        for line in self.lines.by_ref() {
            match parse_line(line.as_ref(), self.format) {
                LineRecord::Boundary { timestamp, id } => {
                    let ordinal = self.next_ordinal;
                    self.next_ordinal += 1;
                    return Some(LogRecord::Boundary(CommitBoundary {
                        ordinal,
                        timestamp,
                        id,
                    }));
                }
                LineRecord::Delta(delta) => return Some(LogRecord::Delta(delta)),
                LineRecord::Binary { path } => return Some(LogRecord::Binary { path }),
                LineRecord::Unrecognized => {
                    let line = line.as_ref();
                    if !line.trim().is_empty() {
                        log::debug!("skipping unrecognized log line: {line}");
                    }
                    self.skipped += 1;
                }
            }
        }
        None
    }
}

pub fn read_records<R: BufRead>(reader: R, format: BoundaryFormat) -> Result<Vec<LogRecord>> {
    let lines = reader.lines().collect::<std::io::Result<Vec<String>>>()?;
    let mut records = RecordReader::new(lines.iter(), format);
    let out: Vec<LogRecord> = records.by_ref().collect();
    log::debug!(
        "parsed {} records from {} lines ({} skipped)",
        out.len(),
        lines.len(),
        records.skipped()
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn dated_boundary_converts_to_utc() {
        let rec = parse_line("date 2014-05-03 12:00:00 -0400", BoundaryFormat::Dated);
        assert_eq!(
            rec,
            LineRecord::Boundary {
                timestamp: Some(Utc.with_ymd_and_hms(2014, 5, 3, 16, 0, 0).unwrap()),
                id: None,
            }
        );
    }

    #[test]
    fn dated_boundary_with_garbage_date_is_noise() {
        assert_eq!(
            parse_line("date yesterday", BoundaryFormat::Dated),
            LineRecord::Unrecognized
        );
    }

    #[test]
    fn numstat_row() {
        assert_eq!(
            parse_line("10\t3\tsrc/main.cc", BoundaryFormat::Dated),
            LineRecord::Delta(FileDelta {
                added: 10,
                removed: 3,
                path: "src/main.cc".to_string(),
            })
        );
    }

    #[test]
    fn binary_row_is_not_zero_delta() {
        assert_eq!(
            parse_line("-\t-\tlogo.png", BoundaryFormat::Dated),
            LineRecord::Binary {
                path: "logo.png".to_string()
            }
        );
    }

    #[test]
    fn half_binary_row_is_noise() {
        assert_eq!(
            parse_line("-\t4\tweird", BoundaryFormat::Dated),
            LineRecord::Unrecognized
        );
    }

    #[test]
    fn oneline_boundary_keeps_id() {
        let id = "0123456789abcdef0123456789abcdef01234567";
        let rec = parse_line(&format!("{id} Fix build"), BoundaryFormat::Oneline);
        assert_eq!(
            rec,
            LineRecord::Boundary {
                timestamp: None,
                id: Some(id.to_string()),
            }
        );
    }

    #[test]
    fn large_numeric_count_is_not_abbreviated_id() {
        assert_eq!(
            parse_line("1234567\t0\tgen/table.inc", BoundaryFormat::Oneline),
            LineRecord::Delta(FileDelta {
                added: 1234567,
                removed: 0,
                path: "gen/table.inc".to_string(),
            })
        );
    }

    #[test]
    fn count_beyond_i64_is_noise() {
        assert_eq!(
            parse_line("18446744073709551615\t0\ta.cc", BoundaryFormat::Dated),
            LineRecord::Unrecognized
        );
        assert_eq!(
            parse_line("9223372036854775807\t0\ta.cc", BoundaryFormat::Dated),
            LineRecord::Delta(FileDelta {
                added: 9223372036854775807,
                removed: 0,
                path: "a.cc".to_string(),
            })
        );
    }

    #[test]
    fn renames_resolve_to_destination() {
        assert_eq!(normalize_rename("src/{old => new}/f.rs"), "src/new/f.rs");
        assert_eq!(normalize_rename("src/{ => sub}/f.rs"), "src/sub/f.rs");
        assert_eq!(normalize_rename("src/{sub => }/f.rs"), "src/f.rs");
        assert_eq!(normalize_rename("a.rs => b.rs"), "b.rs");
        assert_eq!(normalize_rename("plain/path.rs"), "plain/path.rs");
    }

    #[test]
    fn reader_numbers_boundaries_and_counts_noise() {
        let lines = [
            "date 2020-01-01 00:00:00 +0000",
            "",
            "1\t0\ta.py",
            "warning: something",
            "date 2020-01-02 00:00:00 +0000",
        ];
        let mut reader = RecordReader::new(lines.iter(), BoundaryFormat::Dated);
        let records: Vec<_> = reader.by_ref().collect();
        assert_eq!(records.len(), 3);
        match &records[2] {
            LogRecord::Boundary(b) => assert_eq!(b.ordinal, 1),
            other => panic!("expected boundary, got {other:?}"),
        }
        assert_eq!(reader.skipped(), 2);
    }
}

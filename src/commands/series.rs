use crate::cli::CommonArgs;
use crate::collect::{load_input, load_taxonomies, Input};
use crate::engine::build_series;
use crate::export::{print_series_table, write_csv};
use crate::model::{SeriesOutput, TaxonomySeries, SCHEMA_VERSION};
use crate::range::RangePoint;
use crate::series::Terminal;
use anyhow::{bail, Context};
use chrono::Utc;

pub struct SeriesOptions {
    pub from: Option<String>,
    pub to: Option<String>,
    pub extend_to_year_end: bool,
    pub open: bool,
}

impl SeriesOptions {
    fn terminal(&self) -> Terminal {
        if self.open {
            Terminal::Open
        } else if self.extend_to_year_end {
            Terminal::YearEnd
        } else {
            Terminal::Last
        }
    }
}

pub fn exec(common: CommonArgs, opts: SeriesOptions, json: bool, ndjson: bool, csv: bool) -> anyhow::Result<()> {
    let input = load_input(&common)?;
    let taxonomies = load_taxonomies(&common)?;

    let mut entries = build_series(&input.records, &taxonomies, opts.terminal())
        .context("Failed to aggregate commit log")?;

    if opts.from.is_some() || opts.to.is_some() {
        entries = restrict_entries(entries, &input, &opts).context("Failed to apply range")?;
    }

    if json {
        output_json(&entries, &input, &opts)?;
    } else if ndjson {
        output_ndjson(&entries)?;
    } else if csv {
        output_csv(&entries)?;
    } else {
        for entry in &entries {
            print_series_table(entry);
        }
    }

    Ok(())
}

fn restrict_entries(
    entries: Vec<TaxonomySeries>,
    input: &Input,
    opts: &SeriesOptions,
) -> anyhow::Result<Vec<TaxonomySeries>> {
    let from = opts
        .from
        .as_deref()
        .map(|s| RangePoint::resolve(s, input.repo.as_ref()))
        .transpose()?;
    let to = opts
        .to
        .as_deref()
        .map(|s| RangePoint::resolve(s, input.repo.as_ref()))
        .transpose()?;

    entries
        .into_iter()
        .map(|mut entry| -> anyhow::Result<TaxonomySeries> {
            let (Some(axis), Some(first), Some(last)) = (
                entry.series.axis(),
                entry.series.x.first().copied(),
                entry.series.x.last().copied(),
            ) else {
                return Ok(entry);
            };
            let start = match &from {
                Some(p) => p.to_x(axis, &input.records)?,
                None => first,
            };
            let end = match &to {
                Some(p) => p.to_x(axis, &input.records)?,
                None => last,
            };
            log::info!("{}: restricting to {start} .. {end}", entry.taxonomy);
            entry.series = entry.series.restrict(start, end)?;
            Ok(entry)
        })
        .collect()
}

fn output_json(entries: &[TaxonomySeries], input: &Input, opts: &SeriesOptions) -> anyhow::Result<()> {
    let output = SeriesOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        source: input.source.clone(),
        branch: input.branch.clone(),
        from: opts.from.clone(),
        to: opts.to.clone(),
        taxonomies: entries.to_vec(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn output_ndjson(entries: &[TaxonomySeries]) -> anyhow::Result<()> {
    for entry in entries {
        println!("{}", serde_json::to_string(entry)?);
    }
    Ok(())
}

fn output_csv(entries: &[TaxonomySeries]) -> anyhow::Result<()> {
    let [entry] = entries else {
        bail!("CSV output needs exactly one taxonomy, got {}", entries.len());
    };
    let stdout = std::io::stdout();
    write_csv(&mut stdout.lock(), &entry.series)?;
    Ok(())
}

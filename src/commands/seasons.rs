use crate::cli::CommonArgs;
use crate::collect::{load_input, load_taxonomies};
use crate::engine::build_series;
use crate::model::{SeasonsOutput, TaxonomySeasons, SCHEMA_VERSION};
use crate::series::{StepSeries, Terminal};
use anyhow::{bail, Context};
use chrono::Utc;
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct SeasonLine<'a> {
    taxonomy: &'a str,
    year: i32,
    series: &'a StepSeries,
}

pub fn exec(
    common: CommonArgs,
    first_year: Option<i32>,
    last_year: Option<i32>,
    json: bool,
    ndjson: bool,
) -> anyhow::Result<()> {
    let input = load_input(&common)?;
    let taxonomies = load_taxonomies(&common)?;

    // Windows pad their own right edge.
    let entries = build_series(&input.records, &taxonomies, Terminal::Open)
        .context("Failed to aggregate commit log")?;

    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some((lo, hi)) = entry.series.year_span() else {
            if entry.series.is_empty() {
                out.push(TaxonomySeasons {
                    taxonomy: entry.taxonomy,
                    seasons: Vec::new(),
                });
                continue;
            }
            bail!("Seasons need commit dates; use --format dated");
        };
        let first = first_year.unwrap_or(lo);
        let last = last_year.unwrap_or(hi);
        if first > last {
            bail!("First year {first} is after last year {last}");
        }
        let seasons = entry
            .series
            .seasons(first, last)
            .with_context(|| format!("Failed to build seasons for {}", entry.taxonomy))?;
        out.push(TaxonomySeasons {
            taxonomy: entry.taxonomy,
            seasons,
        });
    }

    if json {
        let output = SeasonsOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            source: input.source,
            branch: input.branch,
            taxonomies: out,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if ndjson {
        for t in &out {
            for season in &t.seasons {
                let line = SeasonLine {
                    taxonomy: &t.taxonomy,
                    year: season.year,
                    series: &season.series,
                };
                println!("{}", serde_json::to_string(&line)?);
            }
        }
    } else {
        output_table(&out);
    }
    Ok(())
}

fn output_table(taxonomies: &[TaxonomySeasons]) {
    for t in taxonomies {
        println!("{} {}", style("Taxonomy").bold(), style(&t.taxonomy).cyan());
        let Some(first) = t.seasons.first() else {
            println!("No data to display\n");
            continue;
        };
        let names = first.series.category_names();

        let mut header = format!("{:<6}", style("Year").bold());
        for n in &names {
            header.push_str(&format!(" {:>12} {:>9}", style(n).bold(), style("Δ").bold()));
        }
        println!("{header}");
        println!("{}", "─".repeat(6 + 23 * names.len()));

        for season in &t.seasons {
            let mut line = format!("{:<6}", season.year);
            for name in &names {
                let values = season.series.values(name).unwrap_or(&[]);
                match (values.first(), values.last()) {
                    (Some(start), Some(end)) => {
                        let change = end - start;
                        let change = if change >= 0 {
                            style(format!("+{change}")).green()
                        } else {
                            style(change.to_string()).red()
                        };
                        line.push_str(&format!(" {:>12} {:>9}", end, change));
                    }
                    _ => line.push_str(&format!(" {:>12} {:>9}", "-", "")),
                }
            }
            println!("{line}");
        }
        println!();
    }
}

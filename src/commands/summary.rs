use crate::cli::CommonArgs;
use crate::collect::{load_input, load_taxonomies};
use crate::engine::fold_all;
use crate::model::{CategoryTotal, SummaryOutput, TaxonomySummary, SCHEMA_VERSION};
use anyhow::Context;
use chrono::Utc;
use console::style;

pub fn exec(common: CommonArgs, json: bool) -> anyhow::Result<()> {
    let input = load_input(&common)?;
    let taxonomies = load_taxonomies(&common)?;

    let summaries: Vec<TaxonomySummary> = fold_all(&input.records, &taxonomies)
        .context("Failed to aggregate commit log")?
        .into_iter()
        .map(|run| TaxonomySummary {
            totals: run
                .totals
                .iter()
                .map(|(name, lines)| CategoryTotal {
                    name: name.to_string(),
                    lines,
                })
                .collect(),
            taxonomy: run.taxonomy,
            stats: run.stats,
            first_commit: run.first,
            last_commit: run.last,
        })
        .collect();

    if json {
        let output = SummaryOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            source: input.source,
            branch: input.branch,
            taxonomies: summaries,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        output_table(&summaries);
    }
    Ok(())
}

fn output_table(summaries: &[TaxonomySummary]) {
    for s in summaries {
        println!("{} {}", style("Taxonomy").bold(), style(&s.taxonomy).cyan());
        if let (Some(first), Some(last)) = (&s.first_commit, &s.last_commit) {
            println!("Commits {} to {} ({})", style(first).dim(), style(last).dim(), s.stats.commits);
        }
        println!(
            "{:<30} {:>12} {:>8}",
            style("Category").bold(),
            style("Lines").bold(),
            style("Share").bold()
        );
        println!("{}", "─".repeat(52));

        let total: i64 = s.totals.iter().map(|t| t.lines).sum();
        for t in &s.totals {
            let share = if total > 0 {
                format!("{:.1}%", t.lines as f64 * 100.0 / total as f64)
            } else {
                "-".to_string()
            };
            println!("{:<30} {:>12} {:>8}", t.name, t.lines, share);
        }
        println!("{:<30} {:>12}", style("Total").bold(), style(total).green());
        if s.stats.unmatched > 0 {
            println!(
                "{} file changes matched no category",
                style(s.stats.unmatched).yellow()
            );
        }
        println!();
    }
}

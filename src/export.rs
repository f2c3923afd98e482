use crate::model::TaxonomySeries;
use crate::series::StepSeries;
use console::style;
use std::borrow::Cow;
use std::io::{self, Write};

const TABLE_ROWS: usize = 50;

fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn write_csv<W: Write>(out: &mut W, series: &StepSeries) -> io::Result<()> {
    let header: Vec<Cow<'_, str>> = std::iter::once(Cow::Borrowed("x"))
        .chain(series.categories.iter().map(|c| csv_field(&c.name)))
        .collect();
    writeln!(out, "{}", header.join(","))?;

    for (i, x) in series.x.iter().enumerate() {
        write!(out, "{}", x.to_csv_field())?;
        for c in &series.categories {
            write!(out, ",{}", c.values[i])?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn print_header(names: &[&str]) {
    let mut line = format!("{:<20}", style("Commit").bold());
    for n in names {
        line.push_str(&format!(" {:>12}", style(n).bold()));
    }
    println!("{line}");
    println!("{}", "─".repeat(20 + 13 * names.len()));
}

/// Counts after each commit, newest last. Only the latest rows are shown.
pub fn print_series_table(entry: &TaxonomySeries) {
    let series = &entry.series;
    println!(
        "{} {}",
        style("Taxonomy").bold(),
        style(&entry.taxonomy).cyan()
    );

    if series.is_empty() {
        println!("No data to display\n");
        return;
    }

    let names = series.category_names();
    print_header(&names);

    // Second sample of every pair holds the post-commit counts.
    let rows: Vec<usize> = (1..series.len()).step_by(2).collect();
    let skip = rows.len().saturating_sub(TABLE_ROWS);
    if skip > 0 {
        println!("... {skip} earlier rows omitted");
    }
    for &i in &rows[skip..] {
        let mut line = format!("{:<20}", series.x[i].to_string());
        for c in &series.categories {
            line.push_str(&format!(" {:>12}", c.values[i]));
        }
        println!("{line}");
    }
    println!(
        "\n{} commits, {} matched deltas, {} unmatched, {} binary\n",
        style(entry.stats.commits).cyan(),
        style(entry.stats.matched).green(),
        style(entry.stats.unmatched).yellow(),
        style(entry.stats.binary).dim()
    );
}

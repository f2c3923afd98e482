use crate::aggregate::{AggregateRun, Aggregator};
use crate::error::Result;
use crate::model::{LogRecord, TaxonomySeries};
use crate::series::Terminal;
use crate::taxonomy::Taxonomy;
use rayon::prelude::*;

pub fn fold(records: &[LogRecord], taxonomy: &Taxonomy) -> Result<AggregateRun> {
    let mut agg = Aggregator::new(taxonomy);
    for record in records {
        agg.feed(record)?;
    }
    Ok(agg.finish())
}

/// Results keep the taxonomy order.
pub fn fold_all(records: &[LogRecord], taxonomies: &[Taxonomy]) -> Result<Vec<AggregateRun>> {
    taxonomies
        .par_iter()
        .map(|taxonomy| fold(records, taxonomy))
        .collect()
}

pub fn build_series(
    records: &[LogRecord],
    taxonomies: &[Taxonomy],
    terminal: Terminal,
) -> Result<Vec<TaxonomySeries>> {
    fold_all(records, taxonomies)?
        .into_iter()
        .map(|run| {
            let taxonomy = run.taxonomy.clone();
            let stats = run.stats.clone();
            Ok(TaxonomySeries {
                taxonomy,
                stats,
                series: run.into_series(terminal)?,
            })
        })
        .collect()
}

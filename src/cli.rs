use crate::parse::BoundaryFormat;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lochist")]
#[command(about = "Per-category lines-of-code history of a git repository, as stacked step series")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to git repository")]
    pub repo: Option<PathBuf>,

    #[arg(long, default_value = "HEAD", help = "Branch or ref whose history is read")]
    pub branch: String,

    #[arg(long, help = "Read a numstat log from this file instead of running git ('-' for stdin)")]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = BoundaryFormat::Dated, help = "Commit header format of the log")]
    pub format: BoundaryFormat,

    #[arg(long = "taxonomy", help = "JSON taxonomy file (repeatable)")]
    pub taxonomy_files: Vec<PathBuf>,

    #[arg(long = "builtin", help = "Builtin taxonomy: languages, source (repeatable)")]
    pub builtins: Vec<String>,

    #[arg(long, help = "Path to cache directory")]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Neither read nor write the log cache")]
    pub no_cache: bool,

    #[arg(long, default_value = "warn", help = "Log level (error, warn, info, debug, trace)")]
    pub log_level: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Step series per taxonomy
    Series {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Output as CSV (single taxonomy)")]
        csv: bool,

        #[arg(long, help = "Start of the displayed range (date, ref, or commit id)")]
        from: Option<String>,

        #[arg(long, help = "End of the displayed range (date, ref, or commit id)")]
        to: Option<String>,

        #[arg(long, help = "Close the series on January 1st after the last commit")]
        extend_to_year_end: bool,

        #[arg(long, help = "Do not append the closing sample pair")]
        open: bool,
    },
    /// Final line counts per category
    Summary {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// One window per calendar year
    Seasons {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "First year (default: year of the first commit)")]
        first_year: Option<i32>,

        #[arg(long, help = "Last year (default: year of the last commit)")]
        last_year: Option<i32>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Series { json, ndjson, csv, from, to, extend_to_year_end, open } => {
                let opts = crate::commands::series::SeriesOptions {
                    from,
                    to,
                    extend_to_year_end,
                    open,
                };
                crate::commands::series::exec(self.common, opts, json, ndjson, csv)
            }
            Commands::Summary { json } => crate::commands::summary::exec(self.common, json),
            Commands::Seasons { json, ndjson, first_year, last_year } => {
                crate::commands::seasons::exec(self.common, first_year, last_year, json, ndjson)
            }
        }
    }
}

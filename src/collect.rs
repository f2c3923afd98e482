use crate::cache::Cache;
use crate::cli::CommonArgs;
use crate::git::GitRepo;
use crate::model::LogRecord;
use crate::parse::read_records;
use crate::taxonomy::{self, Taxonomy};
use crate::util::short_id;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufReader};

pub struct Input {
    pub source: String,
    pub branch: Option<String>,
    pub repo: Option<GitRepo>,
    pub records: Vec<LogRecord>,
}

pub fn load_input(common: &CommonArgs) -> anyhow::Result<Input> {
    if let Some(log_file) = &common.log_file {
        // A repository is only needed here to resolve refs in range bounds.
        let repo = match &common.repo {
            Some(path) => Some(GitRepo::open(Some(path)).context("Failed to open git repository")?),
            None => None,
        };
        let records = if log_file.as_os_str() == "-" {
            read_records(io::stdin().lock(), common.format)
        } else {
            let file = File::open(log_file)
                .with_context(|| format!("Failed to open log file {}", log_file.display()))?;
            read_records(BufReader::new(file), common.format)
        }
        .context("Failed to read log")?;

        return Ok(Input {
            source: log_file.display().to_string(),
            branch: None,
            repo,
            records,
        });
    }

    let repo = GitRepo::open(common.repo.as_ref()).context("Failed to open git repository")?;
    let records = fetch_records(&repo, common)?;
    Ok(Input {
        source: repo.path().to_string_lossy().to_string(),
        branch: Some(common.branch.clone()),
        repo: Some(repo),
        records,
    })
}

fn fetch_records(repo: &GitRepo, common: &CommonArgs) -> anyhow::Result<Vec<LogRecord>> {
    let head = repo
        .head_id(&common.branch)
        .with_context(|| format!("Failed to resolve branch {}", common.branch))?;

    let mut cache = if common.no_cache {
        None
    } else {
        Some(Cache::new(common.cache.as_deref(), repo.path()).context("Failed to initialize cache")?)
    };

    if let Some(cache) = &cache {
        if let Some(records) = cache
            .load(&common.branch, common.format, &head)
            .context("Failed to read cached log")?
        {
            log::info!(
                "using cached log for {} at {}",
                common.branch,
                short_id(&head)
            );
            return Ok(records);
        }
    }

    let text = repo
        .numstat_log(&common.branch, common.format)
        .context("Failed to collect commit log from repository")?;
    let records = read_records(text.as_bytes(), common.format).context("Failed to parse commit log")?;

    if let Some(cache) = cache.as_mut() {
        cache
            .store(&common.branch, common.format, &head, &records)
            .context("Failed to store log in cache")?;
    }

    Ok(records)
}

pub fn load_taxonomies(common: &CommonArgs) -> anyhow::Result<Vec<Taxonomy>> {
    let mut taxonomies = Vec::new();

    for name in &common.builtins {
        taxonomies.push(taxonomy::builtin(name)?);
    }
    for path in &common.taxonomy_files {
        let loaded = taxonomy::load_file(path)
            .with_context(|| format!("Failed to load taxonomy file {}", path.display()))?;
        taxonomies.extend(loaded);
    }

    if taxonomies.is_empty() {
        taxonomies.push(taxonomy::builtin("languages")?);
    }

    log::debug!(
        "taxonomies: {}",
        taxonomies
            .iter()
            .map(|t| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(taxonomies)
}

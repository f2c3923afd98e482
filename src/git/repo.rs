use crate::error::{LocError, Result};
use crate::parse::BoundaryFormat;
use chrono::{DateTime, Utc};
use gix::{discover, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at `path`, or current dir if `None`
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let repo_path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or(std::env::current_dir()?);

        let repo = discover(&repo_path)?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full id and commit time of the commit `spec` names.
    pub fn resolve_commit(&self, spec: &str) -> Result<(String, DateTime<Utc>)> {
        let id = self
            .repo
            .rev_parse_single(spec)
            .map_err(|e| LocError::Reference(format!("'{spec}': {e}")))?;

        let commit = id
            .object()?
            .try_into_commit()
            .map_err(|_| LocError::Reference(format!("not a commit: {spec}")))?;

        let secs = commit.time()?.seconds;
        let time = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or_else(|| LocError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

        Ok((id.detach().to_string(), time))
    }

    pub fn head_id(&self, branch: &str) -> Result<String> {
        self.resolve_commit(branch).map(|(id, _)| id)
    }

    // Rename limit goes through `-c`; the repository config is not touched.
    pub fn numstat_log(&self, branch: &str, format: BoundaryFormat) -> Result<String> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Reading history of {branch}..."));
        pb.enable_steady_tick(Duration::from_millis(120));

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.path)
            .args(["-c", "diff.renameLimit=999999", "--no-pager", "log"])
            .args(["--numstat", "--no-renames", "--reverse"])
            .arg(format.git_arg())
            .arg(branch)
            .arg("--")
            .output()?;

        if !output.status.success() {
            pb.finish_and_clear();
            return Err(LocError::GitLog(format!(
                "status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        pb.finish_with_message("History collected");
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        log::info!(
            "git log for {branch} returned {} lines",
            text.lines().count()
        );
        Ok(text)
    }
}

//! Multi-archive extraction.
//!
//! An [`ExtractionBatch`] owns one job per archive and runs them in input
//! order through the gateway. A failing job is recorded and the next one
//! still runs; the batch ends with an aggregate [`BatchOutcome`].
//!
//! ```text
//! Planned ──run──▶ Running ──▶ Completed
//!    │
//!    └── Cancel policy: stays Planned, no job runs
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use strum::{Display, EnumIter};
use tracing::{debug, info, warn};

use crate::config::DEFAULT_EXTRACT_DIR;
use crate::error::InputError;
use crate::file::{has_entries, name_of, stem_of};
use crate::gateway::{ArchiveEntry, ArchiverGateway, CommandRunner, Request};

/// Where the contents of several archives land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum PlacementMode {
    /// Each archive into its own subdirectory named after it.
    #[default]
    #[strum(to_string = "Separate folders (each archive in its own folder)")]
    Separate,
    #[strum(to_string = "Combined (all archives to same destination)")]
    Combined,
}

/// How files already present at the destination are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter)]
pub enum ConflictPolicy {
    /// Keep existing files; resumes an interrupted extraction.
    #[default]
    #[strum(to_string = "Skip existing files (resume extraction)")]
    SkipExisting,
    #[strum(to_string = "Overwrite all files (restart extraction)")]
    OverwriteAll,
    /// Let the archiver prompt for every conflict.
    #[strum(to_string = "Ask for each file conflict")]
    AskPerFile,
    #[strum(to_string = "Cancel extraction")]
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Planned,
    Running,
    Completed,
}

/// One archive and the directory it is extracted into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    archive: PathBuf,
    destination: PathBuf,
    status: JobStatus,
}

impl ExtractionJob {
    #[inline]
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    #[inline]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[inline]
    pub fn status(&self) -> &JobStatus {
        &self.status
    }

    pub fn name(&self) -> String {
        name_of(&self.archive)
    }
}

/// A failed job and why it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub archive: PathBuf,
    pub reason: String,
}

/// Aggregate result of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded { succeeded: Vec<PathBuf> },
    PartialSuccess { succeeded: Vec<PathBuf>, failed: Vec<JobFailure> },
    AllFailed { failed: Vec<JobFailure> },
    /// The conflict policy was Cancel; nothing ran.
    Cancelled,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> &[PathBuf] {
        match self {
            Self::AllSucceeded { succeeded } | Self::PartialSuccess { succeeded, .. } => succeeded,
            Self::AllFailed { .. } | Self::Cancelled => &[],
        }
    }

    pub fn failed(&self) -> &[JobFailure] {
        match self {
            Self::PartialSuccess { failed, .. } | Self::AllFailed { failed } => failed,
            Self::AllSucceeded { .. } | Self::Cancelled => &[],
        }
    }
}

/// Progress notifications emitted while a batch runs.
#[derive(Debug)]
pub enum JobEvent<'a> {
    Started { index: usize, total: usize, job: &'a ExtractionJob },
    Finished { index: usize, total: usize, job: &'a ExtractionJob },
}

/// Ordered extraction jobs sharing one destination and one conflict policy.
#[derive(Debug)]
pub struct ExtractionBatch {
    destination: PathBuf,
    placement: PlacementMode,
    conflict: Option<ConflictPolicy>,
    entries: Vec<String>,
    jobs: Vec<ExtractionJob>,
    state: BatchState,
}

impl ExtractionBatch {
    /// Plans one job per archive.
    ///
    /// In [`PlacementMode::Separate`] with more than one archive, each job
    /// targets `destination/<archive stem>`; otherwise all jobs share
    /// `destination`.
    pub fn new(archives: Vec<PathBuf>, destination: PathBuf, placement: PlacementMode) -> Result<Self, InputError> {
        if archives.is_empty() {
            return Err(InputError::Empty);
        }

        let separate = placement == PlacementMode::Separate && archives.len() > 1;
        let jobs = archives
            .into_iter()
            .map(|archive| {
                let dest = if separate { destination.join(stem_of(&archive)) } else { destination.clone() };
                ExtractionJob { archive, destination: dest, status: JobStatus::Pending }
            })
            .collect();

        Ok(Self { destination, placement, conflict: None, entries: Vec::new(), jobs, state: BatchState::Planned })
    }

    /// Restricts extraction to the given entry paths.
    ///
    /// Only a batch of exactly one archive supports selection.
    pub fn with_entries(mut self, entries: Vec<String>) -> Result<Self, InputError> {
        if !entries.is_empty() && self.jobs.len() != 1 {
            return Err(InputError::Selection("selective extraction needs exactly one archive".into()));
        }
        self.entries = entries;
        Ok(self)
    }

    #[inline]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    #[inline]
    pub fn placement(&self) -> PlacementMode {
        self.placement
    }

    #[inline]
    pub fn jobs(&self) -> &[ExtractionJob] {
        &self.jobs
    }

    #[inline]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[inline]
    pub fn state(&self) -> BatchState {
        self.state
    }

    #[inline]
    pub fn conflict_policy(&self) -> Option<ConflictPolicy> {
        self.conflict
    }

    /// Creates the shared destination directory.
    pub fn create_destination(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.destination)
    }

    /// Whether the destination already holds entries and a policy must be chosen.
    pub fn needs_conflict_policy(&self) -> bool {
        has_entries(&self.destination)
    }

    /// Sets the policy applied uniformly to every job.
    pub fn set_conflict_policy(&mut self, policy: ConflictPolicy) {
        self.conflict = Some(policy);
    }

    /// Runs every job in order and aggregates the results.
    ///
    /// Job failures, including failure to create a per-archive directory,
    /// are collected rather than returned.
    pub fn run<R: CommandRunner>(&mut self, gateway: &mut ArchiverGateway<R>, mut on_event: impl FnMut(&JobEvent<'_>)) -> BatchOutcome {
        if self.conflict == Some(ConflictPolicy::Cancel) {
            info!("extraction cancelled before start");
            return BatchOutcome::Cancelled;
        }

        self.state = BatchState::Running;
        let total = self.jobs.len();
        let separate = self.placement == PlacementMode::Separate && total > 1;

        for index in 0..total {
            on_event(&JobEvent::Started { index, total, job: &self.jobs[index] });

            let status = self.run_job(index, separate, gateway);
            debug!(archive = %self.jobs[index].archive.display(), ?status, "job finished");
            self.jobs[index].status = status;

            on_event(&JobEvent::Finished { index, total, job: &self.jobs[index] });
        }

        self.state = BatchState::Completed;
        self.outcome()
    }

    fn run_job<R: CommandRunner>(&self, index: usize, separate: bool, gateway: &mut ArchiverGateway<R>) -> JobStatus {
        let job = &self.jobs[index];

        if separate && let Err(e) = fs::create_dir_all(&job.destination) {
            warn!(dir = %job.destination.display(), error = %e, "cannot create directory for archive");
            return JobStatus::Failed(format!("cannot create {}: {e}", job.destination.display()));
        }

        let request = Request::Extract { archive: &job.archive, destination: &job.destination, conflict: self.conflict, entries: &self.entries };
        match gateway.invoke(&request) {
            Ok(_) => JobStatus::Succeeded,
            Err(e) => JobStatus::Failed(e.to_string()),
        }
    }

    /// Aggregate over the current job statuses.
    pub fn outcome(&self) -> BatchOutcome {
        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for job in &self.jobs {
            match &job.status {
                JobStatus::Succeeded => succeeded.push(job.archive.clone()),
                JobStatus::Failed(reason) => failed.push(JobFailure { archive: job.archive.clone(), reason: reason.clone() }),
                JobStatus::Pending => {}
            }
        }

        match (succeeded.is_empty(), failed.is_empty()) {
            (_, true) => BatchOutcome::AllSucceeded { succeeded },
            (true, false) => BatchOutcome::AllFailed { failed },
            (false, false) => BatchOutcome::PartialSuccess { succeeded, failed },
        }
    }
}

/// `extracted` next to the first archive.
pub fn default_destination(archives: &[PathBuf]) -> PathBuf {
    let base = archives.first().and_then(|a| a.parent()).filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    base.join(DEFAULT_EXTRACT_DIR)
}

/// Parses an entry selection into sorted, 0-based indices.
///
/// Accepts `all`, or whitespace-separated 1-based numbers and inclusive
/// ranges such as `1 3 5-7`. Numbers outside `1..=count` are ignored.
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, InputError> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }

    if input.is_empty() {
        return Err(InputError::Selection("nothing selected".into()));
    }

    let invalid = |token: &str| InputError::Selection(format!("'{token}' is not a number or range"));
    let mut picked = BTreeSet::new();

    for token in input.split_whitespace() {
        match token.split_once('-') {
            Some((start, end)) => {
                let start: usize = start.parse().map_err(|_| invalid(token))?;
                let end: usize = end.parse().map_err(|_| invalid(token))?;
                picked.extend(start..=end.min(count));
            }
            None => {
                picked.insert(token.parse::<usize>().map_err(|_| invalid(token))?);
            }
        }
    }

    let indices: Vec<usize> = picked.into_iter().filter(|n| (1..=count).contains(n)).map(|n| n - 1).collect();
    if indices.is_empty() {
        return Err(InputError::Selection("no valid entry numbers".into()));
    }

    Ok(indices)
}

/// Entry paths at the given indices.
pub fn select_entries(entries: &[ArchiveEntry], indices: &[usize]) -> Vec<String> {
    indices.iter().filter_map(|&i| entries.get(i)).map(|entry| entry.path.clone()).collect()
}

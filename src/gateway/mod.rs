//! Boundary to the external 7-Zip executable.
//!
//! - [`args`]: Argument lists for every request
//! - [`listing`]: Parser for the technical listing
//!
//! The gateway never interprets archiver output except for the technical
//! listing; everything else is passed straight through to the terminal.

pub mod args;
pub mod listing;

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

pub use args::{Request, conflict_switches, redacted};
pub use listing::{ArchiveEntry, parse_technical_listing};

use crate::config::{ARCHIVER_PATH_NAMES, ARCHIVER_SEARCH_PATHS, BUNDLED_ARCHIVER_NAME};
use crate::error::ToolError;
use crate::planner::OperationPlan;
use crate::secret::Secret;

/// Exit status and, when captured, standard output of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitResult {
    /// Exit code; -1 when the process was ended by a signal.
    pub code: i32,
    pub stdout: Option<String>,
}

impl ExitResult {
    #[inline]
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs a program to completion.
pub trait CommandRunner {
    /// With `capture`, standard output is collected; otherwise all streams
    /// are inherited from this process.
    fn run(&mut self, program: &Path, args: &[OsString], capture: bool) -> io::Result<ExitResult>;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &mut T {
    fn run(&mut self, program: &Path, args: &[OsString], capture: bool) -> io::Result<ExitResult> {
        (**self).run(program, args, capture)
    }
}

/// [`CommandRunner`] spawning real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, program: &Path, args: &[OsString], capture: bool) -> io::Result<ExitResult> {
        let mut command = Command::new(program);
        command.args(args);

        if capture {
            let output = command.stdin(Stdio::null()).output()?;
            return Ok(ExitResult { code: output.status.code().unwrap_or(-1), stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()) });
        }

        let status = command.status()?;
        Ok(ExitResult { code: status.code().unwrap_or(-1), stdout: None })
    }
}

/// Invokes the archiver for planned requests.
pub struct ArchiverGateway<R = ProcessRunner> {
    program: PathBuf,
    runner: R,
}

impl ArchiverGateway<ProcessRunner> {
    /// Locates and verifies the archiver on this host.
    pub fn discover() -> Result<Self, ToolError> {
        Ok(Self::new(locate_archiver()?, ProcessRunner))
    }
}

impl<R: CommandRunner> ArchiverGateway<R> {
    pub fn new(program: impl Into<PathBuf>, runner: R) -> Self {
        Self { program: program.into(), runner }
    }

    #[inline]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Runs a request with the terminal attached.
    ///
    /// A non-zero exit becomes [`ToolError::Exit`] carrying the code verbatim.
    pub fn invoke(&mut self, request: &Request<'_>) -> Result<ExitResult, ToolError> {
        self.execute(request, false)
    }

    /// Creates the archive described by `plan`, consuming it.
    pub fn create(&mut self, plan: OperationPlan) -> Result<ExitResult, ToolError> {
        let result = self.invoke(&Request::Create(&plan));
        drop(plan);
        result
    }

    /// Reads the entries of an archive through the technical listing.
    pub fn list_entries(&mut self, archive: &Path, password: Option<&Secret>) -> Result<Vec<ArchiveEntry>, ToolError> {
        let result = self.execute(&Request::List { archive, technical: true, password }, true)?;
        Ok(result.stdout.as_deref().map(parse_technical_listing).unwrap_or_default())
    }

    fn execute(&mut self, request: &Request<'_>, capture: bool) -> Result<ExitResult, ToolError> {
        let action = request.action();
        let args = request.args();
        debug!(program = %self.program.display(), args = %redacted(&args), capture, "running archiver");

        let result = self.runner.run(&self.program, &args, capture).map_err(|source| ToolError::Spawn { path: self.program.clone(), source })?;

        if !result.success() {
            warn!(%action, code = result.code, "archiver reported failure");
            return Err(ToolError::Exit { action, code: result.code });
        }

        info!(%action, "archiver finished");
        Ok(result)
    }
}

/// Finds a working archiver executable.
///
/// Tries the bundled binary next to this executable, then the fixed
/// installation paths, then `PATH`. A candidate is accepted only if it can be
/// started.
pub fn locate_archiver() -> Result<PathBuf, ToolError> {
    let candidates = archiver_candidates();
    let searched = candidates.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ");

    first_working(candidates, verify_archiver).ok_or(ToolError::NotFound { searched })
}

/// Candidate executables in search order, without duplicates.
pub fn archiver_candidates() -> Vec<PathBuf> {
    let bundled = env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_ARCHIVER_NAME)));
    let fixed = ARCHIVER_SEARCH_PATHS.iter().map(PathBuf::from);
    let on_path = ARCHIVER_PATH_NAMES.iter().filter_map(|name| which::which(name).ok());

    let mut candidates: Vec<PathBuf> = Vec::new();
    for path in bundled.into_iter().chain(fixed).chain(on_path) {
        if !candidates.contains(&path) {
            candidates.push(path);
        }
    }
    candidates
}

/// First existing candidate that passes `verify`.
pub fn first_working(candidates: impl IntoIterator<Item = PathBuf>, verify: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    candidates.into_iter().filter(|path| path.is_file()).find(|path| {
        let ok = verify(path.as_path());
        if !ok {
            warn!(path = %path.display(), "archiver candidate could not be started");
        }
        ok
    })
}

/// Starts the executable once without arguments; any exit code counts.
fn verify_archiver(path: &Path) -> bool {
    Command::new(path).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null()).status().is_ok()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::types::Action;

    #[derive(Default)]
    struct FakeRunner {
        codes: Vec<i32>,
        stdout: Option<String>,
        calls: Vec<(Vec<String>, bool)>,
    }

    impl CommandRunner for FakeRunner {
        fn run(&mut self, _program: &Path, args: &[OsString], capture: bool) -> io::Result<ExitResult> {
            self.calls.push((args.iter().map(|a| a.to_string_lossy().into_owned()).collect(), capture));
            let code = if self.codes.is_empty() { 0 } else { self.codes.remove(0) };
            Ok(ExitResult { code, stdout: if capture { self.stdout.clone() } else { None } })
        }
    }

    struct BrokenRunner;

    impl CommandRunner for BrokenRunner {
        fn run(&mut self, _program: &Path, _args: &[OsString], _capture: bool) -> io::Result<ExitResult> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    #[test]
    fn test_nonzero_exit_is_reported_with_code() {
        let mut gateway = ArchiverGateway::new("/bin/7zz", FakeRunner { codes: vec![2], ..FakeRunner::default() });
        let archive = PathBuf::from("/x/a.7z");

        let err = gateway.invoke(&Request::Test { archive: &archive }).unwrap_err();
        assert!(matches!(err, ToolError::Exit { action: Action::Test, code: 2 }));
    }

    #[test]
    fn test_signal_exit_maps_to_minus_one() {
        let mut gateway = ArchiverGateway::new("/bin/7zz", FakeRunner { codes: vec![-1], ..FakeRunner::default() });
        let archive = PathBuf::from("/x/a.7z");

        let err = gateway.invoke(&Request::Info { archive: &archive }).unwrap_err();
        assert_eq!(err.exit_code(), Some(-1));
    }

    #[test]
    fn test_spawn_failure() {
        let mut gateway = ArchiverGateway::new("/missing/7zz", BrokenRunner);
        let archive = PathBuf::from("/x/a.7z");

        let err = gateway.invoke(&Request::Test { archive: &archive }).unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
        assert_eq!(err.exit_code(), None);
    }

    #[test]
    fn test_list_entries_captures_and_parses() {
        let runner = FakeRunner { stdout: Some("----------\nPath = a.txt\nSize = 3\nFolder = -\n".into()), ..FakeRunner::default() };
        let mut gateway = ArchiverGateway::new("/bin/7zz", runner);

        let entries = gateway.list_entries(Path::new("/x/a.7z"), None).unwrap();
        assert_eq!(entries, vec![ArchiveEntry { path: "a.txt".into(), size: 3, is_folder: false }]);
        assert_eq!(gateway.runner.calls, vec![(vec!["l".to_owned(), "-slt".into(), "/x/a.7z".into()], true)]);
    }

    #[test]
    fn test_list_entries_retries_with_password() {
        let runner = FakeRunner { codes: vec![2, 0], stdout: Some("----------\nPath = secret.txt\nSize = 9\n".into()), ..FakeRunner::default() };
        let mut gateway = ArchiverGateway::new("/bin/7zz", runner);
        let archive = Path::new("/x/locked.7z");

        assert!(matches!(gateway.list_entries(archive, None), Err(ToolError::Exit { action: Action::List, code: 2 })));

        let password = Secret::new("hunter22");
        let entries = gateway.list_entries(archive, Some(&password)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(gateway.runner.calls[1].0, ["l", "-slt", "/x/locked.7z", "-phunter22"]);
    }

    #[test]
    fn test_first_working_skips_missing_and_unverified() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken");
        let good = dir.path().join("good");
        fs::write(&broken, b"").unwrap();
        fs::write(&good, b"").unwrap();

        let candidates = vec![dir.path().join("absent"), broken.clone(), good.clone()];
        assert_eq!(first_working(candidates, |p| p == good), Some(good.clone()));
        assert_eq!(first_working(vec![broken], |_| false), None);
    }

    #[test]
    fn test_candidates_start_with_fixed_order() {
        let candidates = archiver_candidates();
        let fixed: Vec<PathBuf> = ARCHIVER_SEARCH_PATHS.iter().map(PathBuf::from).collect();
        let positions: Vec<usize> = fixed.iter().filter_map(|p| candidates.iter().position(|c| c == p)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(candidates[0].ends_with(BUNDLED_ARCHIVER_NAME));
    }
}

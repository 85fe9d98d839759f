//! Archive creation planning.
//!
//! Turns a validated source set, the user's destination input and the saved
//! preferences into one immutable [`OperationPlan`]. Every point where the
//! interactive flow asks a question is a method of
//! [`PlanDecisions`], so the whole procedure runs unchanged against scripted
//! answers.

use std::fs;
use std::path::{Path, PathBuf};

use time::Date;
use tracing::{debug, info, warn};

use crate::config::{ACCEPTED_EXTENSIONS, DEFAULT_EXTENSION, SPLIT_THRESHOLD};
use crate::error::{ConfigurationError, InputError};
use crate::file::{PathCandidate, SourceSize, ValidatedFileSet, is_denied_output, normalize, stem_of};
use crate::naming::smart_archive_name;
use crate::preferences::Preferences;
use crate::resource::output_size_for;
use crate::secret::Secret;
use crate::types::{ArchiveFormat, CompressionLevel, CompressionPreset};

/// What to do when the planned archive already exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCollision {
    /// Replace it; the archiver is told to assume yes.
    Overwrite,
    /// Use this raw path instead; it must not exist either.
    Rename(String),
    Cancel,
}

/// Answers to the questions planning may need to ask.
pub trait PlanDecisions {
    /// File name for several sources written into a bare directory.
    ///
    /// An empty answer accepts `suggested`.
    fn archive_filename(&mut self, dir: &Path, suggested: &str) -> Result<String, InputError>;

    fn existing_output(&mut self, path: &Path) -> Result<OutputCollision, InputError>;

    /// Password for a format that can carry one; `None` for no password.
    fn password(&mut self, format: ArchiveFormat) -> Result<Option<Secret>, InputError>;

    /// Level picked from the preset menu when the preference is "ask".
    fn choose_level(&mut self) -> Result<CompressionLevel, InputError>;

    /// Extra confirmation before using level 9. Declining falls back to level 5.
    fn confirm_maximum(&mut self) -> bool;

    /// Split token for sources above the split threshold, or `None` for one volume.
    fn choose_split(&mut self, total_bytes: u64) -> Result<Option<String>, InputError>;
}

/// Immutable description of one archive creation.
#[derive(Debug)]
pub struct OperationPlan {
    sources: Vec<PathBuf>,
    output: PathBuf,
    format: ArchiveFormat,
    level: CompressionLevel,
    password: Option<Secret>,
    split: Option<String>,
    overwrite: bool,
    exclusions: Vec<String>,
}

impl OperationPlan {
    #[inline]
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    #[inline]
    pub fn output(&self) -> &Path {
        &self.output
    }

    #[inline]
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    #[inline]
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    #[inline]
    pub fn password(&self) -> Option<&Secret> {
        self.password.as_ref()
    }

    #[inline]
    pub fn split(&self) -> Option<&str> {
        self.split.as_deref()
    }

    #[inline]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    #[inline]
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }
}

/// Inputs of [`plan`] besides the preferences and the decision source.
#[derive(Debug)]
pub struct PlanRequest<'a> {
    pub files: &'a ValidatedFileSet,
    /// Raw destination as typed; empty accepts the suggestion.
    pub destination: &'a str,
    /// Size of the sources after exclusions.
    pub source: SourceSize,
    /// Password given up front; when absent and the format allows one, the decision source is asked.
    pub password: Option<Secret>,
    /// Level given up front, bypassing the saved preset.
    pub level: Option<CompressionLevel>,
    /// Split token given up front, bypassing the split question.
    pub split: Option<String>,
    /// Overwrite an existing output without asking.
    pub overwrite: bool,
    pub today: Date,
}

/// Side notes produced while completing the output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNote {
    CreatedDirectory(PathBuf),
    /// The typed directory could not be created; the archive goes to `dir` instead.
    FellBack { dir: PathBuf, reason: String },
}

/// A completed output path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPath {
    pub path: PathBuf,
    /// Directory of a typed path that already existed; worth remembering.
    pub remembered_dir: Option<PathBuf>,
    pub notes: Vec<OutputNote>,
}

/// Result of planning.
#[derive(Debug)]
pub struct Planned {
    pub plan: OperationPlan,
    /// Capabilities dropped because the format cannot carry them.
    pub warnings: Vec<ConfigurationError>,
    pub notes: Vec<OutputNote>,
    /// Directory the caller should store as the last output directory.
    pub remembered_dir: Option<PathBuf>,
    /// Rough archive size for the chosen level.
    pub estimated_output: u64,
}

/// Builds the plan for creating an archive.
pub fn plan<D: PlanDecisions + ?Sized>(request: PlanRequest<'_>, prefs: &Preferences, decisions: &mut D) -> Result<Planned, InputError> {
    let PlanRequest { files, destination, source, password, level, split, overwrite, today } = request;

    if files.is_empty() {
        return Err(InputError::Empty);
    }

    let mut output = complete_output_path(destination, files.paths(), prefs, today, decisions)?;
    let mut overwrite = overwrite;

    if output.path.exists() && !overwrite {
        match decisions.existing_output(&output.path)? {
            OutputCollision::Overwrite => overwrite = true,
            OutputCollision::Rename(raw) => {
                let renamed = complete_output_path(&raw, &[], prefs, today, decisions)?;
                if renamed.path.exists() {
                    return Err(InputError::OutputExists(renamed.path));
                }
                output = renamed;
            }
            OutputCollision::Cancel => return Err(InputError::Cancelled),
        }
    }

    let format = ArchiveFormat::from_path(&output.path);
    let mut warnings = Vec::new();

    let password = match password {
        _ if !format.supports_password() => {
            if password.is_some() {
                warn!(%format, "dropping password for format without encryption");
            }
            warnings.push(ConfigurationError::PasswordUnsupported(format));
            None
        }
        Some(secret) => Some(secret),
        None => decisions.password(format)?,
    };
    let password = password.filter(|secret| !secret.is_empty());

    if format.single_file_only() && (files.len() > 1 || files.iter().any(Path::is_dir)) {
        warn!(%format, sources = files.len(), "single-file format with several sources");
        warnings.push(ConfigurationError::SingleFileOnly(format));
    }

    let level = match level {
        Some(level) => confirm_if_maximum(level, decisions),
        None => resolve_level(prefs, decisions)?,
    };

    let split = match split {
        Some(token) => Some(validate_split_token(&token)?),
        None if source.bytes > SPLIT_THRESHOLD => decisions.choose_split(source.bytes)?.map(|token| validate_split_token(&token)).transpose()?,
        None => None,
    };

    debug!(output = %output.path.display(), %format, level = level.get(), ?split, overwrite, "archive planned");

    let plan = OperationPlan {
        sources: files.paths().to_vec(),
        output: output.path,
        format,
        level,
        password,
        split,
        overwrite,
        exclusions: prefs.exclude_patterns.clone(),
    };

    Ok(Planned { plan, warnings, notes: output.notes, remembered_dir: output.remembered_dir, estimated_output: output_size_for(source.bytes, level) })
}

/// Resolves the compression level from the saved preset.
pub fn resolve_level<D: PlanDecisions + ?Sized>(prefs: &Preferences, decisions: &mut D) -> Result<CompressionLevel, InputError> {
    let level = match prefs.compression_preset {
        CompressionPreset::Fast => CompressionLevel::FAST,
        CompressionPreset::Balanced => CompressionLevel::BALANCED,
        CompressionPreset::Maximum => CompressionLevel::MAXIMUM,
        CompressionPreset::Custom => prefs.custom_compression_level,
        CompressionPreset::Ask => decisions.choose_level()?,
    };

    Ok(confirm_if_maximum(level, decisions))
}

fn confirm_if_maximum<D: PlanDecisions + ?Sized>(level: CompressionLevel, decisions: &mut D) -> CompressionLevel {
    if level != CompressionLevel::MAXIMUM || decisions.confirm_maximum() {
        return level;
    }

    info!("level 9 declined, using balanced level");
    CompressionLevel::BALANCED
}

/// Turns the typed destination into a full archive path.
///
/// Empty input takes the suggested directory and the smart name. A bare
/// directory gets a file name; any other path gets the default extension
/// unless it already carries an accepted one. Missing parent directories
/// are created, falling back to the suggested directory when that fails.
pub fn complete_output_path<D: PlanDecisions + ?Sized>(raw: &str, sources: &[PathBuf], prefs: &Preferences, today: Date, decisions: &mut D) -> Result<OutputPath, InputError> {
    let default_dir = prefs.output_directory().to_path_buf();
    let raw = raw.trim();

    let (path, remembered_dir) = if raw.is_empty() {
        (default_dir.join(smart_archive_name(sources, today)), None)
    } else {
        let candidate = PathCandidate::new(raw);
        let typed = candidate.unescaped();

        let path = if typed.ends_with('/') || Path::new(typed).is_dir() {
            let base = Path::new(typed.trim_end_matches('/'));
            let base = if base.as_os_str().is_empty() { Path::new("/") } else { base };
            base.join(directory_filename(base, sources, decisions)?)
        } else {
            PathBuf::from(with_default_extension(typed))
        };

        let path = normalize(&path);
        let remembered = path.parent().filter(|dir| dir.exists()).map(Path::to_path_buf);
        (path, remembered)
    };

    let path = normalize(&path);
    if is_denied_output(&path) {
        return Err(InputError::DeniedLocation(path));
    }

    let mut output = OutputPath { path, remembered_dir, notes: Vec::new() };
    ensure_parent(&mut output, &default_dir);
    Ok(output)
}

fn directory_filename<D: PlanDecisions + ?Sized>(dir: &Path, sources: &[PathBuf], decisions: &mut D) -> Result<String, InputError> {
    if let [single] = sources {
        return Ok(format!("{}{DEFAULT_EXTENSION}", stem_of(single)));
    }

    let suggested = match sources.first() {
        Some(first) => format!("{}_archive{DEFAULT_EXTENSION}", stem_of(first)),
        None => format!("archive{DEFAULT_EXTENSION}"),
    };

    let answer = decisions.archive_filename(dir, &suggested)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() { suggested } else { with_default_extension(answer) })
}

fn ensure_parent(output: &mut OutputPath, default_dir: &Path) {
    let Some(parent) = output.path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return;
    };

    if parent.exists() {
        return;
    }

    match fs::create_dir_all(parent) {
        Ok(()) => output.notes.push(OutputNote::CreatedDirectory(parent.to_path_buf())),
        Err(e) => {
            warn!(dir = %parent.display(), error = %e, "cannot create output directory, using default location");
            let name = output.path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(format!("archive{DEFAULT_EXTENSION}")));
            output.notes.push(OutputNote::FellBack { dir: default_dir.to_path_buf(), reason: e.to_string() });
            output.path = default_dir.join(name);
        }
    }
}

/// Appends the default extension unless an accepted one is present.
pub fn with_default_extension(name: &str) -> String {
    if ACCEPTED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) { name.to_owned() } else { format!("{name}{DEFAULT_EXTENSION}") }
}

/// Checks a split size token: digits with an optional `b`, `k`, `m` or `g` unit.
///
/// The token is returned trimmed but otherwise verbatim.
pub fn validate_split_token(token: &str) -> Result<String, InputError> {
    let token = token.trim();
    let digits = token.strip_suffix(|c: char| matches!(c.to_ascii_lowercase(), 'b' | 'k' | 'm' | 'g')).unwrap_or(token);

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::SplitSize(token.to_owned()));
    }

    Ok(token.to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use tempfile::{TempDir, tempdir};
    use time::macros::date;

    use super::*;
    use crate::file::validate_existing;

    const DAY: Date = date!(2024 - 05 - 01);

    #[derive(Default)]
    struct Scripted {
        filenames: VecDeque<String>,
        collisions: VecDeque<OutputCollision>,
        password: Option<&'static str>,
        level: Option<CompressionLevel>,
        confirm_maximum: bool,
        split: Option<&'static str>,
        password_asked: bool,
        split_asked: bool,
    }

    impl PlanDecisions for Scripted {
        fn archive_filename(&mut self, _dir: &Path, suggested: &str) -> Result<String, InputError> {
            Ok(self.filenames.pop_front().unwrap_or_else(|| suggested.to_owned()))
        }

        fn existing_output(&mut self, _path: &Path) -> Result<OutputCollision, InputError> {
            Ok(self.collisions.pop_front().unwrap_or(OutputCollision::Cancel))
        }

        fn password(&mut self, _format: ArchiveFormat) -> Result<Option<Secret>, InputError> {
            self.password_asked = true;
            Ok(self.password.map(Secret::new))
        }

        fn choose_level(&mut self) -> Result<CompressionLevel, InputError> {
            self.level.ok_or(InputError::Cancelled)
        }

        fn confirm_maximum(&mut self) -> bool {
            self.confirm_maximum
        }

        fn choose_split(&mut self, _total_bytes: u64) -> Result<Option<String>, InputError> {
            self.split_asked = true;
            Ok(self.split.map(str::to_owned))
        }
    }

    struct Fixture {
        dir: TempDir,
        files: ValidatedFileSet,
        prefs: Preferences,
    }

    fn fixture(names: &[&str]) -> Fixture {
        let dir = tempdir().unwrap();
        let raw: Vec<String> = names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                fs::write(&path, b"data").unwrap();
                path.display().to_string()
            })
            .collect();

        let files = validate_existing(&raw).files;
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        let prefs = Preferences { default_output_directory: out.clone(), last_output_directory: Some(out), ..Preferences::default() };
        Fixture { dir, files, prefs }
    }

    fn request<'a>(fx: &'a Fixture, destination: &'a str) -> PlanRequest<'a> {
        PlanRequest { files: &fx.files, destination, source: SourceSize { bytes: 4, files: 1 }, password: None, level: None, split: None, overwrite: false, today: DAY }
    }

    #[test]
    fn test_password_dropped_for_tar() {
        let fx = fixture(&["a.txt"]);
        let dest = fx.dir.path().join("bundle.tar").display().to_string();
        let mut answers = Scripted::default();

        let planned = plan(PlanRequest { password: Some(Secret::new("hunter22")), ..request(&fx, &dest) }, &fx.prefs, &mut answers).unwrap();

        assert!(planned.plan.password().is_none());
        assert_eq!(planned.plan.format(), ArchiveFormat::Tar);
        assert_eq!(planned.warnings, vec![ConfigurationError::PasswordUnsupported(ArchiveFormat::Tar)]);
        assert!(!answers.password_asked);
    }

    #[test]
    fn test_gzip_drops_password_and_flags_multiple_sources() {
        let fx = fixture(&["a.txt", "b.txt"]);
        let dest = fx.dir.path().join("bundle.gz").display().to_string();
        let mut answers = Scripted::default();

        let planned = plan(PlanRequest { password: Some(Secret::new("hunter22")), ..request(&fx, &dest) }, &fx.prefs, &mut answers).unwrap();

        assert!(planned.plan.password().is_none());
        assert_eq!(planned.plan.format(), ArchiveFormat::Gzip);
        assert_eq!(planned.warnings, vec![ConfigurationError::PasswordUnsupported(ArchiveFormat::Gzip), ConfigurationError::SingleFileOnly(ArchiveFormat::Gzip)]);
        assert!(!answers.password_asked);
    }

    #[test]
    fn test_gzip_single_file_has_only_password_notice() {
        let fx = fixture(&["a.txt"]);
        let dest = fx.dir.path().join("a.txt.gz").display().to_string();

        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(planned.warnings, vec![ConfigurationError::PasswordUnsupported(ArchiveFormat::Gzip)]);
    }

    #[test]
    fn test_password_kept_for_seven_zip() {
        let fx = fixture(&["a.txt"]);
        let mut answers = Scripted { password: Some("hunter22"), ..Scripted::default() };

        let planned = plan(request(&fx, ""), &fx.prefs, &mut answers).unwrap();
        assert_eq!(planned.plan.password().map(Secret::expose_secret), Some("hunter22"));
        assert!(planned.warnings.is_empty());
    }

    #[test]
    fn test_empty_destination_uses_smart_name_in_default_dir() {
        let fx = fixture(&["a.txt", "b.txt"]);
        let planned = plan(request(&fx, ""), &fx.prefs, &mut Scripted::default()).unwrap();

        assert_eq!(planned.plan.output(), fx.prefs.output_directory().join("Documents_2024-05-01.7z"));
        assert_eq!(planned.remembered_dir, None);
        assert_eq!(planned.plan.sources().len(), 2);
        assert_eq!(planned.plan.exclusions(), fx.prefs.exclude_patterns.as_slice());
    }

    #[test]
    fn test_bare_directory_single_source() {
        let fx = fixture(&["report.bin"]);
        let dest = format!("{}/", fx.dir.path().display());
        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();

        assert_eq!(planned.plan.output(), fx.dir.path().join("report.7z"));
        assert_eq!(planned.remembered_dir.as_deref(), Some(fx.dir.path()));
    }

    #[test]
    fn test_bare_directory_multiple_sources_asks_for_name() {
        let fx = fixture(&["one.bin", "two.bin"]);
        let dest = fx.dir.path().display().to_string();

        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(planned.plan.output(), fx.dir.path().join("one_archive.7z"));

        let mut answers = Scripted { filenames: VecDeque::from(["custom".to_owned()]), ..Scripted::default() };
        let planned = plan(request(&fx, &dest), &fx.prefs, &mut answers).unwrap();
        assert_eq!(planned.plan.output(), fx.dir.path().join("custom.7z"));
    }

    #[test]
    fn test_extension_appended_and_parents_created() {
        let fx = fixture(&["a.bin"]);
        let dest = fx.dir.path().join("new").join("deeper").join("backup").display().to_string();

        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();
        let expected = fx.dir.path().join("new/deeper/backup.7z");
        assert_eq!(planned.plan.output(), expected);
        assert_eq!(planned.notes, vec![OutputNote::CreatedDirectory(fx.dir.path().join("new/deeper"))]);
        assert_eq!(planned.remembered_dir, None);

        assert_eq!(with_default_extension("x.zip"), "x.zip");
        assert_eq!(with_default_extension("x.tar.gz"), "x.tar.gz");
        assert_eq!(with_default_extension("x.rar"), "x.rar.7z");
    }

    #[test]
    fn test_uncreatable_parent_falls_back_to_default_dir() {
        let fx = fixture(&["a.bin"]);
        let blocker = fx.dir.path().join("blocker");
        fs::write(&blocker, b"file, not dir").unwrap();
        let dest = blocker.join("sub").join("out.7z").display().to_string();

        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(planned.plan.output(), fx.prefs.output_directory().join("out.7z"));
        assert!(matches!(&planned.notes[..], [OutputNote::FellBack { .. }]));
    }

    #[test]
    fn test_existing_output_collision() {
        let fx = fixture(&["a.bin"]);
        let existing = fx.dir.path().join("taken.7z");
        fs::write(&existing, b"old").unwrap();
        let dest = existing.display().to_string();

        let err = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap_err();
        assert_eq!(err, InputError::Cancelled);

        let mut answers = Scripted { collisions: VecDeque::from([OutputCollision::Overwrite]), ..Scripted::default() };
        let planned = plan(request(&fx, &dest), &fx.prefs, &mut answers).unwrap();
        assert!(planned.plan.overwrite());

        let mut answers = Scripted { collisions: VecDeque::from([OutputCollision::Rename(dest.clone())]), ..Scripted::default() };
        let err = plan(request(&fx, &dest), &fx.prefs, &mut answers).unwrap_err();
        assert_eq!(err, InputError::OutputExists(existing.clone()));

        let fresh = fx.dir.path().join("fresh").display().to_string();
        let mut answers = Scripted { collisions: VecDeque::from([OutputCollision::Rename(fresh)]), ..Scripted::default() };
        let planned = plan(request(&fx, &dest), &fx.prefs, &mut answers).unwrap();
        assert_eq!(planned.plan.output(), fx.dir.path().join("fresh.7z"));
        assert!(!planned.plan.overwrite());
    }

    #[test]
    fn test_denied_output_location() {
        let fx = fixture(&["a.bin"]);
        let err = plan(request(&fx, "/System/Library/out.7z"), &fx.prefs, &mut Scripted::default()).unwrap_err();
        assert_eq!(err, InputError::DeniedLocation(PathBuf::from("/System/Library/out.7z")));
    }

    #[test]
    fn test_denied_output_behind_parent_components() {
        let fx = fixture(&["a.bin"]);
        let err = plan(request(&fx, "/tmp/../System/out.7z"), &fx.prefs, &mut Scripted::default()).unwrap_err();
        assert_eq!(err, InputError::DeniedLocation(PathBuf::from("/System/out.7z")));
    }

    #[test]
    fn test_output_path_is_normalized() {
        let fx = fixture(&["a.bin"]);
        let typed = fx.dir.path().join("out").join("..").join("report.7z");
        let planned = plan(request(&fx, &typed.display().to_string()), &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(planned.plan.output(), normalize(&fx.dir.path().join("report.7z")));
    }

    #[test]
    fn test_level_resolution_by_preset() {
        let mut prefs = Preferences::default();
        let mut answers = Scripted::default();

        prefs.compression_preset = CompressionPreset::Fast;
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap(), CompressionLevel::FAST);

        prefs.compression_preset = CompressionPreset::Balanced;
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap(), CompressionLevel::BALANCED);

        prefs.compression_preset = CompressionPreset::Maximum;
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap(), CompressionLevel::BALANCED);
        answers.confirm_maximum = true;
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap(), CompressionLevel::MAXIMUM);

        prefs.compression_preset = CompressionPreset::Custom;
        prefs.custom_compression_level = CompressionLevel::new(7).unwrap();
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap().get(), 7);

        prefs.compression_preset = CompressionPreset::Ask;
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap_err(), InputError::Cancelled);
        answers.level = Some(CompressionLevel::STORE);
        assert_eq!(resolve_level(&prefs, &mut answers).unwrap(), CompressionLevel::STORE);
    }

    #[test]
    fn test_split_only_offered_above_threshold() {
        let fx = fixture(&["a.bin"]);

        let mut answers = Scripted { split: Some("4000m"), ..Scripted::default() };
        let planned = plan(request(&fx, ""), &fx.prefs, &mut answers).unwrap();
        assert!(!answers.split_asked);
        assert_eq!(planned.plan.split(), None);

        let big = SourceSize { bytes: SPLIT_THRESHOLD + 1, files: 1 };
        let mut answers = Scripted { split: Some("4000m"), ..Scripted::default() };
        let planned = plan(PlanRequest { source: big, ..request(&fx, "") }, &fx.prefs, &mut answers).unwrap();
        assert!(answers.split_asked);
        assert_eq!(planned.plan.split(), Some("4000m"));

        let mut answers = Scripted { split: Some("lots"), ..Scripted::default() };
        let err = plan(PlanRequest { source: big, ..request(&fx, "") }, &fx.prefs, &mut answers).unwrap_err();
        assert_eq!(err, InputError::SplitSize("lots".into()));
    }

    #[test]
    fn test_plan_renders_archiver_command() {
        use crate::gateway::Request;

        let fx = fixture(&["a.bin"]);
        let source = fx.files.paths()[0].display().to_string();
        let strings = |plan: &OperationPlan| Request::Create(plan).args().iter().map(|a| a.to_string_lossy().into_owned()).collect::<Vec<_>>();

        let dest = fx.dir.path().join("secure.7z").display().to_string();
        let req = PlanRequest { password: Some(Secret::new("pw12")), split: Some("2000m".into()), overwrite: true, ..request(&fx, &dest) };
        let planned = plan(req, &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(
            strings(&planned.plan),
            ["a", "-mx5", "-v2000m", "-y", "-ppw12", "-mhe=on", "-xr!.DS_Store", "-xr!.Thumbs.db", "-xr!Thumbs.db", dest.as_str(), source.as_str()]
        );

        let dest = fx.dir.path().join("plain.zip").display().to_string();
        let planned = plan(PlanRequest { password: Some(Secret::new("pw12")), ..request(&fx, &dest) }, &fx.prefs, &mut Scripted::default()).unwrap();
        assert_eq!(strings(&planned.plan)[..3], ["a", "-mx5", "-ppw12"]);
        assert!(!strings(&planned.plan).iter().any(|a| a == "-mhe=on"));

        let dest = fx.dir.path().join("bundle.tar").display().to_string();
        let planned = plan(request(&fx, &dest), &fx.prefs, &mut Scripted::default()).unwrap();
        assert!(strings(&planned.plan).iter().all(|a| !a.starts_with("-mx") && !a.starts_with("-p")));
    }

    #[test]
    fn test_validate_split_token() {
        assert_eq!(validate_split_token(" 700M ").unwrap(), "700M");
        assert_eq!(validate_split_token("1024").unwrap(), "1024");
        assert!(validate_split_token("m").is_err());
        assert!(validate_split_token("10mb").is_err());
        assert!(validate_split_token("1.5g").is_err());
        assert!(validate_split_token("").is_err());
    }

    #[test]
    fn test_empty_file_set_is_rejected() {
        let files = ValidatedFileSet::default();
        let req = PlanRequest { files: &files, destination: "", source: SourceSize::default(), password: None, level: None, split: None, overwrite: false, today: DAY };
        assert_eq!(plan(req, &Preferences::default(), &mut Scripted::default()).unwrap_err(), InputError::Empty);
    }
}

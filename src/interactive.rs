//! Interactive menu session.
//!
//! Owns the prompt, the preference store, the archiver gateway and the
//! keep-awake handle, and walks the user through creating, extracting and
//! inspecting archives. Decisions are delegated to the core modules; this
//! module only gathers input and reports results.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use strum::{Display, EnumIter, IntoEnumIterator};
use time::UtcOffset;
use tracing::{debug, warn};

use crate::awake::KeepAwake;
use crate::config::PASSWORD_MIN_LENGTH;
use crate::error::{InputError, ToolError};
use crate::extract::{ConflictPolicy, ExtractionBatch, PlacementMode, default_destination, parse_selection, select_entries};
use crate::file::{PathCandidate, ValidatedFileSet, flag_suspicious_length, load_file_list, source_size, split_input, validate_existing};
use crate::gateway::{ArchiveEntry, ArchiverGateway, Request};
use crate::naming::{smart_archive_name, today_in};
use crate::planner::{PlanRequest, plan};
use crate::preferences::{PreferenceKey, PreferenceStore};
use crate::resource::{ResourceEstimator, Verdict};
use crate::types::{CompressionPreset, MenuChoice, ViewAction};
use crate::ui::display::{
    clear_screen, format_bytes, preferences_table, print_banner, section, show_batch_outcome, show_creation_report, show_entries, show_error, show_help, show_info, show_job_event,
    show_output_notes, show_plan_summary, show_rejections, show_resource_report, show_success, show_tool_error, show_warning,
};
use crate::ui::progress::with_spinner;
use crate::ui::prompt::{Choice, Prompt};

/// Keyword that backs out of a path prompt.
const CANCEL_KEYWORD: &str = "cancel";

/// Keyword that switches path input to a list file.
const FILE_LIST_KEYWORD: &str = "file";

/// What a line typed at a path prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathInput {
    Cancel,
    FileList,
    Paths(Vec<String>),
}

fn classify_path_input(line: &str) -> PathInput {
    match line.trim() {
        keyword if keyword.eq_ignore_ascii_case(CANCEL_KEYWORD) => PathInput::Cancel,
        keyword if keyword.eq_ignore_ascii_case(FILE_LIST_KEYWORD) => PathInput::FileList,
        line => PathInput::Paths(split_input(line)),
    }
}

/// Typed destination, or `default` when nothing was typed.
fn destination_from(input: &str, default: &Path) -> PathBuf {
    if input.trim().is_empty() { default.to_path_buf() } else { PathCandidate::new(input).destination() }
}

/// Platform command that opens a folder in the file manager.
fn opener_command(dir: &Path) -> Command {
    let program = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    };

    let mut command = Command::new(program);
    command.arg(dir).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
    command
}

fn open_folder(dir: &Path) {
    match opener_command(dir).status() {
        Ok(_) => show_info(format!("Opened folder: {}", dir.display())),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot open folder");
            show_warning(format!("Could not open {}", dir.display()));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
enum ExtractScope {
    #[strum(to_string = "Extract all files")]
    All,
    #[strum(to_string = "Select specific files to extract")]
    Selected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
enum PreferencesMenu {
    #[strum(to_string = "Compression preference")]
    Compression,
    #[strum(to_string = "Default directories")]
    Directories,
    #[strum(to_string = "Auto-open settings")]
    AutoOpen,
    #[strum(to_string = "File exclusions")]
    Exclusions,
    #[strum(to_string = "Clear specific setting")]
    ClearOne,
    #[strum(to_string = "Reset all to defaults")]
    ResetAll,
    #[strum(to_string = "Back to main menu")]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
enum DirectoryMenu {
    #[strum(to_string = "Set default output directory")]
    SetDefault,
    #[strum(to_string = "Toggle 'remember last directory'")]
    ToggleRemember,
    #[strum(to_string = "Reset default directory to ~/Desktop")]
    ClearDefault,
    #[strum(to_string = "Forget last directory")]
    ClearLast,
    #[strum(to_string = "Back")]
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
enum ExclusionMenu {
    #[strum(to_string = "Add exclusion pattern")]
    Add,
    #[strum(to_string = "Remove exclusion pattern")]
    Remove,
    #[strum(to_string = "Reset to defaults")]
    Reset,
    #[strum(to_string = "Back")]
    Back,
}

fn key_label(key: PreferenceKey) -> &'static str {
    match key {
        PreferenceKey::CompressionPreset => "Compression preference (back to balanced)",
        PreferenceKey::CustomCompressionLevel => "Custom compression level (back to 5)",
        PreferenceKey::DefaultOutputDirectory => "Default output directory (back to ~/Desktop)",
        PreferenceKey::AutoOpenAfterExtract => "Auto-open setting (back to disabled)",
        PreferenceKey::ExcludePatterns => "File exclusions (back to defaults)",
        PreferenceKey::RememberLastDirectory => "Remember last directory (back to enabled)",
        PreferenceKey::LastOutputDirectory => "Last directory memory (forget it)",
    }
}

/// One interactive run of the application.
pub struct Session {
    prompt: Prompt,
    store: PreferenceStore,
    gateway: ArchiverGateway,
    awake: KeepAwake,
    utc_offset: UtcOffset,
}

impl Session {
    /// `utc_offset` dates smart archive names; read it before any thread is spawned.
    pub fn new(gateway: ArchiverGateway, awake: KeepAwake, utc_offset: UtcOffset) -> Self {
        Self { prompt: Prompt::new(PASSWORD_MIN_LENGTH), store: PreferenceStore::open_default(), gateway, awake, utc_offset }
    }

    /// Shows the main menu until the user exits.
    pub fn run(&mut self) -> Result<()> {
        clear_screen()?;
        print_banner();
        show_info(format!("Using 7-Zip at {}", self.gateway.program().display()));

        loop {
            println!();
            let choice = match self.prompt.menu() {
                Ok(choice) => choice,
                Err(e) if is_cancelled(&e) => MenuChoice::Exit,
                Err(e) => return Err(e),
            };

            let result = match choice {
                MenuChoice::Create => self.create(),
                MenuChoice::Extract => self.extract(),
                MenuChoice::View => self.view(),
                MenuChoice::Preferences => self.preferences(),
                MenuChoice::Help => {
                    show_help();
                    self.prompt.pause()
                }
                MenuChoice::Exit => break,
            };

            self.awake.stop();

            match result {
                Ok(()) => {}
                Err(e) if is_cancelled(&e) => show_warning("Operation cancelled"),
                Err(e) => show_error(format!("{e:#}")),
            }
        }

        show_success("Goodbye!");
        Ok(())
    }

    fn create(&mut self) -> Result<()> {
        section("CREATE ARCHIVE");

        let files = self.collect_sources()?;
        show_success(format!("{} item(s) ready to archive", files.len()));

        let prefs = self.store.get().clone();
        let suggestion = prefs.output_directory().join(smart_archive_name(files.paths(), today_in(self.utc_offset)));
        let help = format!("Enter a folder or a full file path; Enter uses {}", suggestion.display());
        let destination = self.prompt.text("Save archive to:", &help)?;

        let source = with_spinner("Calculating size...", || source_size(files.paths(), &prefs.exclude_patterns));
        show_info(format!("Total size: {}", format_bytes(source.bytes)));

        let request = PlanRequest { files: &files, destination: &destination, source, password: None, level: None, split: None, overwrite: false, today: today_in(self.utc_offset) };
        let planned = plan(request, &prefs, &mut self.prompt)?;

        for warning in &planned.warnings {
            show_warning(warning);
        }
        show_output_notes(&planned.notes);

        if prefs.remember_last_directory
            && let Some(dir) = planned.remembered_dir.clone()
        {
            self.store.update(|stored| stored.last_output_directory = Some(dir));
        }

        let plan = planned.plan;
        show_plan_summary(&plan, source);

        let report = ResourceEstimator::live().estimate(plan.level(), planned.estimated_output, plan.output());
        show_resource_report(&report);

        let proceed = match report.verdict() {
            Verdict::Proceed => true,
            Verdict::Confirm => self.prompt.confirm("Continue with warnings?", false)?,
            Verdict::ConfirmElevated => self.prompt.confirm(&format!("{} is resource intensive. Continue anyway?", plan.level()), false)?,
        };
        if !proceed {
            show_warning("Operation cancelled due to resource concerns");
            return Ok(());
        }

        if !self.prompt.confirm("Create archive?", true)? {
            return Err(InputError::Cancelled.into());
        }

        self.offer_keep_awake()?;

        let output = plan.output().to_path_buf();
        println!();
        show_info("Running 7-Zip...");
        let result = self.gateway.create(plan);
        self.awake.stop();

        if let Err(e) = result {
            show_tool_error(&e);
            return Ok(());
        }

        match fs::metadata(&output) {
            Ok(meta) if meta.len() > 0 => show_creation_report(&output, meta.len(), source),
            _ => show_success(format!("7-Zip finished: {}", output.display())),
        }

        if let Some(dir) = output.parent().filter(|dir| dir.is_dir())
            && self.prompt.confirm("Open containing folder?", false)?
        {
            open_folder(dir);
        }

        Ok(())
    }

    /// Asks for sources until at least one is valid and the user stops adding.
    fn collect_sources(&self) -> Result<ValidatedFileSet> {
        show_info("Drag files or folders into the terminal, or type paths separated by spaces");
        show_info(format!("Type '{FILE_LIST_KEYWORD}' to read paths from a text file, '{CANCEL_KEYWORD}' to go back"));

        let mut files = ValidatedFileSet::default();

        loop {
            let line = self.prompt.text("Path(s):", "")?;
            if line.trim().is_empty() {
                if files.is_empty() {
                    show_warning("No paths entered");
                    continue;
                }
                break;
            }

            if flag_suspicious_length(&line) && !self.prompt.confirm("This input is very long and may have been cut off. Continue anyway?", false)? {
                continue;
            }

            let candidates = match classify_path_input(&line) {
                PathInput::Cancel => return Err(InputError::Cancelled.into()),
                PathInput::FileList => {
                    let list = self.prompt.text("Path to text file with one path per line:", "")?;
                    match load_file_list(&list) {
                        Ok(entries) => entries,
                        Err(e) => {
                            show_error(format!("Cannot read file list: {e}"));
                            continue;
                        }
                    }
                }
                PathInput::Paths(tokens) => tokens,
            };

            let validation = validate_existing(&candidates);
            show_rejections(&validation.rejected);
            for path in validation.files.iter() {
                show_success(path.display());
            }
            files.extend(validation.files);

            if files.is_empty() {
                show_warning("No valid files yet; try again");
                continue;
            }

            if !self.prompt.confirm("Add more files?", false)? {
                break;
            }
        }

        Ok(files)
    }

    fn extract(&mut self) -> Result<()> {
        section("EXTRACT ARCHIVE");

        let line = self.prompt.text("Archive path(s):", "Separate several archives with spaces")?;
        let tokens = match classify_path_input(&line) {
            PathInput::Cancel => return Err(InputError::Cancelled.into()),
            PathInput::FileList => load_file_list(&self.prompt.text("Path to text file with one archive per line:", "")?)?,
            PathInput::Paths(tokens) => tokens,
        };

        let validation = validate_existing(&tokens);
        show_rejections(&validation.rejected);
        let archives = validation.files.paths().to_vec();
        if archives.is_empty() {
            return Err(InputError::Empty).context("no archives to extract");
        }
        show_success(format!("{} archive(s) found", archives.len()));

        let placement = if archives.len() > 1 { self.prompt.select_enum::<PlacementMode>("Where should the archives go?")? } else { PlacementMode::default() };

        let entries = match archives.as_slice() {
            [single] => self.choose_entries(single)?,
            _ => Vec::new(),
        };

        let default_dest = default_destination(&archives);
        let input = self.prompt.text("Extract to:", &format!("Enter uses {}", default_dest.display()))?;
        let destination = destination_from(&input, &default_dest);

        let mut batch = ExtractionBatch::new(archives, destination, placement)?.with_entries(entries)?;
        batch.create_destination().with_context(|| format!("cannot create {}", batch.destination().display()))?;

        if batch.needs_conflict_policy() {
            show_warning(format!("{} already contains files", batch.destination().display()));
            let policy = self.prompt.select_enum::<ConflictPolicy>("How should existing files be handled?")?;
            batch.set_conflict_policy(policy);
        }

        if batch.conflict_policy() != Some(ConflictPolicy::Cancel) {
            println!();
            show_info(format!("{} archive(s) → {}", batch.jobs().len(), batch.destination().display()));
            if !self.prompt.confirm("Extract archive(s)?", true)? {
                return Err(InputError::Cancelled.into());
            }
            self.offer_keep_awake()?;
        }

        let outcome = batch.run(&mut self.gateway, show_job_event);
        self.awake.stop();
        show_batch_outcome(&outcome, batch.destination());

        if !outcome.succeeded().is_empty() {
            let open = self.store.get().auto_open_after_extract || self.prompt.confirm("Open destination folder?", false)?;
            if open {
                open_folder(batch.destination());
            }
        }

        Ok(())
    }

    /// Entry paths to extract from a single archive; empty means everything.
    fn choose_entries(&mut self, archive: &Path) -> Result<Vec<String>> {
        if self.prompt.select_enum::<ExtractScope>("What to extract?")? == ExtractScope::All {
            return Ok(Vec::new());
        }

        let Some(entries) = self.read_entries(archive)? else {
            show_info("Extracting everything instead");
            return Ok(Vec::new());
        };

        if entries.is_empty() {
            show_warning("No entries found; extracting everything");
            return Ok(Vec::new());
        }

        show_entries(&entries);
        show_info("Enter numbers (1 3 5), ranges (1-5 8 10-12) or 'all'; 'cancel' goes back");

        loop {
            let input = self.prompt.text("Select files:", "")?;
            if input.trim().eq_ignore_ascii_case(CANCEL_KEYWORD) {
                return Err(InputError::Cancelled.into());
            }

            match parse_selection(&input, entries.len()) {
                Ok(indices) => {
                    let selected = select_entries(&entries, &indices);
                    for path in &selected {
                        println!("  • {path}");
                    }
                    if self.prompt.confirm(&format!("Proceed with these {} item(s)?", selected.len()), true)? {
                        return Ok(selected);
                    }
                }
                Err(e) => show_error(e),
            }
        }
    }

    /// Lists an archive, asking for its password once if the plain listing fails.
    fn read_entries(&mut self, archive: &Path) -> Result<Option<Vec<ArchiveEntry>>> {
        let err = match with_spinner("Reading archive contents...", || self.gateway.list_entries(archive, None)) {
            Ok(entries) => return Ok(Some(entries)),
            Err(e) => e,
        };

        show_tool_error(&err);
        if !matches!(err, ToolError::Exit { .. }) || !self.prompt.confirm("The archive may be password-protected. Enter its password?", true)? {
            return Ok(None);
        }

        let password = self.prompt.archive_password()?;
        match with_spinner("Reading archive contents...", || self.gateway.list_entries(archive, Some(&password))) {
            Ok(entries) => Ok(Some(entries)),
            Err(e) => {
                show_tool_error(&e);
                Ok(None)
            }
        }
    }

    fn view(&mut self) -> Result<()> {
        section("VIEW ARCHIVE");

        let input = self.prompt.text("Archive path:", "")?;
        let candidate = PathCandidate::new(&input);
        let archive = candidate.locate().ok_or_else(|| InputError::NotFound(candidate.original().to_owned()))?;

        let action = self.prompt.select_enum::<ViewAction>("What would you like to do?")?;
        println!();

        if let Err(e) = self.gateway.invoke(&Request::view(action, &archive)) {
            show_tool_error(&e);
        }

        Ok(())
    }

    fn offer_keep_awake(&self) -> Result<()> {
        if !self.prompt.confirm("Prevent sleep while 7-Zip runs?", false)? {
            return Ok(());
        }

        match self.awake.start() {
            Ok(()) => show_success("Sleep prevention enabled"),
            Err(e) => show_warning(format!("Sleep prevention unavailable: {e}")),
        }
        Ok(())
    }

    fn preferences(&mut self) -> Result<()> {
        loop {
            section("USER PREFERENCES");
            println!("{}", preferences_table(self.store.get()));
            show_info(format!("Stored in {}", self.store.path().display()));

            match self.prompt.select_enum::<PreferencesMenu>("Choose option")? {
                PreferencesMenu::Compression => self.compression_preferences()?,
                PreferencesMenu::Directories => self.directory_preferences()?,
                PreferencesMenu::AutoOpen => {
                    let current = self.store.get().auto_open_after_extract;
                    let enabled = self.prompt.confirm("Open the destination folder automatically after extraction?", current)?;
                    self.store.update(|prefs| prefs.auto_open_after_extract = enabled);
                }
                PreferencesMenu::Exclusions => self.exclusion_preferences()?,
                PreferencesMenu::ClearOne => {
                    let options = PreferenceKey::iter().map(|key| Choice::new(key, key_label(key))).collect();
                    let key = self.prompt.select("Which setting?", options)?.value;
                    self.store.clear_one(key);
                    show_success(format!("Cleared {}", key.as_str()));
                }
                PreferencesMenu::ResetAll => {
                    if self.prompt.confirm("Reset all preferences to defaults?", false)? {
                        match self.store.reset() {
                            Ok(()) => show_success("Preferences reset"),
                            Err(e) => show_error(e),
                        }
                    }
                }
                PreferencesMenu::Back => return Ok(()),
            }
        }
    }

    fn compression_preferences(&mut self) -> Result<()> {
        let options = CompressionPreset::iter().map(|preset| Choice::new(preset, preset.label())).collect();
        let preset = self.prompt.select("Default compression:", options)?.value;

        let mut patch = Map::new();
        patch.insert(PreferenceKey::CompressionPreset.as_str().to_owned(), json!(preset));
        if preset == CompressionPreset::Custom {
            patch.insert(PreferenceKey::CustomCompressionLevel.as_str().to_owned(), Value::from(self.prompt.level()?.get()));
        }

        self.store.set_many(patch)?;
        show_success(format!("Compression preference: {}", preset.label()));
        Ok(())
    }

    fn directory_preferences(&mut self) -> Result<()> {
        match self.prompt.select_enum::<DirectoryMenu>("Directories")? {
            DirectoryMenu::SetDefault => {
                let input = self.prompt.text("Default output directory:", "")?;
                if input.trim().is_empty() {
                    return Err(InputError::Empty.into());
                }

                let dir = std::path::absolute(PathCandidate::new(&input).destination()).context("cannot resolve directory")?;
                if !dir.is_dir() {
                    if !self.prompt.confirm(&format!("{} does not exist. Create it?", dir.display()), true)? {
                        return Ok(());
                    }
                    fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
                }

                debug!(dir = %dir.display(), "default output directory set");
                show_success(format!("Default directory: {}", dir.display()));
                self.store.update(|prefs| prefs.default_output_directory = dir);
            }
            DirectoryMenu::ToggleRemember => {
                self.store.update(|prefs| prefs.remember_last_directory = !prefs.remember_last_directory);
                let state = if self.store.get().remember_last_directory { "enabled" } else { "disabled" };
                show_success(format!("Remember last directory {state}"));
            }
            DirectoryMenu::ClearDefault => {
                self.store.clear_one(PreferenceKey::DefaultOutputDirectory);
                show_success(format!("Default directory: {}", self.store.get().default_output_directory.display()));
            }
            DirectoryMenu::ClearLast => {
                self.store.clear_one(PreferenceKey::LastOutputDirectory);
                show_success("Last directory forgotten");
            }
            DirectoryMenu::Back => {}
        }
        Ok(())
    }

    fn exclusion_preferences(&mut self) -> Result<()> {
        println!();
        println!("Current exclusions:");
        for (i, pattern) in self.store.get().exclude_patterns.iter().enumerate() {
            println!("  {}. {pattern}", i + 1);
        }

        match self.prompt.select_enum::<ExclusionMenu>("Exclusions")? {
            ExclusionMenu::Add => {
                let pattern = self.prompt.text("Pattern to exclude:", "e.g. *.tmp")?;
                if self.store.add_exclusion(&pattern) {
                    show_success(format!("Added exclusion: {}", pattern.trim()));
                } else {
                    show_warning("Pattern is empty or already excluded");
                }
            }
            ExclusionMenu::Remove => {
                let number = self.prompt.text("Remove which pattern (number):", "")?;
                let removed = number.trim().parse::<usize>().ok().and_then(|n| n.checked_sub(1)).and_then(|i| self.store.remove_exclusion(i));
                match removed {
                    Some(pattern) => show_success(format!("Removed exclusion: {pattern}")),
                    None => show_error(InputError::Selection(number.trim().to_owned())),
                }
            }
            ExclusionMenu::Reset => {
                self.store.clear_one(PreferenceKey::ExcludePatterns);
                show_success("Exclusions reset to defaults");
            }
            ExclusionMenu::Back => {}
        }
        Ok(())
    }
}

/// Whether an application error is a user cancellation.
fn is_cancelled(err: &anyhow::Error) -> bool {
    err.downcast_ref::<InputError>() == Some(&InputError::Cancelled)
}

/// Failure to find the archiver at startup, with install hints.
pub fn report_missing_archiver(err: &ToolError) {
    show_error(err);
    show_info("Install 7-Zip first:");
    println!("  • macOS:  brew install sevenzip");
    println!("  • Debian/Ubuntu:  sudo apt install 7zip");
    println!("  • Or place a 7zz binary next to this program");
}

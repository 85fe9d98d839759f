//! Terminal output: banner, status lines, tables and reports.

use std::fmt::Display;
use std::path::Path;

use anyhow::Result;
use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use console::{Term, style};
use figlet_rs::FIGfont;

use crate::config::APP_NAME;
use crate::error::ToolError;
use crate::extract::{BatchOutcome, JobEvent, JobStatus};
use crate::file::{Rejection, SourceSize, name_of};
use crate::gateway::ArchiveEntry;
use crate::planner::{OperationPlan, OutputNote};
use crate::preferences::Preferences;
use crate::resource::ResourceReport;

/// Formats bytes into a human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    ByteSize::b(bytes).display().iec().to_string()
}

/// Percentage saved by compressing `source` bytes into `archive` bytes.
///
/// `None` when the source is empty. Negative when the archive grew.
pub fn saved_percent(source: u64, archive: u64) -> Option<f64> {
    (source > 0).then(|| (source as f64 - archive as f64) / source as f64 * 100.0)
}

pub fn show_success(message: impl Display) {
    println!("{} {}", style("✓").green(), style(message).bold());
}

pub fn show_info(message: impl Display) {
    println!("{} {}", style("•").cyan(), message);
}

pub fn show_warning(message: impl Display) {
    println!("{} {}", style("!").yellow().bold(), style(message).yellow());
}

pub fn show_error(message: impl Display) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Prints a titled separator.
pub fn section(title: &str) {
    let rule = "─".repeat(50);
    println!();
    println!("{}", style(&rule).magenta());
    println!("{}", style(title).bold());
    println!("{}", style(&rule).magenta());
}

/// Clears the terminal screen.
pub fn clear_screen() -> Result<()> {
    Term::stdout().clear_screen().map_err(|e| anyhow::anyhow!("failed to clear screen: {e}"))
}

/// Prints the application banner.
pub fn print_banner() {
    let art = FIGfont::standard().ok().and_then(|font| font.convert(APP_NAME).map(|figure| figure.to_string()));

    match art {
        Some(art) => println!("{}", style(art).cyan().bold()),
        None => println!("{}", style(APP_NAME).cyan().bold()),
    }
    println!("{}", style("7-Zip archive creation and extraction").dim());
}

/// Reports inputs dropped during path validation.
pub fn show_rejections(rejected: &[Rejection]) {
    for rejection in rejected {
        match rejection {
            Rejection::NotFound { raw, tried } => {
                show_error(format!("Not found: {raw}"));
                for form in tried {
                    println!("    tried {}", style(form).dim());
                }
            }
            Rejection::Denied { path } => show_warning(format!("Skipping system location: {}", path.display())),
            Rejection::Duplicate { path } => show_info(format!("Already added: {}", path.display())),
        }
    }
}

pub fn show_output_notes(notes: &[OutputNote]) {
    for note in notes {
        match note {
            OutputNote::CreatedDirectory(dir) => show_success(format!("Created directory: {}", dir.display())),
            OutputNote::FellBack { dir, reason } => {
                show_warning(format!("Cannot create directory ({reason})"));
                show_info(format!("Using {} instead", dir.display()));
            }
        }
    }
}

/// Summary shown before the final confirmation of an archive creation.
pub fn show_plan_summary(plan: &OperationPlan, source: SourceSize) {
    println!();
    println!("{}", style("Summary:").bold());
    println!("  Sources:     {} ({} files, {})", plan.sources().len(), source.files, format_bytes(source.bytes));
    println!("  Output:      {}", plan.output().display());
    println!("  Format:      {}", plan.format());
    println!("  Password:    {}", if plan.password().is_some() { "Yes (AES-256)" } else { "No" });
    if plan.format().supports_compression_level() {
        println!("  Compression: {}", plan.level());
    }
    if let Some(split) = plan.split() {
        println!("  Split size:  {split} (will create multiple files)");
    }
    if !plan.exclusions().is_empty() {
        println!("  Excluding:   {}", plan.exclusions().join(", "));
    }

    if plan.password().is_none() && plan.format().supports_password() {
        show_warning("Archive will be unencrypted; consider adding a password");
    }

    if let Some(split) = plan.split() {
        let name = name_of(plan.output());
        show_info(format!("Split archives will be created as {name}.001, {name}.002, ... (~{split} each)"));
    }
}

/// Measurements, warnings and notices of a resource estimate.
pub fn show_resource_report(report: &ResourceReport) {
    println!();
    println!("{}", style("System resources:").bold());

    match report.available_memory_gb {
        Some(available) => println!("  Memory:  {available:.1}GB available, ~{:.1}GB needed for {}", report.required_memory_gb, report.level),
        None => println!("  Memory:  unknown, ~{:.1}GB needed for {}", report.required_memory_gb, report.level),
    }
    if let Some(load) = report.cpu_load_percent {
        println!("  CPU:     {load:.1}% load");
    }
    if let Some(disk) = report.available_disk {
        println!("  Disk:    {} free, archive ~{}", format_bytes(disk), format_bytes(report.estimated_output));
    }

    for notice in &report.notices {
        show_info(notice);
    }
    for warning in &report.warnings {
        show_warning(warning);
    }
}

/// Report printed after the archiver created an archive.
pub fn show_creation_report(archive: &Path, archive_size: u64, source: SourceSize) {
    let saved = saved_percent(source.bytes, archive_size).map(|pct| format!(" ({pct:.1}% smaller)")).unwrap_or_default();

    println!();
    show_success("Archive created successfully!");
    println!("  Archive: {}", archive.display());
    println!("  Size:    {} → {}{saved}", format_bytes(source.bytes), format_bytes(archive_size));
    println!("  Files:   {} processed", source.files);
}

/// Prints a failure at the archiver boundary, with likely causes for non-zero exits.
pub fn show_tool_error(err: &ToolError) {
    show_error(err);
    if err.exit_code().is_some() {
        println!("  This could be due to:");
        for cause in ToolError::LIKELY_CAUSES {
            println!("  • {cause}");
        }
    }
}

/// Numbered table of archive entries.
pub fn entries_table(entries: &[ArchiveEntry]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["No", "Name", "Size", "Type"]);

    for (i, entry) in entries.iter().enumerate() {
        let (size, kind) = if entry.is_folder { (String::new(), "folder") } else { (format_bytes(entry.size), "file") };
        table.add_row(vec![
            Cell::new(i + 1).set_alignment(CellAlignment::Right),
            Cell::new(&entry.path),
            Cell::new(size).set_alignment(CellAlignment::Right),
            Cell::new(kind),
        ]);
    }

    table
}

pub fn show_entries(entries: &[ArchiveEntry]) {
    println!();
    show_success(format!("Found {} item(s):", entries.len()));
    println!("{}", entries_table(entries));
}

/// Current preference values as a two-column table.
pub fn preferences_table(prefs: &Preferences) -> Table {
    let last = prefs.last_output_directory.as_ref().map_or_else(|| "(none)".to_owned(), |dir| dir.display().to_string());
    let on_off = |flag: bool| if flag { "on" } else { "off" };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Compression".to_owned(), prefs.compression_preset.label().to_owned()]);
    table.add_row(vec!["Custom level".to_owned(), prefs.custom_compression_level.get().to_string()]);
    table.add_row(vec!["Default output directory".to_owned(), prefs.default_output_directory.display().to_string()]);
    table.add_row(vec!["Remember last directory".to_owned(), on_off(prefs.remember_last_directory).to_owned()]);
    table.add_row(vec!["Last output directory".to_owned(), last]);
    table.add_row(vec!["Open folder after extraction".to_owned(), on_off(prefs.auto_open_after_extract).to_owned()]);
    table.add_row(vec!["Exclusions".to_owned(), prefs.exclude_patterns.join(", ")]);
    table
}

/// Progress line for one extraction job.
pub fn show_job_event(event: &JobEvent<'_>) {
    match event {
        JobEvent::Started { index, total, job } => {
            println!();
            println!("{} {}", style(format!("[{}/{}]", index + 1, total)).cyan().bold(), style(format!("Extracting {}", job.name())).bold());
            println!("  → {}", job.destination().display());
        }
        JobEvent::Finished { job, .. } => match job.status() {
            JobStatus::Succeeded => show_success(format!("{} extracted", job.name())),
            JobStatus::Failed(reason) => show_error(format!("{}: {reason}", job.name())),
            JobStatus::Pending => {}
        },
    }
}

/// Aggregate result of an extraction batch.
pub fn show_batch_outcome(outcome: &BatchOutcome, destination: &Path) {
    println!();
    match outcome {
        BatchOutcome::AllSucceeded { succeeded } => {
            show_success(format!("All {} archive(s) extracted successfully!", succeeded.len()));
            println!("  Location: {}", destination.display());
        }
        BatchOutcome::PartialSuccess { succeeded, failed } => {
            show_warning(format!("{} archive(s) extracted, {} failed", succeeded.len(), failed.len()));
            for failure in failed {
                println!("  ✗ {}: {}", name_of(&failure.archive), failure.reason);
            }
        }
        BatchOutcome::AllFailed { failed } => {
            show_error(format!("All {} extraction(s) failed", failed.len()));
            for failure in failed {
                println!("  ✗ {}: {}", name_of(&failure.archive), failure.reason);
            }
            println!("  Common causes:");
            for cause in ["Corrupted or damaged archives", "Incorrect password", "Insufficient disk space", "Permission issues"] {
                println!("  • {cause}");
            }
        }
        BatchOutcome::Cancelled => show_warning("Extraction cancelled"),
    }
}

/// Help text shown from the main menu.
pub fn show_help() {
    let topics: &[(&str, &[&str])] = &[
        ("Quick start", &[
            "Create Archive: drag files or folders into the terminal, pick a destination, then confirm",
            "Extract Archive: drag one or more archives in; extract everything or pick entries",
            "7-Zip shows its own progress and asks for passwords when it needs them",
        ]),
        ("Input", &[
            "Separate several paths with spaces; quote paths or escape spaces with a backslash",
            "Type 'file' to read paths from a text file with one path per line",
            "Type 'cancel' to go back",
        ]),
        ("Formats & compression", &[
            "7z gives the best compression and encrypts file names too",
            "ZIP is universally compatible; TAR cannot carry a password",
            "Level 5 suits most uses; levels 8 and 9 need a lot of memory and time",
            "Sources above 10 GB can be split into volumes",
        ]),
        ("Preferences", &[
            "Saved in ~/.packrat_preferences.json and kept between runs",
            "Set a default compression preset, output directory and exclusion patterns",
            "The last used output directory is remembered unless turned off",
        ]),
        ("Troubleshooting", &[
            "File not found: drag and drop instead of typing",
            "Damaged archive: use View Archive Contents, then Test archive integrity",
            "Interrupted extraction: extract again and skip existing files to resume",
            "Set RUST_LOG=debug to see every 7-Zip command line",
        ]),
    ];

    for (title, lines) in topics {
        println!();
        println!("{}", style(title).cyan().bold());
        for line in *lines {
            println!("  • {line}");
        }
    }
}

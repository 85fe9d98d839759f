//! Interactive prompts built on inquire.
//!
//! [`Prompt`] answers the planner's questions ([`PlanDecisions`]) and offers
//! the menus and inputs the session needs. Escape or Ctrl-C inside a prompt
//! reads as [`InputError::Cancelled`], so a flow can back out to the main
//! menu without treating it as a failure.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use anyhow::{Result, anyhow};
use inquire::error::{CustomUserError, InquireError, InquireResult};
use inquire::validator::Validation;
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use strum::IntoEnumIterator;
use tracing::warn;

use crate::config::SPLIT_PRESETS;
use crate::error::InputError;
use crate::planner::{OutputCollision, PlanDecisions, validate_split_token};
use crate::secret::Secret;
use crate::types::{ArchiveFormat, CompressionLevel, CompressionPreset, MenuChoice};
use crate::ui::display::{format_bytes, show_info, show_warning};

/// A menu option carrying its own label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice<T> {
    pub value: T,
    pub label: &'static str,
}

impl<T> Choice<T> {
    pub const fn new(value: T, label: &'static str) -> Self {
        Self { value, label }
    }
}

impl<T> Display for Choice<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SplitOption {
    Single,
    Preset(&'static str),
    Custom,
}

impl Display for SplitOption {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Single => f.write_str("Single file (may fail on very large operations)"),
            Self::Preset(token) => write!(f, "Split into {token} parts"),
            Self::Custom => f.write_str("Custom split size"),
        }
    }
}

/// Maps an inquire failure into the input error taxonomy.
///
/// Cancellation and interruption become [`InputError::Cancelled`]; terminal
/// failures are logged and treated as a cancellation too.
fn answer<T>(result: InquireResult<T>) -> Result<T, InputError> {
    result.map_err(|e| match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => InputError::Cancelled,
        other => {
            warn!(error = %other, "prompt failed");
            InputError::Cancelled
        }
    })
}

/// Like [`answer`] but keeps terminal failures as errors of their own.
fn interact<T>(what: &str, result: InquireResult<T>) -> Result<T> {
    result.map_err(|e| match e {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => InputError::Cancelled.into(),
        other => anyhow!("{what} failed: {other}"),
    })
}

/// Interactive prompt handler.
pub struct Prompt {
    password_min_length: usize,
}

impl Prompt {
    pub fn new(password_min_length: usize) -> Self {
        Self { password_min_length }
    }

    pub fn menu(&self) -> Result<MenuChoice> {
        interact("menu selection", Select::new("Main menu", MenuChoice::iter().collect()).with_page_size(8).prompt())
    }

    /// Selects one of `options`, starting on the first.
    pub fn select<T: Display>(&self, message: &str, options: Vec<T>) -> Result<T> {
        interact("selection", Select::new(message, options).with_page_size(10).prompt())
    }

    /// Selects one variant of a labelled enum.
    pub fn select_enum<T: IntoEnumIterator + Display>(&self, message: &str) -> Result<T> {
        self.select(message, T::iter().collect())
    }

    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        interact("confirmation", Confirm::new(message).with_default(default).prompt())
    }

    /// Free text; an empty answer is returned as-is.
    pub fn text(&self, message: &str, help: &str) -> Result<String> {
        let mut prompt = Text::new(message);
        if !help.is_empty() {
            prompt = prompt.with_help_message(help);
        }
        interact("text input", prompt.prompt())
    }

    /// A level in `0..=9`.
    pub fn level(&self) -> Result<CompressionLevel> {
        let level = CustomType::<u8>::new("Compression level (0-9):")
            .with_help_message("0 store, 1 fastest, 5 normal, 9 ultra")
            .with_error_message("Please enter a number between 0 and 9")
            .with_validator(|level: &u8| -> Result<Validation, CustomUserError> {
                Ok(if *level <= CompressionLevel::MAXIMUM.get() { Validation::Valid } else { Validation::Invalid("Level must be between 0 and 9".into()) })
            })
            .prompt();

        Ok(CompressionLevel::new(interact("level input", level)?)?)
    }

    /// New archive password, entered twice.
    pub fn new_password(&self) -> Result<Secret> {
        let min = self.password_min_length;
        let password = Password::new("Archive password:")
            .with_display_mode(PasswordDisplayMode::Masked)
            .with_custom_confirmation_message("Confirm password:")
            .with_custom_confirmation_error_message("Passwords do not match")
            .with_validator(move |input: &str| -> Result<Validation, CustomUserError> {
                if input.trim().is_empty() {
                    Ok(Validation::Invalid("Password cannot be empty or whitespace only".into()))
                } else if input.chars().count() < min {
                    Ok(Validation::Invalid(format!("Password must be at least {min} characters long").into()))
                } else {
                    Ok(Validation::Valid)
                }
            })
            .prompt();

        Ok(Secret::from_string(interact("password input", password)?))
    }

    /// Password of an existing archive, entered once.
    pub fn archive_password(&self) -> Result<Secret> {
        let password = Password::new("Archive password:").with_display_mode(PasswordDisplayMode::Masked).without_confirmation().prompt();
        Ok(Secret::from_string(interact("password input", password)?))
    }

    /// Waits for Enter.
    pub fn pause(&self) -> Result<()> {
        interact("pause", Text::new("Press Enter to continue...").prompt()).map(drop)
    }

    fn preset_level(&self) -> Result<CompressionLevel> {
        let presets = [CompressionPreset::Fast, CompressionPreset::Balanced, CompressionPreset::Maximum, CompressionPreset::Custom];
        let options = presets.into_iter().map(|preset| Choice::new(preset, preset.label())).collect();
        let preset = interact("preset selection", Select::new("Compression preset:", options).with_starting_cursor(1).prompt())?;

        match preset.value {
            CompressionPreset::Fast => Ok(CompressionLevel::FAST),
            CompressionPreset::Maximum => Ok(CompressionLevel::MAXIMUM),
            CompressionPreset::Custom => self.level(),
            CompressionPreset::Balanced | CompressionPreset::Ask => Ok(CompressionLevel::BALANCED),
        }
    }
}

/// Recovers the input error carried by an application error, if any.
fn as_input(err: anyhow::Error) -> InputError {
    match err.downcast::<InputError>() {
        Ok(input) => input,
        Err(other) => {
            warn!(error = %other, "prompt failed");
            InputError::Cancelled
        }
    }
}

impl PlanDecisions for Prompt {
    fn archive_filename(&mut self, dir: &Path, suggested: &str) -> Result<String, InputError> {
        let help = format!("Saving into {}", dir.display());
        answer(Text::new("Archive filename:").with_default(suggested).with_help_message(&help).prompt())
    }

    fn existing_output(&mut self, path: &Path) -> Result<OutputCollision, InputError> {
        show_warning(format!("File already exists: {}", path.display()));

        let options = vec![
            Choice::new(0u8, "Overwrite existing file"),
            Choice::new(1, "Choose a different filename"),
            Choice::new(2, "Cancel operation"),
        ];

        match answer(Select::new("What now?", options).prompt())?.value {
            0 => Ok(OutputCollision::Overwrite),
            1 => answer(Text::new("New output path:").prompt()).map(OutputCollision::Rename),
            _ => Ok(OutputCollision::Cancel),
        }
    }

    fn password(&mut self, format: ArchiveFormat) -> Result<Option<Secret>, InputError> {
        if !answer(Confirm::new("Add a password?").with_default(false).prompt())? {
            return Ok(None);
        }

        if !format.supports_header_encryption() {
            show_info(format!("{format} encrypts file contents only; file names stay visible"));
        }

        self.new_password().map(Some).map_err(as_input)
    }

    fn choose_level(&mut self) -> Result<CompressionLevel, InputError> {
        self.preset_level().map_err(as_input)
    }

    fn confirm_maximum(&mut self) -> bool {
        show_warning("Level 9 uses extreme amounts of memory and time");
        show_info("It may need 16GB of memory; Level 5 is usually almost as small");

        answer(Confirm::new("Continue with Level 9 anyway?").with_default(false).prompt()).unwrap_or(false)
    }

    fn choose_split(&mut self, total_bytes: u64) -> Result<Option<String>, InputError> {
        show_warning(format!("Large archive detected ({})", format_bytes(total_bytes)));

        let mut options = vec![SplitOption::Single];
        options.extend(SPLIT_PRESETS.iter().copied().map(SplitOption::Preset));
        options.push(SplitOption::Custom);

        match answer(Select::new("Split into smaller parts?", options).prompt())? {
            SplitOption::Single => Ok(None),
            SplitOption::Preset(token) => Ok(Some(token.to_owned())),
            SplitOption::Custom => {
                let token = Text::new("Split size:")
                    .with_help_message("Digits with an optional unit: b, k, m or g (e.g. 1000m)")
                    .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
                        Ok(match validate_split_token(input) {
                            Ok(_) => Validation::Valid,
                            Err(e) => Validation::Invalid(e.to_string().into()),
                        })
                    })
                    .prompt();
                answer(token).map(Some)
            }
        }
    }
}

//! Command-line construction for each archiver request.

use std::ffi::OsString;
use std::path::Path;

use crate::extract::ConflictPolicy;
use crate::planner::OperationPlan;
use crate::secret::Secret;
use crate::types::{Action, ViewAction};

/// Everything the archiver can be asked to do.
#[derive(Debug)]
pub enum Request<'a> {
    Create(&'a OperationPlan),
    Extract {
        archive: &'a Path,
        destination: &'a Path,
        /// `None` when the destination was empty and no policy was needed.
        conflict: Option<ConflictPolicy>,
        /// Entry paths to extract; empty extracts everything.
        entries: &'a [String],
    },
    List {
        archive: &'a Path,
        technical: bool,
        password: Option<&'a Secret>,
    },
    Test {
        archive: &'a Path,
    },
    Info {
        archive: &'a Path,
    },
}

impl<'a> Request<'a> {
    /// Passthrough request for a read-only view of `archive`.
    pub fn view(action: ViewAction, archive: &'a Path) -> Self {
        match action {
            ViewAction::List => Self::List { archive, technical: false, password: None },
            ViewAction::ListTechnical => Self::List { archive, technical: true, password: None },
            ViewAction::Test => Self::Test { archive },
            ViewAction::Info => Self::Info { archive },
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Extract { .. } => Action::Extract,
            Self::List { .. } => Action::List,
            Self::Test { .. } => Action::Test,
            Self::Info { .. } => Action::Info,
        }
    }

    /// Ordered argument list, verb first.
    pub fn args(&self) -> Vec<OsString> {
        let mut args = vec![OsString::from(self.action().verb())];

        match self {
            Self::Create(plan) => {
                if plan.format().supports_compression_level() {
                    args.push(format!("-mx{}", plan.level().get()).into());
                }

                if let Some(split) = plan.split() {
                    args.push(format!("-v{split}").into());
                }

                if plan.overwrite() {
                    args.push("-y".into());
                }

                if let Some(password) = plan.password() {
                    args.push(password_switch(password));
                    if plan.format().supports_header_encryption() {
                        args.push("-mhe=on".into());
                    }
                }

                args.extend(plan.exclusions().iter().map(|pattern| OsString::from(format!("-xr!{pattern}"))));
                args.push(plan.output().into());
                args.extend(plan.sources().iter().map(OsString::from));
            }

            Self::Extract { archive, destination, conflict, entries } => {
                args.push((*archive).into());

                let mut dest = OsString::from("-o");
                dest.push(destination.as_os_str());
                args.push(dest);

                args.extend(conflict_switches(*conflict).iter().map(OsString::from));
                args.extend(entries.iter().map(OsString::from));
            }

            Self::List { archive, technical, password } => {
                if *technical {
                    args.push("-slt".into());
                }
                args.push((*archive).into());
                if let Some(password) = password {
                    args.push(password_switch(password));
                }
            }

            Self::Test { archive } | Self::Info { archive } => args.push((*archive).into()),
        }

        args
    }
}

/// Switches controlling prompts and existing files during extraction.
///
/// Asking per file leaves both the assume-yes and the overwrite-mode switch
/// out so the archiver prompts on every conflict itself.
pub fn conflict_switches(conflict: Option<ConflictPolicy>) -> &'static [&'static str] {
    match conflict {
        None => &["-y"],
        Some(ConflictPolicy::SkipExisting) => &["-y", "-aos"],
        Some(ConflictPolicy::OverwriteAll) => &["-y", "-aoa"],
        Some(ConflictPolicy::AskPerFile | ConflictPolicy::Cancel) => &[],
    }
}

fn password_switch(password: &Secret) -> OsString {
    format!("-p{}", password.expose_secret()).into()
}

/// Renders arguments for logging with any password masked.
pub fn redacted(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.to_string_lossy();
            if arg.starts_with("-p") { "-p****".to_owned() } else { arg.into_owned() }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_extract_args_per_policy() {
        let archive = PathBuf::from("/in/a.7z");
        let dest = PathBuf::from("/out/a");
        let entries = vec!["docs/readme.txt".to_owned()];

        let request = Request::Extract { archive: &archive, destination: &dest, conflict: None, entries: &[] };
        assert_eq!(strings(&request.args()), ["x", "/in/a.7z", "-o/out/a", "-y"]);

        let request = Request::Extract { archive: &archive, destination: &dest, conflict: Some(ConflictPolicy::SkipExisting), entries: &entries };
        assert_eq!(strings(&request.args()), ["x", "/in/a.7z", "-o/out/a", "-y", "-aos", "docs/readme.txt"]);

        let request = Request::Extract { archive: &archive, destination: &dest, conflict: Some(ConflictPolicy::OverwriteAll), entries: &[] };
        assert_eq!(strings(&request.args()), ["x", "/in/a.7z", "-o/out/a", "-y", "-aoa"]);

        let request = Request::Extract { archive: &archive, destination: &dest, conflict: Some(ConflictPolicy::AskPerFile), entries: &[] };
        assert_eq!(strings(&request.args()), ["x", "/in/a.7z", "-o/out/a"]);
    }

    #[test]
    fn test_view_args() {
        let archive = PathBuf::from("/in/a.zip");
        let secret = Secret::new("pw12");

        assert_eq!(strings(&Request::List { archive: &archive, technical: false, password: None }.args()), ["l", "/in/a.zip"]);
        assert_eq!(strings(&Request::List { archive: &archive, technical: true, password: Some(&secret) }.args()), ["l", "-slt", "/in/a.zip", "-ppw12"]);
        assert_eq!(strings(&Request::Test { archive: &archive }.args()), ["t", "/in/a.zip"]);
        assert_eq!(strings(&Request::Info { archive: &archive }.args()), ["i", "/in/a.zip"]);
    }

    #[test]
    fn test_view_actions_map_to_requests() {
        let archive = PathBuf::from("/in/a.7z");

        assert_eq!(strings(&Request::view(ViewAction::ListTechnical, &archive).args()), ["l", "-slt", "/in/a.7z"]);
        assert_eq!(Request::view(ViewAction::Test, &archive).action(), Action::Test);
        assert_eq!(Request::view(ViewAction::Info, &archive).action(), Action::Info);
    }

    #[test]
    fn test_redacted_masks_password() {
        let args: Vec<OsString> = ["a", "-mx5", "-psecret", "-mhe=on", "out.7z"].into_iter().map(OsString::from).collect();
        assert_eq!(redacted(&args), "a -mx5 -p**** -mhe=on out.7z");
    }
}

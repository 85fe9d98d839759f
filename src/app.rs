use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::awake::KeepAwake;
use crate::error::InputError;
use crate::file::PathCandidate;
use crate::gateway::{ArchiverGateway, Request};
use crate::interactive::{Session, report_missing_archiver};
use crate::naming::local_offset;
use crate::ui::display::show_tool_error;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive menu (default).
    Interactive,

    /// List the contents of an archive.
    List {
        /// Archive to list.
        archive: String,

        /// Show every property of every entry.
        #[arg(short, long)]
        technical: bool,
    },

    /// Test the integrity of an archive.
    Test {
        /// Archive to test.
        archive: String,
    },
}

#[derive(Parser)]
#[command(name = "packrat-rs", version, about = "Plan, check and run 7-Zip archive creation and extraction. Run without arguments for the interactive menu.")]
pub struct App {
    #[command(subcommand)]
    command: Option<Commands>,
}

impl App {
    pub fn init() -> Result<Self> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(Self::parse())
    }

    pub fn execute(self) -> Result<()> {
        let mut gateway = match ArchiverGateway::discover() {
            Ok(gateway) => gateway,
            Err(e) => {
                report_missing_archiver(&e);
                return Err(e).context("7-Zip is required");
            }
        };
        info!(program = %gateway.program().display(), "archiver located");

        match self.command {
            Some(Commands::List { archive, technical }) => Self::passthrough(&mut gateway, &archive, |archive| Request::List { archive, technical, password: None }),
            Some(Commands::Test { archive }) => Self::passthrough(&mut gateway, &archive, |archive| Request::Test { archive }),
            Some(Commands::Interactive) | None => Self::run_interactive(gateway),
        }
    }

    fn run_interactive(gateway: ArchiverGateway) -> Result<()> {
        let utc_offset = local_offset();
        let awake = KeepAwake::new();
        let handler_awake = awake.clone();

        ctrlc::set_handler(move || {
            handler_awake.stop();
            println!();
            println!("Goodbye!");
            std::process::exit(0);
        })
        .context("failed to install interrupt handler")?;

        Session::new(gateway, awake, utc_offset).run()
    }

    fn passthrough(gateway: &mut ArchiverGateway, raw: &str, request: impl for<'a> FnOnce(&'a Path) -> Request<'a>) -> Result<()> {
        let candidate = PathCandidate::new(raw);
        let archive = candidate.locate().ok_or_else(|| InputError::NotFound(candidate.original().to_owned()))?;

        if let Err(e) = gateway.invoke(&request(&archive)) {
            show_tool_error(&e);
            std::process::exit(e.exit_code().filter(|&code| code > 0).unwrap_or(1));
        }

        Ok(())
    }
}

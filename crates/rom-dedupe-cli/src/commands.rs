use clap::{Args, Parser, Subcommand, ValueEnum};
use rom_dedupe_core::OnConflict;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rom-dedupe")]
#[command(about = "Find and remove duplicate ROMs", long_about = None)]
pub struct Cli {
    /// Log at debug level and show parsed metadata and scores in reports
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, Default, Args)]
pub struct Verbosity {
    /// Summary only
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
    /// Per-file details
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report duplicates without touching anything
    Scan {
        /// Path to the ROMs directory
        path: PathBuf,
        #[command(flatten)]
        verbosity: Verbosity,
        /// Config file (defaults to <path>/config.json)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Also write every keep/remove decision to a CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Move duplicates to _duplicates_removed, or to the OS trash with --hard
    Apply {
        /// Path to the ROMs directory
        path: PathBuf,
        /// Send to the OS trash instead of _duplicates_removed (not restorable)
        #[arg(long)]
        hard: bool,
        /// Don't ask before a hard removal
        #[arg(short, long)]
        yes: bool,
        /// Leave groups whose keeper was a tie
        #[arg(long)]
        skip_uncertain: bool,
        #[command(flatten)]
        verbosity: Verbosity,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Move everything in _duplicates_removed back where it came from
    Restore {
        /// Path to the ROMs directory
        path: PathBuf,
        /// What to do when the original path is taken again
        #[arg(long, value_enum, default_value_t = ConflictPolicy::Skip)]
        on_conflict: ConflictPolicy,
        #[command(flatten)]
        verbosity: Verbosity,
    },
    /// Print the effective configuration for a ROMs directory
    PrintConfig {
        /// Path to the ROMs directory
        path: PathBuf,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    pub fn verbosity(&self) -> Verbosity {
        match self {
            Commands::Scan { verbosity, .. }
            | Commands::Apply { verbosity, .. }
            | Commands::Restore { verbosity, .. } => *verbosity,
            Commands::PrintConfig { .. } => Verbosity::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConflictPolicy {
    /// Keep the file that is there and the staged copy
    Skip,
    /// Replace the file that is there
    Overwrite,
    /// Delete the staged copy
    Remove,
}

impl From<ConflictPolicy> for OnConflict {
    fn from(policy: ConflictPolicy) -> Self {
        match policy {
            ConflictPolicy::Skip => OnConflict::Skip,
            ConflictPolicy::Overwrite => OnConflict::Overwrite,
            ConflictPolicy::Remove => OnConflict::Remove,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_restore_conflict_policy() {
        let cli = Cli::parse_from(["rom-dedupe", "restore", "/roms", "--on-conflict", "overwrite"]);
        match cli.command {
            Some(Commands::Restore { on_conflict, .. }) => {
                assert_eq!(OnConflict::from(on_conflict), OnConflict::Overwrite)
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        let result = Cli::try_parse_from(["rom-dedupe", "scan", "/roms", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_flag_is_global() {
        let cli = Cli::parse_from(["rom-dedupe", "scan", "/roms", "--debug", "-q"]);
        assert!(cli.debug);
        assert!(cli.command.unwrap().verbosity().quiet);
    }
}

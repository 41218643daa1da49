use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use merit_core::RecordKind;

#[derive(Parser)]
#[command(name = "merit")]
#[command(about = "Keep a merit/fault ledger from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the local data file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the JSON config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep all data in memory for this run only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a merit or a fault
    #[command(alias = "new")]
    Add {
        /// Record type
        #[arg(value_enum)]
        kind: KindArg,
        /// Weight between 1 and 1000 (presets: 1, 10, 30, 100)
        #[arg(short, long)]
        score: Option<u32>,
        /// Optional note, at most 500 characters
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List records of one day
    #[command(alias = "ls")]
    List {
        /// Day to list (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single record
    Show {
        /// Record ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing record
    Edit {
        /// Record ID
        id: String,
        /// New record type
        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,
        /// New weight
        #[arg(short, long)]
        score: Option<u32>,
        /// New note
        #[arg(short, long, conflicts_with = "clear_note")]
        note: Option<String>,
        /// Remove the note
        #[arg(long)]
        clear_note: bool,
    },
    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID
        id: String,
    },
    /// Show statistics
    Stats {
        #[command(subcommand)]
        view: Option<StatsView>,
        /// Output as JSON
        #[arg(long, global = true)]
        json: bool,
    },
    /// Push local records to the server
    Sync,
    /// Check that the backend is reachable
    Health,
    /// Inspect or write the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the server session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Subcommand)]
pub enum StatsView {
    /// Today's sums and counts
    Today,
    /// The last seven days
    Week,
    /// One month, day by day
    Month {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Lifetime totals
    Total,
    /// Fate index over the trailing window
    Fate,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file; omitted values are kept
    Init {
        /// Backend base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout_secs: Option<u64>,
        /// Records logged today before suggesting sign-in
        #[arg(long, value_name = "COUNT")]
        login_prompt_threshold: Option<usize>,
        /// Days covered by the local fate index
        #[arg(long, value_name = "DAYS")]
        fate_window_days: Option<u32>,
    },
    /// Show the effective configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Email a one-time login code
    SendCode {
        #[arg(long)]
        email: String,
    },
    /// Sign in with an emailed code
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Show the current session
    Status,
    /// Sign out, keeping local records
    Logout,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    #[value(alias = "gong")]
    Merit,
    #[value(alias = "guo")]
    Fault,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Merit => Self::Merit,
            KindArg::Fault => Self::Fault,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

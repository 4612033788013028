use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "asuka",
    version,
    about = "Asuka: a cozy planner for events, trips, todos and wishes",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "asukarc", global = true)]
    pub asukarc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Month grid with a marker per day.
    Calendar {
        /// Month to show as YYYY-MM; defaults to the selected day's month.
        month: Option<String>,
        #[arg(long)]
        select: Option<String>,
    },
    /// Everything on one day.
    Day { date: Option<String> },
    /// The next few of everything.
    Upcoming,
    #[command(subcommand)]
    Add(AddCommand),
    /// Toggle a global todo.
    Done { id: String },
    #[command(subcommand)]
    Wish(WishCommand),
    #[command(subcommand)]
    Trip(TripCommand),
    #[command(subcommand)]
    Participant(ParticipantCommand),
    /// Replace the description of an event or trip; an empty text clears it.
    Describe {
        collection: String,
        id: String,
        text: String,
    },
    /// Delete a record.
    Rm { collection: String, id: String },
    /// The mood line for a day.
    Mood { date: Option<String> },
    Version,
}

impl Command {
    /// Commands that can run as `default.command`.
    pub fn from_default_name(name: &str) -> anyhow::Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "upcoming" => Ok(Command::Upcoming),
            "calendar" => Ok(Command::Calendar {
                month: None,
                select: None,
            }),
            "day" => Ok(Command::Day { date: None }),
            "mood" => Ok(Command::Mood { date: None }),
            "version" => Ok(Command::Version),
            other => Err(anyhow!(
                "default.command must be upcoming, calendar, day, mood or version, got: {other}"
            )),
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AddCommand {
    Event(EventArgs),
    Trip(TripArgs),
    Todo(TodoArgs),
    Wish { text: String },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct EventArgs {
    pub name: String,
    #[arg(long)]
    pub start: Option<String>,
    /// Defaults to the start date.
    #[arg(long)]
    pub end: Option<String>,
    /// Start time as HH:MM.
    #[arg(long)]
    pub time: Option<String>,
    #[arg(long)]
    pub end_time: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub recurring: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TripArgs {
    pub name: String,
    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// none, daily, weekly, monthly or yearly.
    #[arg(long)]
    pub repeat: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TodoArgs {
    pub text: String,
    #[arg(long)]
    pub due: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub repeat: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WishCommand {
    Done { id: String },
    Up { id: String },
    Down { id: String },
    Rm { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TripCommand {
    /// Create the next occurrence of a recurring trip.
    Next { id: String },
    #[command(subcommand)]
    Todo(TripTodoCommand),
    Progress { id: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TripTodoCommand {
    Add {
        trip: String,
        text: String,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    /// Change the text, assignee or due date of a trip todo.
    Edit {
        trip: String,
        key: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long)]
        due: Option<String>,
    },
    Done { trip: String, key: String },
    Rm { trip: String, key: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ParticipantCommand {
    Add {
        collection: String,
        id: String,
        name: String,
        #[arg(long)]
        contact: Option<String>,
    },
    Rm {
        collection: String,
        id: String,
        key: String,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "off"
    } else if quiet == 1 {
        "error"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Lifts `rc.KEY=VALUE` and `rc.KEY:VALUE` out of the argument list.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

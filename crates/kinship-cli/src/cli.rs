//! CLI command definitions and argument parsing.

use crate::config::OutputFormat;
use clap::{Parser, Subcommand, ValueEnum};
use kinship_domain::UserId;
use std::path::PathBuf;

/// Kinship CLI - manage friendships in a local social graph.
#[derive(Debug, Parser)]
#[command(name = "kinship")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "KINSHIP_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the configuration file)
    #[arg(short, long, global = true, env = "KINSHIP_DATABASE")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliFormat {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Text => OutputFormat::Text,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate fresh user identities
    NewUser {
        /// How many identities to generate
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Propose a friendship from USER to OTHER
    Request(RequestArgs),

    /// Approve the request OTHER sent to USER
    Approve(PairArgs),

    /// Block the relationship on behalf of USER
    Block(PairArgs),

    /// Lift a block USER placed earlier
    Unblock(PairArgs),

    /// Delete the relationship (withdraw, decline or unfriend)
    Remove(PairArgs),

    /// List users related to USER
    List(ListArgs),

    /// Count USER's friends or blocked relationships
    Count(CountArgs),

    /// Friends USER and OTHER have in common
    Common(PairArgs),

    /// Show how USER and OTHER are related
    Status(PairArgs),
}

/// Two users: the actor and the counterpart.
#[derive(Debug, Parser)]
pub struct PairArgs {
    /// Acting user
    pub user: UserId,

    /// The other user
    pub other: UserId,
}

/// Arguments for the request command.
#[derive(Debug, Parser)]
pub struct RequestArgs {
    /// Requesting user
    pub user: UserId,

    /// Recipient
    pub other: UserId,

    /// Why the requester wants to connect
    #[arg(short, long)]
    pub reason: Option<String>,

    /// Message shown to the recipient
    #[arg(short, long)]
    pub greeting: Option<String>,
}

/// Which relationship list to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    /// Approved, unblocked friends
    Friends,
    /// Friends whose request USER sent
    Accepted,
    /// Friends who sent USER a request
    AcceptedBy,
    /// Requests USER sent that await an answer
    PendingSent,
    /// Requests awaiting USER's answer
    PendingReceived,
    /// Every blocked relationship
    Blocked,
    /// Users USER has blocked
    Blockades,
    /// Users who blocked USER
    BlockadesBy,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// User whose relationships to list
    pub user: UserId,

    /// Which list
    #[arg(value_enum, default_value = "friends")]
    pub kind: ListKind,
}

/// What to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CountKind {
    /// Approved, unblocked friends
    Friends,
    /// Blocked relationships
    Blocked,
}

/// Arguments for the count command.
#[derive(Debug, Parser)]
pub struct CountArgs {
    /// User whose relationships to count
    pub user: UserId,

    /// What to count
    #[arg(value_enum, default_value = "friends")]
    pub kind: CountKind,
}

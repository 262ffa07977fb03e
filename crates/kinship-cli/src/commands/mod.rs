//! Command implementations.

pub mod query;
pub mod transition;
pub mod user;

use crate::cli::Command;
use crate::error::Result;
use crate::output::Formatter;
use kinship_domain::traits::EdgeStore;
use kinship_graph::RelationshipGraph;
use kinship_store::SqliteStore;
use std::fs;
use std::path::Path;

pub use self::query::{execute_common, execute_count, execute_list, execute_status};
pub use self::transition::{execute_approve, execute_block, execute_remove, execute_request, execute_unblock};
pub use self::user::execute_new_user;

/// Open the store at `path`, creating its parent directory if needed.
pub fn open_store(path: &Path) -> Result<SqliteStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    tracing::debug!(database = %path.display(), "Opening store");
    Ok(SqliteStore::new(path)?)
}

/// Run a command, opening the database at `database` only if the command needs it.
pub fn run(command: Command, database: &Path, formatter: &Formatter) -> Result<String> {
    if let Command::NewUser { count } = command {
        return execute_new_user(count, formatter);
    }

    let graph = RelationshipGraph::new(open_store(database)?);
    execute(command, &graph, formatter)
}

/// Run a command against a graph and render its output.
pub fn execute<S>(command: Command, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    match command {
        Command::NewUser { count } => execute_new_user(count, formatter),
        Command::Request(args) => execute_request(args, graph, formatter),
        Command::Approve(args) => execute_approve(args, graph, formatter),
        Command::Block(args) => execute_block(args, graph, formatter),
        Command::Unblock(args) => execute_unblock(args, graph, formatter),
        Command::Remove(args) => execute_remove(args, graph, formatter),
        Command::List(args) => execute_list(args, graph, formatter),
        Command::Count(args) => execute_count(args, graph, formatter),
        Command::Common(args) => execute_common(args, graph, formatter),
        Command::Status(args) => execute_status(args, graph, formatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PairArgs, RequestArgs};
    use crate::config::OutputFormat;
    use kinship_domain::UserId;

    #[test]
    fn test_run_creates_missing_database_directory() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("not").join("yet").join("kinship.db");
        let formatter = Formatter::new(OutputFormat::Text);
        let (a, b) = (UserId::new(), UserId::new());

        let request = Command::Request(RequestArgs {
            user: a,
            other: b,
            reason: None,
            greeting: None,
        });
        assert_eq!(run(request, &database, &formatter).unwrap(), "✓ request");
        assert!(database.exists());

        // A second invocation sees the persisted edge
        let status = run(Command::Status(PairArgs { user: b, other: a }), &database, &formatter).unwrap();
        assert!(status.lines().next().unwrap().ends_with("pending"));
    }

    #[test]
    fn test_new_user_does_not_open_database() {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("missing").join("kinship.db");

        let output = run(
            Command::NewUser { count: 2 },
            &database,
            &Formatter::new(OutputFormat::Text),
        )
        .unwrap();

        assert_eq!(output.lines().count(), 2);
        assert!(!database.exists());
        assert!(!dir.path().join("missing").exists());
    }
}

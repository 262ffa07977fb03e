//! Transition commands: request, approve, block, unblock and remove.

use crate::cli::{PairArgs, RequestArgs};
use crate::error::Result;
use crate::output::Formatter;
use kinship_domain::traits::EdgeStore;
use kinship_graph::RelationshipGraph;

/// Execute the request command.
pub fn execute_request<S>(args: RequestArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let outcome = graph.request(args.user, args.other, args.reason, args.greeting)?;
    formatter.format_outcome("request", &outcome)
}

/// Execute the approve command.
pub fn execute_approve<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let outcome = graph.approve(args.user, args.other)?;
    formatter.format_outcome("approve", &outcome)
}

/// Execute the block command.
pub fn execute_block<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let outcome = graph.block(args.user, args.other)?;
    formatter.format_outcome("block", &outcome)
}

/// Execute the unblock command.
pub fn execute_unblock<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let outcome = graph.unblock(args.user, args.other)?;
    formatter.format_outcome("unblock", &outcome)
}

/// Execute the remove command.
pub fn execute_remove<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let outcome = graph.remove(args.user, args.other)?;
    formatter.format_outcome("remove", &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use kinship_domain::UserId;
    use kinship_graph::HookRegistry;
    use kinship_store::SqliteStore;
    use std::sync::Arc;

    fn setup() -> (RelationshipGraph<SqliteStore>, Formatter) {
        let graph = RelationshipGraph::with_hooks(
            SqliteStore::in_memory().unwrap(),
            Arc::new(HookRegistry::new()),
        );
        (graph, Formatter::new(OutputFormat::Text))
    }

    fn pair(user: UserId, other: UserId) -> PairArgs {
        PairArgs { user, other }
    }

    #[test]
    fn test_request_then_approve() {
        let (graph, formatter) = setup();
        let (a, b) = (UserId::new(), UserId::new());

        let args = RequestArgs {
            user: a,
            other: b,
            reason: None,
            greeting: Some("hello".into()),
        };
        assert_eq!(execute_request(args, &graph, &formatter).unwrap(), "✓ request");

        let out = execute_approve(pair(a, b), &graph, &formatter).unwrap();
        assert!(out.starts_with("✗ approve"), "requester cannot approve: {}", out);

        assert_eq!(execute_approve(pair(b, a), &graph, &formatter).unwrap(), "✓ approve");
        assert!(graph.friend_with(a, b).unwrap());
    }

    #[test]
    fn test_block_unblock_remove() {
        let (graph, formatter) = setup();
        let (a, b) = (UserId::new(), UserId::new());
        graph.request_friendship(a, b, None, None).unwrap();

        assert!(execute_block(pair(a, b), &graph, &formatter).unwrap().starts_with("✗"));
        assert_eq!(execute_block(pair(b, a), &graph, &formatter).unwrap(), "✓ block");
        assert!(execute_unblock(pair(a, b), &graph, &formatter).unwrap().starts_with("✗"));
        assert_eq!(execute_unblock(pair(b, a), &graph, &formatter).unwrap(), "✓ unblock");
        assert_eq!(execute_remove(pair(a, b), &graph, &formatter).unwrap(), "✓ remove");
        assert!(execute_remove(pair(a, b), &graph, &formatter).unwrap().starts_with("✗"));
    }
}

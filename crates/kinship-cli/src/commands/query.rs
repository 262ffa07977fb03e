//! Query commands: list, count, common and status.

use crate::cli::{CountArgs, CountKind, ListArgs, ListKind, PairArgs};
use crate::error::Result;
use crate::output::{Formatter, StatusReport};
use kinship_domain::traits::EdgeStore;
use kinship_graph::RelationshipGraph;

/// Execute the list command.
pub fn execute_list<S>(args: ListArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let user = args.user;
    let (label, users) = match args.kind {
        ListKind::Friends => ("friends", graph.friends(user)?),
        ListKind::Accepted => ("accepted", graph.accepted_requests(user)?),
        ListKind::AcceptedBy => ("accepted_by", graph.accepted_requests_by(user)?),
        ListKind::PendingSent => ("pending_sent", graph.pending_requests_sent(user)?),
        ListKind::PendingReceived => ("pending_received", graph.pending_requests_received(user)?),
        ListKind::Blocked => ("blocked", graph.blocked_friends(user)?),
        ListKind::Blockades => ("blockades", graph.blockades(user)?),
        ListKind::BlockadesBy => ("blockades_by", graph.blockades_by(user)?),
    };
    formatter.format_users(label, &users)
}

/// Execute the count command.
pub fn execute_count<S>(args: CountArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let (label, total) = match args.kind {
        CountKind::Friends => ("friends", graph.total_friends(args.user)?),
        CountKind::Blocked => ("blocked", graph.total_blocked_friends(args.user)?),
    };
    formatter.format_count(label, total)
}

/// Execute the common command.
pub fn execute_common<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let common = graph.common_friends_with(args.user, args.other)?;
    formatter.format_users("common_friends", &common)
}

/// Execute the status command.
pub fn execute_status<S>(args: PairArgs, graph: &RelationshipGraph<S>, formatter: &Formatter) -> Result<String>
where
    S: EdgeStore,
    S::Error: std::fmt::Display,
{
    let (user, other) = (args.user, args.other);
    let report = StatusReport {
        status: graph.status(user, other)?,
        connected: graph.connected_with(user, other)?,
        friends: graph.friend_with(user, other)?,
        pending: graph.pending_with(user, other)?,
        requested: graph.friendship_requested(user, other)?,
        requested_by: graph.friendship_requested_by(user, other)?,
        blocked: graph.friend_blocked(user, other)?,
    };
    formatter.format_status(&report)
}

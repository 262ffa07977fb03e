//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use kinship_domain::{FriendshipStatus, UserId};
use kinship_graph::Outcome;
use std::collections::BTreeSet;

/// How two users relate, as shown by `kinship status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Edge status, if an edge exists
    pub status: Option<FriendshipStatus>,
    /// Any edge exists
    pub connected: bool,
    /// Approved and unblocked
    pub friends: bool,
    /// Connected but not friends
    pub pending: bool,
    /// USER sent the request
    pub requested: bool,
    /// OTHER sent the request
    pub requested_by: bool,
    /// The edge is blocked
    pub blocked: bool,
}

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Format the result of a transition.
    pub fn format_outcome<T>(&self, action: &str, outcome: &Outcome<T>) -> Result<String> {
        let reason = outcome.rejection().map(|r| r.to_string());
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "action": action,
                "ok": outcome.succeeded(),
                "reason": reason,
            }))?),
            OutputFormat::Text => Ok(match reason {
                None => format!("✓ {}", action),
                Some(reason) => format!("✗ {}: {}", action, reason),
            }),
        }
    }

    /// Format a set of users.
    pub fn format_users(&self, label: &str, users: &BTreeSet<UserId>) -> Result<String> {
        let ids: Vec<String> = users.iter().map(ToString::to_string).collect();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "list": label,
                "users": ids,
            }))?),
            OutputFormat::Text if ids.is_empty() => Ok(format!("No {} found.", label.replace('_', " "))),
            OutputFormat::Text => Ok(ids.join("\n")),
        }
    }

    /// Format a count.
    pub fn format_count(&self, label: &str, count: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "count": label,
                "total": count,
            }))?),
            OutputFormat::Text => Ok(count.to_string()),
        }
    }

    /// Format freshly generated user identities.
    pub fn format_new_users(&self, users: &[UserId]) -> Result<String> {
        let ids: Vec<String> = users.iter().map(ToString::to_string).collect();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&ids)?),
            OutputFormat::Text => Ok(ids.join("\n")),
        }
    }

    /// Format the relationship between two users.
    pub fn format_status(&self, report: &StatusReport) -> Result<String> {
        let status = report.status.map_or("none", |s| s.as_str());
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "status": status,
                "connected": report.connected,
                "friends": report.friends,
                "pending": report.pending,
                "requested": report.requested,
                "requested_by": report.requested_by,
                "blocked": report.blocked,
            }))?),
            OutputFormat::Text => {
                let rows = [
                    ("status", status.to_string()),
                    ("connected", report.connected.to_string()),
                    ("friends", report.friends.to_string()),
                    ("pending", report.pending.to_string()),
                    ("requested", report.requested.to_string()),
                    ("requested_by", report.requested_by.to_string()),
                    ("blocked", report.blocked.to_string()),
                ];
                Ok(rows
                    .iter()
                    .map(|(key, value)| format!("{:<13}{}", key, value))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinship_domain::Rejection;

    #[test]
    fn test_text_outcome() {
        let formatter = Formatter::new(OutputFormat::Text);

        let done: Outcome<()> = Outcome::Done(());
        assert_eq!(formatter.format_outcome("approve", &done).unwrap(), "✓ approve");

        let rejected: Outcome<()> = Outcome::Rejected(Rejection::NotFound);
        let text = formatter.format_outcome("approve", &rejected).unwrap();
        assert!(text.starts_with("✗ approve: "));
        assert!(text.contains("no relationship"));
    }

    #[test]
    fn test_json_outcome() {
        let formatter = Formatter::new(OutputFormat::Json);
        let rejected: Outcome<()> = Outcome::Rejected(Rejection::SelfRelationship);

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_outcome("request", &rejected).unwrap()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["action"], "request");
        assert!(value["reason"].as_str().unwrap().contains("themselves"));
    }

    #[test]
    fn test_empty_user_list() {
        let formatter = Formatter::new(OutputFormat::Text);
        assert_eq!(
            formatter.format_users("pending_sent", &BTreeSet::new()).unwrap(),
            "No pending sent found."
        );
    }

    #[test]
    fn test_json_users() {
        let formatter = Formatter::new(OutputFormat::Json);
        let user = UserId::from_value(7);
        let value: serde_json::Value = serde_json::from_str(
            &formatter.format_users("friends", &BTreeSet::from([user])).unwrap(),
        )
        .unwrap();
        assert_eq!(value["users"][0], user.to_string());
    }

    #[test]
    fn test_status_text_has_every_row() {
        let formatter = Formatter::new(OutputFormat::Text);
        let report = StatusReport {
            status: Some(FriendshipStatus::Pending),
            connected: true,
            friends: false,
            pending: true,
            requested: true,
            requested_by: false,
            blocked: false,
        };

        let text = formatter.format_status(&report).unwrap();
        assert_eq!(text.lines().count(), 7);
        assert!(text.starts_with("status       pending"));
    }
}

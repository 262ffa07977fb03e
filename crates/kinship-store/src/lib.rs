//! Kinship Storage Layer
//!
//! Implements the EdgeStore trait on SQLite.
//!
//! # Architecture
//!
//! - One row per unordered user pair in the `friendships` table
//! - A unique index on the canonical (min, max) ordering of the pair, so the
//!   database itself rejects a second edge in either direction
//! - Compare-and-set updates: a mutation only lands if the row still holds
//!   the flags the caller read
//!
//! # Examples
//!
//! ```no_run
//! use kinship_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for edge operations
//! ```

#![warn(missing_docs)]

use kinship_domain::traits::{EdgeQuery, EdgeStore, InsertOutcome, RoleFilter, UpdateOutcome};
use kinship_domain::{EdgeId, EdgeState, EdgeUpdate, Friendship, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

const EDGE_COLUMNS: &str = "id, requester_id, recipient_id, pending, blocker_id, reason, greeting, created_at, updated_at";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A thread panicked while holding the connection
    #[error("Connection lock poisoned")]
    LockPoisoned,
}

/// SQLite-based implementation of EdgeStore
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so one store can be shared across
/// threads. Every trait method runs under a single lock acquisition, which
/// makes each compare-and-set atomic with respect to other callers of the
/// same store. Uniqueness across processes is still guaranteed by the index.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use kinship_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("kinship.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a store backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn bytes_to_id(bytes: &[u8], column: usize) -> Result<u128, rusqlite::Error> {
        let arr: [u8; 16] = bytes.try_into().map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Blob,
                Box::new(StoreError::InvalidData(format!(
                    "Expected 16 bytes for id, got {}",
                    bytes.len()
                ))),
            )
        })?;
        Ok(u128::from_be_bytes(arr))
    }

    fn user_column(row: &Row<'_>, column: usize) -> Result<UserId, rusqlite::Error> {
        let bytes: Vec<u8> = row.get(column)?;
        Self::bytes_to_id(&bytes, column).map(UserId::from_value)
    }

    fn row_to_friendship(row: &Row<'_>) -> Result<Friendship, rusqlite::Error> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let blocker = match row.get::<_, Option<Vec<u8>>>(4)? {
            Some(bytes) => Some(UserId::from_value(Self::bytes_to_id(&bytes, 4)?)),
            None => None,
        };

        Ok(Friendship {
            id: EdgeId::from_value(Self::bytes_to_id(&id_bytes, 0)?),
            requester: Self::user_column(row, 1)?,
            recipient: Self::user_column(row, 2)?,
            pending: row.get(3)?,
            blocker,
            reason: row.get(5)?,
            greeting: row.get(6)?,
            created_at: row.get::<_, i64>(7)? as u64,
            updated_at: row.get::<_, i64>(8)? as u64,
        })
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }

    fn current_timestamp() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    /// Build the WHERE clause and parameters for a query
    fn where_clause(query: &EdgeQuery) -> (String, Vec<Box<dyn ToSql>>) {
        let mut sql = String::from(" WHERE 1=1");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(user) = query.user {
            let bytes = Self::id_to_bytes(user.value());
            match query.role {
                RoleFilter::Requester => sql.push_str(" AND requester_id = ?"),
                RoleFilter::Recipient => sql.push_str(" AND recipient_id = ?"),
                RoleFilter::Either => {
                    sql.push_str(" AND (requester_id = ? OR recipient_id = ?)");
                    params.push(Box::new(bytes.clone()));
                }
            }
            params.push(Box::new(bytes));
        }

        if let Some(pending) = query.pending {
            sql.push_str(" AND pending = ?");
            params.push(Box::new(pending));
        }

        match query.blocked {
            Some(true) => sql.push_str(" AND blocker_id IS NOT NULL"),
            Some(false) => sql.push_str(" AND blocker_id IS NULL"),
            None => {}
        }

        if let Some(blocker) = query.blocker {
            sql.push_str(" AND blocker_id = ?");
            params.push(Box::new(Self::id_to_bytes(blocker.value())));
        }

        if query.exclude_degenerate {
            sql.push_str(" AND requester_id <> recipient_id");
        }

        (sql, params)
    }

    fn select_one(
        conn: &Connection,
        condition: &str,
        params: &[&dyn ToSql],
    ) -> Result<Option<Friendship>, StoreError> {
        let sql = format!("SELECT {} FROM friendships WHERE {}", EDGE_COLUMNS, condition);
        let edge = conn
            .query_row(&sql, params, Self::row_to_friendship)
            .optional()?;
        Ok(edge)
    }
}

impl EdgeStore for SqliteStore {
    type Error = StoreError;

    fn insert_edge(&self, edge: Friendship) -> Result<InsertOutcome, Self::Error> {
        let low = edge.requester.min(edge.recipient);
        let high = edge.requester.max(edge.recipient);
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO friendships (id, requester_id, recipient_id, low_id, high_id, pending, blocker_id, reason, greeting, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                Self::id_to_bytes(edge.id.value()),
                Self::id_to_bytes(edge.requester.value()),
                Self::id_to_bytes(edge.recipient.value()),
                Self::id_to_bytes(low.value()),
                Self::id_to_bytes(high.value()),
                edge.pending,
                edge.blocker.map(|b| Self::id_to_bytes(b.value())),
                &edge.reason,
                &edge.greeting,
                edge.created_at as i64,
                edge.updated_at as i64,
            ],
        );

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(edge.id)),
            Err(e) if Self::is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    fn get_edge(&self, id: EdgeId) -> Result<Option<Friendship>, Self::Error> {
        let conn = self.conn()?;
        Self::select_one(&conn, "id = ?1", &[&Self::id_to_bytes(id.value())])
    }

    fn find_by_pair(&self, a: UserId, b: UserId) -> Result<Option<Friendship>, Self::Error> {
        let conn = self.conn()?;
        Self::select_one(
            &conn,
            "low_id = ?1 AND high_id = ?2",
            &[
                &Self::id_to_bytes(a.min(b).value()),
                &Self::id_to_bytes(a.max(b).value()),
            ],
        )
    }

    fn find_directed(
        &self,
        requester: UserId,
        recipient: UserId,
    ) -> Result<Option<Friendship>, Self::Error> {
        let conn = self.conn()?;
        Self::select_one(
            &conn,
            "requester_id = ?1 AND recipient_id = ?2",
            &[
                &Self::id_to_bytes(requester.value()),
                &Self::id_to_bytes(recipient.value()),
            ],
        )
    }

    fn update_edge(
        &self,
        id: EdgeId,
        expected: EdgeState,
        update: EdgeUpdate,
    ) -> Result<UpdateOutcome, Self::Error> {
        let next = update.apply(expected);
        let id_bytes = Self::id_to_bytes(id.value());
        let conn = self.conn()?;

        let changed = conn.execute(
            "UPDATE friendships SET pending = ?1, blocker_id = ?2, updated_at = ?3
             WHERE id = ?4 AND pending = ?5 AND blocker_id IS ?6",
            params![
                next.pending,
                next.blocker.map(|b| Self::id_to_bytes(b.value())),
                Self::current_timestamp() as i64,
                &id_bytes,
                expected.pending,
                expected.blocker.map(|b| Self::id_to_bytes(b.value())),
            ],
        )?;

        if changed > 0 {
            return Ok(UpdateOutcome::Applied);
        }

        // Nothing matched: either the row is gone or its flags moved on
        let exists = conn
            .query_row(
                "SELECT 1 FROM friendships WHERE id = ?1",
                params![&id_bytes],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        Ok(if exists {
            UpdateOutcome::Conflict
        } else {
            UpdateOutcome::NotFound
        })
    }

    fn delete_edge(&self, id: EdgeId) -> Result<bool, Self::Error> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM friendships WHERE id = ?1",
            params![Self::id_to_bytes(id.value())],
        )?;
        Ok(deleted > 0)
    }

    fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<Friendship>, Self::Error> {
        let (clause, mut params) = Self::where_clause(query);
        let mut sql = format!(
            "SELECT {} FROM friendships{} ORDER BY created_at, id",
            EDGE_COLUMNS, clause
        );

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let edges = stmt
            .query_map(&param_refs[..], Self::row_to_friendship)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    fn count_edges(&self, query: &EdgeQuery) -> Result<usize, Self::Error> {
        let (clause, params) = Self::where_clause(query);
        let sql = format!("SELECT COUNT(*) FROM friendships{}", clause);

        let conn = self.conn()?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let count: i64 = conn.query_row(&sql, &param_refs[..], |row| row.get(0))?;

        let count = match query.limit {
            Some(limit) => (count as usize).min(limit),
            None => count as usize,
        };
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_bytes_roundtrip() {
        let value = u128::MAX - 12345;
        let bytes = SqliteStore::id_to_bytes(value);
        assert_eq!(bytes.len(), 16);
        assert_eq!(SqliteStore::bytes_to_id(&bytes, 0).unwrap(), value);
    }

    #[test]
    fn test_bytes_to_id_rejects_wrong_length() {
        assert!(SqliteStore::bytes_to_id(&[1, 2, 3], 0).is_err());
    }

    #[test]
    fn test_where_clause_either_role_binds_user_twice() {
        let query = EdgeQuery::for_user(UserId::from_value(1), RoleFilter::Either).pending(false);
        let (sql, params) = SqliteStore::where_clause(&query);

        assert!(sql.contains("requester_id = ? OR recipient_id = ?"));
        assert!(sql.contains("requester_id <> recipient_id"));
        assert_eq!(params.len(), 3);
    }
}

//! New-user command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use kinship_domain::UserId;

/// Execute the new-user command.
pub fn execute_new_user(count: usize, formatter: &Formatter) -> Result<String> {
    if count == 0 {
        return Err(CliError::InvalidInput("count must be at least 1".to_string()));
    }
    let users: Vec<UserId> = (0..count).map(|_| UserId::new()).collect();
    formatter.format_new_users(&users)
}

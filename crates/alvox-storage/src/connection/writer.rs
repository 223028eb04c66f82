//! BEGIN IMMEDIATE transactions.

use alvox_core::errors::StorageError;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Run `f` inside a `BEGIN IMMEDIATE` transaction. The write lock is taken
/// up front; any error from `f` drops the transaction and rolls back.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> Result<T, StorageError>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, StorageError>,
{
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(|e| {
        StorageError::SqliteError {
            message: format!("failed to begin immediate transaction: {e}"),
        }
    })?;

    let result = f(&tx)?;

    tx.commit().map_err(|e| StorageError::SqliteError {
        message: format!("failed to commit: {e}"),
    })?;

    Ok(result)
}

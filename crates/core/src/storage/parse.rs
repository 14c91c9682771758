//! Database value parsing utilities
//!
//! SQLite integers are signed; ids and timestamps are unsigned in the model.

use rusqlite::types::Type;
use rusqlite::Error as SqlError;

/// Convert a stored integer column into an unsigned value
pub fn parse_u64(value: i64, column: usize) -> Result<u64, SqlError> {
    u64::try_from(value)
        .map_err(|e| SqlError::FromSqlConversionFailure(column, Type::Integer, Box::new(e)))
}

/// Convert an unsigned value for storage
pub fn to_i64(value: u64) -> Result<i64, SqlError> {
    i64::try_from(value).map_err(|e| SqlError::ToSqlConversionFailure(Box::new(e)))
}

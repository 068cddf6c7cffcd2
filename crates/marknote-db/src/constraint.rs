//! Translation of constraint violations into domain errors.
//!
//! The schema enforces uniqueness and ownership (composite foreign keys carry
//! the owner id), so a failed insert tells us which domain rule was broken.

use sqlx::error::ErrorKind;

use marknote_core::Error;

/// Map a failed write to a domain error.
///
/// Unique violations become `on_unique`, foreign key violations become
/// `on_foreign_key`, and anything else stays a database error.
pub(crate) fn map_violation(err: sqlx::Error, on_unique: Error, on_foreign_key: Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.kind() {
            ErrorKind::UniqueViolation => return on_unique,
            ErrorKind::ForeignKeyViolation => return on_foreign_key,
            _ => {}
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = map_violation(
            sqlx::Error::RowNotFound,
            Error::DuplicateNote("t".to_string()),
            Error::Unauthorized("f".to_string()),
        );
        assert!(matches!(err, Error::Database(sqlx::Error::RowNotFound)));
    }
}

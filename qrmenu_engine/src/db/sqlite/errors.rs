use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::db::traits::GatewayError;

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("Could not run migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Menu item {0} does not exist")]
    MenuItemNotFound(i64),
    #[error("Inventory item {0} does not exist")]
    InventoryItemNotFound(i64),
}

// Raised by `RAISE(ABORT, ..)` in a trigger
const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

impl From<SqliteDatabaseError> for GatewayError {
    fn from(e: SqliteDatabaseError) -> Self {
        if let SqliteDatabaseError::DriverError(sqlx::Error::Database(db_err)) = &e {
            match db_err.kind() {
                ErrorKind::UniqueViolation => return GatewayError::Duplicate(db_err.message().to_string()),
                ErrorKind::CheckViolation | ErrorKind::ForeignKeyViolation | ErrorKind::NotNullViolation => {
                    return GatewayError::ConstraintViolation(db_err.message().to_string())
                },
                _ if db_err.code().as_deref() == Some(SQLITE_CONSTRAINT_TRIGGER) => {
                    return GatewayError::ConstraintViolation(db_err.message().to_string())
                },
                _ => {},
            }
        }
        match e {
            SqliteDatabaseError::DriverError(e) => GatewayError::DriverError(e.to_string()),
            SqliteDatabaseError::MigrationError(e) => GatewayError::DriverError(e.to_string()),
            SqliteDatabaseError::MenuItemNotFound(id) => GatewayError::NotFound(format!("Menu item {id}")),
            SqliteDatabaseError::InventoryItemNotFound(id) => GatewayError::NotFound(format!("Inventory item {id}")),
            SqliteDatabaseError::QueryError(s) => GatewayError::QueryError(s),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(e: sqlx::Error) -> Self {
        SqliteDatabaseError::from(e).into()
    }
}

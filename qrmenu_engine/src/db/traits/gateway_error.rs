use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Database driver error: {0}")]
    DriverError(String),
    #[error("Database query error: {0}")]
    QueryError(String),
    #[error("{0} does not exist")]
    NotFound(String),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("The write would violate a data constraint: {0}")]
    ConstraintViolation(String),
}

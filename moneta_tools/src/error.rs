use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonetaApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Moneta is unavailable: {0}")]
    Unavailable(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Insufficient funds on {account_id}: balance {balance}, requested {requested}, minimum balance must be maintained")]
    InsufficientFunds {
        account_id: String,
        balance: Decimal,
        requested: Decimal,
    },
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Database error: {0}")]
    Store(#[from] sea_orm::DbErr),
}

impl EngineError {
    pub fn table_not_found(table: &str) -> Self {
        EngineError::NotFound(format!("table '{}'", table))
    }

    pub fn column_not_found(table: &str, column: &str) -> Self {
        EngineError::NotFound(format!("column '{}' in table '{}'", column, table))
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

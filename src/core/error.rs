use crate::core::types::{CustomerId, CustomerState, TableId};
use thiserror::Error;

/// Reasons a diner operation was rejected.
///
/// Player-intent rejections are expected gameplay outcomes; the public
/// operations log them and report `false` instead of propagating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DinerError {
    #[error("customer {0} is not in the waiting list")]
    CustomerNotWaiting(CustomerId),

    #[error("customer {0} is not seated or waiting")]
    UnknownCustomer(CustomerId),

    #[error("table {0} does not exist")]
    UnknownTable(TableId),

    #[error("table {0} is already occupied")]
    TableOccupied(TableId),

    #[error("table {0} is not occupied")]
    TableNotOccupied(TableId),

    #[error("table {table} seats {seated}, not customer {requested}")]
    WrongCustomer {
        table: TableId,
        seated: CustomerId,
        requested: CustomerId,
    },

    #[error("customer {customer} is {actual}, expected {expected}")]
    WrongState {
        customer: CustomerId,
        expected: CustomerState,
        actual: CustomerState,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn thread: {0}")]
    ThreadSpawn(String),
}

pub type DinerResult<T> = Result<T, DinerError>;

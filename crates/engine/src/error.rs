//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`InvalidTransactionState`] thrown when a [`Transaction`] is built from
//!   legs that cannot describe a money movement.
//! - [`IllegalTransition`] thrown when an update would turn a remittance into
//!   an income/expense or vice versa.
//! - [`EntityNotFound`] thrown when a referenced row does not exist anymore.
//! - [`ConcurrentModification`] thrown when a wallet changed between the read
//!   of its balance and the write of the new one.
//! - [`Storage`] wraps any failure of the backing database.
//!
//!  [`InvalidTransactionState`]: EngineError::InvalidTransactionState
//!  [`IllegalTransition`]: EngineError::IllegalTransition
//!  [`EntityNotFound`]: EngineError::EntityNotFound
//!  [`ConcurrentModification`]: EngineError::ConcurrentModification
//!  [`Storage`]: EngineError::Storage
//!  [`Transaction`]: super::transactions::Transaction
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

use crate::TransactionKind;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid transaction state: {0}")]
    InvalidTransactionState(String),
    #[error("Transaction {transaction_id} cannot change from {from} to {to}")]
    IllegalTransition {
        transaction_id: Uuid,
        from: TransactionKind,
        to: TransactionKind,
    },
    #[error("{entity} \"{id}\" not found!")]
    EntityNotFound { entity: &'static str, id: String },
    #[error("Wallet \"{wallet_id}\" was modified concurrently")]
    ConcurrentModification { wallet_id: Uuid },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Storage(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::EntityNotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidTransactionState(a), Self::InvalidTransactionState(b)) => a == b,
            (
                Self::IllegalTransition {
                    transaction_id: a_id,
                    from: a_from,
                    to: a_to,
                },
                Self::IllegalTransition {
                    transaction_id: b_id,
                    from: b_from,
                    to: b_to,
                },
            ) => a_id == b_id && a_from == b_from && a_to == b_to,
            (
                Self::EntityNotFound {
                    entity: a_entity,
                    id: a_id,
                },
                Self::EntityNotFound {
                    entity: b_entity,
                    id: b_id,
                },
            ) => a_entity == b_entity && a_id == b_id,
            (
                Self::ConcurrentModification { wallet_id: a },
                Self::ConcurrentModification { wallet_id: b },
            ) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::Storage(a), Self::Storage(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

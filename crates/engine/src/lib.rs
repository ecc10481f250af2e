//! Ledger engine of the purse budgeting app.
//!
//! The engine keeps wallet balances consistent with the transactions that
//! move money in, out of and between them. Every write goes through
//! [`Engine`], which validates the change, reconciles the affected balances
//! and persists everything inside a single database transaction.

pub use categories::{Category, CategoryKind};
pub use currency::Currency;
pub use error::EngineError;
pub use money::Money;
pub use ops::{Engine, EngineBuilder, ListOrder};
pub use reconcile::{Change, WalletDelta, check_transition, wallet_deltas};
pub use transactions::{DateRange, Leg, Movement, Transaction, TransactionKind, TransactionParts};
pub use wallets::{NewWallet, Wallet, WalletPatch};

mod categories;
mod currency;
mod error;
mod money;
mod ops;
mod reconcile;
mod transactions;
mod util;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;

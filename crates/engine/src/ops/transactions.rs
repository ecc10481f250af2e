use sea_orm::{ConnectionTrait, TransactionTrait};
use tracing::debug;
use uuid::Uuid;

use crate::{
    Change, DateRange, EngineError, ResultEngine, Transaction, categories, transactions,
    wallet_deltas,
};

use super::{Engine, balances::apply_wallet_deltas, with_tx};

async fn ensure_category<C: ConnectionTrait>(db: &C, tx: &Transaction) -> ResultEngine<()> {
    if let Some(category_id) = tx.category_id()
        && !categories::exists(db, category_id).await?
    {
        return Err(EngineError::not_found("category", category_id));
    }
    Ok(())
}

impl Engine {
    /// Stores a new transaction and applies its legs to the wallet balances.
    ///
    /// Returns the stored transaction with freshly loaded wallet snapshots, so
    /// it can be passed back as a trusted `old` value.
    pub async fn create_transaction(
        &self,
        tx: Transaction,
        trusted_source: bool,
    ) -> ResultEngine<Transaction> {
        let deltas = wallet_deltas(Change::Create(&tx))?;
        let created = with_tx!(self, |db_tx| {
            ensure_category(&db_tx, &tx).await?;
            apply_wallet_deltas(&db_tx, &deltas, trusted_source).await?;
            transactions::insert(&db_tx, &tx).await?;
            transactions::find_by_id(&db_tx, tx.id)
                .await?
                .ok_or_else(|| EngineError::not_found("transaction", tx.id))
        })?;
        debug!(
            transaction_id = %created.id,
            kind = %created.kind(),
            wallets = deltas.len(),
            trusted_source,
            "transaction created"
        );
        Ok(created)
    }

    /// Replaces `old` with `new` and moves the balances by the difference.
    ///
    /// A remittance cannot become an income or an expense and vice versa.
    pub async fn update_transaction(
        &self,
        old: &Transaction,
        new: &Transaction,
        trusted_source: bool,
    ) -> ResultEngine<()> {
        let deltas = wallet_deltas(Change::Update { old, new })?;
        with_tx!(self, |db_tx| {
            ensure_category(&db_tx, new).await?;
            apply_wallet_deltas(&db_tx, &deltas, trusted_source).await?;
            transactions::update(&db_tx, new).await?;
            Ok::<(), EngineError>(())
        })?;
        debug!(
            transaction_id = %new.id,
            from = %old.kind(),
            to = %new.kind(),
            wallets = deltas.len(),
            trusted_source,
            "transaction updated"
        );
        Ok(())
    }

    /// Deletes a transaction and reverts its legs.
    pub async fn remove_transaction(
        &self,
        tx: &Transaction,
        trusted_source: bool,
    ) -> ResultEngine<()> {
        let deltas = wallet_deltas(Change::Remove(tx))?;
        with_tx!(self, |db_tx| {
            apply_wallet_deltas(&db_tx, &deltas, trusted_source).await?;
            transactions::delete(&db_tx, tx.id).await?;
            Ok::<(), EngineError>(())
        })?;
        debug!(
            transaction_id = %tx.id,
            kind = %tx.kind(),
            wallets = deltas.len(),
            trusted_source,
            "transaction removed"
        );
        Ok(())
    }

    /// Return a transaction with the current rows of its wallets.
    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        transactions::find_by_id(&self.database, transaction_id)
            .await?
            .ok_or_else(|| EngineError::not_found("transaction", transaction_id))
    }

    /// Return the transactions occurred within `range`, newest first.
    pub async fn transactions(&self, range: DateRange) -> ResultEngine<Vec<Transaction>> {
        transactions::find_in_range(&self.database, range).await
    }
}

use sea_orm::{
    ActiveValue, Order, QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    EngineError, NewWallet, ResultEngine, Wallet, WalletPatch, currency, transactions,
    util::{normalize_optional_text, normalize_required_name},
    wallets,
};

use super::{Engine, ListOrder, with_tx};

impl Engine {
    /// Return a wallet snapshot from DB.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        wallets::find_by_id(&self.database, wallet_id)
            .await?
            .ok_or_else(|| EngineError::not_found("wallet", wallet_id))
    }

    /// Return the wallets sorted by `order`.
    ///
    /// Hidden wallets are left out unless `show_hidden` is set.
    pub async fn wallets(&self, order: ListOrder, show_hidden: bool) -> ResultEngine<Vec<Wallet>> {
        let mut query = wallets::Entity::find();
        if !show_hidden {
            query = query.filter(wallets::Column::IsHidden.eq(false));
        }
        query = match order {
            ListOrder::Custom => query.order_by_asc(wallets::Column::Ordering),
            ListOrder::Alphanumeric => query.order_by(Expr::cust("LOWER(name)"), Order::Asc),
            ListOrder::AsAdded => query.order_by(Expr::cust("rowid"), Order::Asc),
        };
        query
            .order_by_asc(wallets::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Wallet::try_from)
            .collect()
    }

    /// Add a new wallet at the bottom of the custom ordering.
    pub async fn new_wallet(&self, new: NewWallet) -> ResultEngine<Wallet> {
        let name = normalize_required_name(&new.name, "wallet")?;
        let note = normalize_optional_text(new.note.as_deref())?;
        let currency_code = new.currency_code.trim().to_uppercase();

        let wallet = with_tx!(self, |db_tx| {
            if currency::Entity::find_by_id(currency_code.clone())
                .one(&db_tx)
                .await?
                .is_none()
            {
                return Err(EngineError::not_found("currency", currency_code));
            }

            let last = wallets::Entity::find()
                .order_by_desc(wallets::Column::Ordering)
                .one(&db_tx)
                .await?;
            let ordering = last.map_or(0, |model| model.ordering.saturating_add(1));

            let wallet = Wallet {
                id: Uuid::new_v4(),
                currency_code,
                balance: new.opening_balance,
                name,
                icon_code: new.icon_code,
                is_reserved: new.is_reserved,
                is_hidden: new.is_hidden,
                ordering,
                note,
                version: 0,
            };
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;
            Ok::<_, EngineError>(wallet)
        })?;
        debug!(wallet_id = %wallet.id, name = %wallet.name, "wallet created");
        Ok(wallet)
    }

    /// Edit the display metadata of a wallet. Balance and currency never
    /// change here.
    pub async fn update_wallet(&self, wallet_id: Uuid, patch: WalletPatch) -> ResultEngine<Wallet> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "wallet"))
            .transpose()?;
        let note = patch
            .note
            .as_ref()
            .map(|note| normalize_optional_text(note.as_deref()))
            .transpose()?;

        let wallet = with_tx!(self, |db_tx| {
            let current = wallets::find_by_id(&db_tx, wallet_id)
                .await?
                .ok_or_else(|| EngineError::not_found("wallet", wallet_id))?;

            let model = wallets::ActiveModel {
                id: ActiveValue::Set(current.id.to_string()),
                name: ActiveValue::Set(name.unwrap_or(current.name)),
                icon_code: ActiveValue::Set(patch.icon_code.unwrap_or(current.icon_code)),
                is_reserved: ActiveValue::Set(patch.is_reserved.unwrap_or(current.is_reserved)),
                is_hidden: ActiveValue::Set(patch.is_hidden.unwrap_or(current.is_hidden)),
                ordering: ActiveValue::Set(patch.ordering.unwrap_or(current.ordering)),
                note: ActiveValue::Set(note.unwrap_or(current.note)),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Wallet::try_from(model)
        })?;
        debug!(wallet_id = %wallet.id, "wallet updated");
        Ok(wallet)
    }

    /// Delete a wallet together with every transaction that has a leg on it.
    ///
    /// Balances of the other wallets involved are left untouched. Returns the
    /// number of deleted transactions.
    pub async fn remove_wallet(&self, wallet_id: Uuid) -> ResultEngine<u64> {
        let removed = with_tx!(self, |db_tx| {
            if wallets::find_by_id(&db_tx, wallet_id).await?.is_none() {
                return Err(EngineError::not_found("wallet", wallet_id));
            }
            let removed = transactions::delete_by_wallet(&db_tx, wallet_id).await?;
            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok::<_, EngineError>(removed)
        })?;
        debug!(wallet_id = %wallet_id, transactions = removed, "wallet removed");
        Ok(removed)
    }
}

use sea_orm::{QueryOrder, QuerySelect, prelude::*};

use crate::{Currency, ResultEngine, currency, wallets};

impl super::Engine {
    /// Return every known currency, sorted by code.
    pub async fn currencies(&self) -> ResultEngine<Vec<Currency>> {
        Ok(currency::Entity::find()
            .order_by_asc(currency::Column::Code)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Currency::from)
            .collect())
    }

    /// Return the currencies used by at least one wallet, sorted by code.
    pub async fn preferred_currencies(&self) -> ResultEngine<Vec<Currency>> {
        Ok(currency::Entity::find()
            .inner_join(wallets::Entity)
            .distinct()
            .order_by_asc(currency::Column::Code)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Currency::from)
            .collect())
    }

    /// Return a currency by its ISO-4217 code.
    pub async fn currency(&self, code: &str) -> ResultEngine<Currency> {
        let code = code.trim().to_uppercase();
        currency::Entity::find_by_id(code.clone())
            .one(&self.database)
            .await?
            .map(Currency::from)
            .ok_or_else(|| crate::EngineError::not_found("currency", code))
    }
}

//! Seeds the currencies wallets can be opened in.

use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;

use super::m20261019_000000_init::Currencies;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `(code, symbol, is_prefix)`
const CURRENCIES: [(&str, &str, bool); 5] = [
    ("USD", "$", true),
    ("EUR", "€", true),
    ("BYN", "Br", false),
    ("RUB", "₽", true),
    ("PLN", "zł", false),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut stmt = Query::insert()
            .into_table(Currencies::Table)
            .columns([Currencies::Code, Currencies::Symbol, Currencies::IsPrefix])
            .on_conflict(OnConflict::column(Currencies::Code).do_nothing().to_owned())
            .to_owned();
        for (code, symbol, is_prefix) in CURRENCIES {
            stmt.values_panic([code.into(), symbol.into(), is_prefix.into()]);
        }

        let db = manager.get_connection();
        let backend = db.get_database_backend();
        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let codes = CURRENCIES.map(|(code, _, _)| code);
        let stmt = Query::delete()
            .from_table(Currencies::Table)
            .and_where(Expr::col(Currencies::Code).is_in(codes))
            .to_owned();

        let db = manager.get_connection();
        let backend = db.get_database_backend();
        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}

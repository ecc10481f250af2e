//! The module contains `Wallet` struct and its storage.

use std::collections::HashMap;

use sea_orm::{ActiveValue, QueryFilter, entity::prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

/// A wallet.
///
/// A wallet is a container of money in a single currency: cash, a bank
/// account or anything else where money is kept. Its balance only moves
/// through transaction reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    pub id: Uuid,
    /// ISO-4217 code of the wallet currency. Fixed once the wallet exists.
    pub currency_code: String,
    pub balance: Money,
    pub name: String,
    /// Icon name shared by every client. Empty means "default icon".
    pub icon_code: String,
    /// Reserved wallets are left out of daily budget figures.
    pub is_reserved: bool,
    /// Hidden wallets only show up through their transactions.
    pub is_hidden: bool,
    /// Position in the user-defined list order.
    pub ordering: i32,
    pub note: Option<String>,
    /// Row version, bumped by every balance write.
    ///
    /// A snapshot whose version is behind the stored one is stale and its
    /// balance must not be trusted.
    pub version: i64,
}

/// Input for creating a wallet.
#[derive(Clone, Debug, Default)]
pub struct NewWallet {
    pub currency_code: String,
    pub name: String,
    pub opening_balance: Money,
    pub icon_code: String,
    pub is_reserved: bool,
    pub is_hidden: bool,
    pub note: Option<String>,
}

/// Display metadata of a wallet that can be edited after creation.
///
/// Balance and currency are intentionally absent.
#[derive(Clone, Debug, Default)]
pub struct WalletPatch {
    pub name: Option<String>,
    pub icon_code: Option<String>,
    pub is_reserved: Option<bool>,
    pub is_hidden: Option<bool>,
    pub ordering: Option<i32>,
    /// `Some(None)` clears the note.
    pub note: Option<Option<String>>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub currency_code: String,
    pub balance: i64,
    pub name: String,
    pub icon_code: String,
    pub is_reserved: bool,
    pub is_hidden: bool,
    pub ordering: i32,
    pub note: Option<String>,
    pub version: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::currency::Entity",
        from = "Column::CurrencyCode",
        to = "super::currency::Column::Code",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Currency,
}

impl Related<super::currency::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currency.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            currency_code: ActiveValue::Set(value.currency_code.clone()),
            balance: ActiveValue::Set(value.balance.minor()),
            name: ActiveValue::Set(value.name.clone()),
            icon_code: ActiveValue::Set(value.icon_code.clone()),
            is_reserved: ActiveValue::Set(value.is_reserved),
            is_hidden: ActiveValue::Set(value.is_hidden),
            ordering: ActiveValue::Set(value.ordering),
            note: ActiveValue::Set(value.note.clone()),
            version: ActiveValue::Set(value.version),
        }
    }
}

impl TryFrom<Model> for Wallet {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "wallet")?,
            currency_code: model.currency_code,
            balance: Money::from_minor(model.balance),
            name: model.name,
            icon_code: model.icon_code,
            is_reserved: model.is_reserved,
            is_hidden: model.is_hidden,
            ordering: model.ordering,
            note: model.note,
            version: model.version,
        })
    }
}

/// Loads the current row of a wallet.
pub(crate) async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    wallet_id: Uuid,
) -> ResultEngine<Option<Wallet>> {
    Entity::find_by_id(wallet_id.to_string())
        .one(db)
        .await?
        .map(Wallet::try_from)
        .transpose()
}

/// Loads several wallets at once, keyed by id. Missing ids are skipped.
pub(crate) async fn find_many<C: ConnectionTrait>(
    db: &C,
    wallet_ids: impl IntoIterator<Item = Uuid>,
) -> ResultEngine<HashMap<Uuid, Wallet>> {
    let ids: Vec<String> = wallet_ids.into_iter().map(|id| id.to_string()).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut out = HashMap::with_capacity(ids.len());
    for model in Entity::find().filter(Column::Id.is_in(ids)).all(db).await? {
        let wallet = Wallet::try_from(model)?;
        out.insert(wallet.id, wallet);
    }
    Ok(out)
}

/// Writes a new balance for a wallet whose row is still at `expected_version`.
///
/// Returns `false` when no row matched: either the wallet is gone or another
/// writer bumped its version in the meantime.
pub(crate) async fn update_balance<C: ConnectionTrait>(
    db: &C,
    wallet_id: Uuid,
    expected_version: i64,
    new_balance: Money,
) -> ResultEngine<bool> {
    let result = Entity::update_many()
        .col_expr(Column::Balance, Expr::value(new_balance.minor()))
        .col_expr(Column::Version, Expr::col(Column::Version).add(1))
        .filter(Column::Id.eq(wallet_id.to_string()))
        .filter(Column::Version.eq(expected_version))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

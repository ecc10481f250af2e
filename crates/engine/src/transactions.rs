//! Transaction primitives.
//!
//! A [`Transaction`] moves money through at most two [`Leg`]s:
//!
//! - a *source* leg, charging a wallet,
//! - a *destination* leg, crediting a wallet.
//!
//! Which legs are present decides the [`TransactionKind`]:
//!
//! | source | destination | kind         |
//! |--------|-------------|--------------|
//! | -      | set         | `Income`     |
//! | set    | -           | `Expense`    |
//! | set    | set         | `Remittance` |
//!
//! The kind is never stored: the legs live inside a [`Movement`] variant, so a
//! transaction without legs, or whose kind disagrees with its legs, cannot be
//! built.

use std::{collections::HashMap, fmt};

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, entity::prelude::*, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Money, ResultEngine, Wallet,
    util::{parse_optional_uuid, parse_uuid},
    wallets,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money entering the tracked wallets from outside.
    Income,
    /// Money leaving the tracked wallets.
    Expense,
    /// Money moving between two tracked wallets.
    Remittance,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Remittance => "remittance",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a transaction: a wallet and the (positive) sum it moves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Wallet snapshot as known by the caller.
    ///
    /// Only `wallet.id` matters unless the caller vouches for the snapshot
    /// (trusted source), in which case its balance and version are used as-is.
    pub wallet: Wallet,
    pub sum: Money,
}

impl Leg {
    pub fn new(wallet: Wallet, sum: Money) -> Self {
        Self { wallet, sum }
    }

    pub fn wallet_id(&self) -> Uuid {
        self.wallet.id
    }
}

/// The legs of a transaction, tagged by kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    Income { destination: Leg },
    Expense { source: Leg },
    Remittance { source: Leg, destination: Leg },
}

impl Movement {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Self::Income { .. } => TransactionKind::Income,
            Self::Expense { .. } => TransactionKind::Expense,
            Self::Remittance { .. } => TransactionKind::Remittance,
        }
    }

    /// The charged leg, if any.
    pub fn source(&self) -> Option<&Leg> {
        match self {
            Self::Expense { source } | Self::Remittance { source, .. } => Some(source),
            Self::Income { .. } => None,
        }
    }

    /// The credited leg, if any.
    pub fn destination(&self) -> Option<&Leg> {
        match self {
            Self::Income { destination } | Self::Remittance { destination, .. } => {
                Some(destination)
            }
            Self::Expense { .. } => None,
        }
    }
}

/// Raw, unchecked transaction values as they come from a form or a row.
///
/// Turn them into a [`Transaction`] with `Transaction::try_from`.
#[derive(Clone, Debug)]
pub struct TransactionParts {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub source_wallet: Option<Wallet>,
    pub source_sum: Option<Money>,
    pub destination_wallet: Option<Wallet>,
    pub destination_sum: Option<Money>,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl TransactionParts {
    pub fn new(occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id: None,
            source_wallet: None,
            source_sum: None,
            destination_wallet: None,
            destination_sum: None,
            occurred_at,
            note: None,
        }
    }
}

/// A validated money movement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    category_id: Option<Uuid>,
    movement: Movement,
    pub occurred_at: DateTime<Utc>,
    pub note: Option<String>,
}

impl Transaction {
    /// Money coming into `destination` from outside.
    pub fn income(
        destination: Leg,
        category_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        Self::build(
            Uuid::new_v4(),
            category_id,
            None,
            Some(destination),
            occurred_at,
            note,
        )
    }

    /// Money leaving through `source`.
    pub fn expense(
        source: Leg,
        category_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        Self::build(
            Uuid::new_v4(),
            category_id,
            Some(source),
            None,
            occurred_at,
            note,
        )
    }

    /// Money moving from `source` to `destination`. Remittances carry no
    /// category.
    pub fn remittance(
        source: Leg,
        destination: Leg,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        Self::build(
            Uuid::new_v4(),
            None,
            Some(source),
            Some(destination),
            occurred_at,
            note,
        )
    }

    /// Builds the next state of this transaction, keeping its id.
    pub fn revise(
        &self,
        source: Option<Leg>,
        destination: Option<Leg>,
        category_id: Option<Uuid>,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        Self::build(
            self.id,
            category_id,
            source,
            destination,
            occurred_at,
            note,
        )
    }

    fn build(
        id: Uuid,
        category_id: Option<Uuid>,
        source: Option<Leg>,
        destination: Option<Leg>,
        occurred_at: DateTime<Utc>,
        note: Option<String>,
    ) -> ResultEngine<Self> {
        for leg in source.iter().chain(destination.iter()) {
            if !leg.sum.is_positive() {
                return Err(EngineError::InvalidTransactionState(format!(
                    "sum for wallet {} must be > 0, got {}",
                    leg.wallet_id(),
                    leg.sum
                )));
            }
        }

        let movement = match (source, destination) {
            (None, None) => {
                return Err(EngineError::InvalidTransactionState(
                    "transaction needs a source or a destination wallet".to_string(),
                ));
            }
            (None, Some(destination)) => Movement::Income { destination },
            (Some(source), None) => Movement::Expense { source },
            (Some(source), Some(destination)) => {
                if source.wallet_id() == destination.wallet_id() {
                    return Err(EngineError::InvalidTransactionState(format!(
                        "same source and destination wallet {}",
                        source.wallet_id()
                    )));
                }
                if category_id.is_some() {
                    return Err(EngineError::InvalidTransactionState(
                        "remittances cannot have a category".to_string(),
                    ));
                }
                Movement::Remittance {
                    source,
                    destination,
                }
            }
        };

        Ok(Self {
            id,
            category_id,
            movement,
            occurred_at,
            note,
        })
    }

    pub fn kind(&self) -> TransactionKind {
        self.movement.kind()
    }

    pub fn is_remittance(&self) -> bool {
        self.kind() == TransactionKind::Remittance
    }

    pub fn movement(&self) -> &Movement {
        &self.movement
    }

    pub fn source(&self) -> Option<&Leg> {
        self.movement.source()
    }

    pub fn destination(&self) -> Option<&Leg> {
        self.movement.destination()
    }

    pub fn category_id(&self) -> Option<Uuid> {
        self.category_id
    }

    /// Ids of every wallet this transaction touches.
    pub fn wallet_ids(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.source()
            .into_iter()
            .chain(self.destination())
            .map(Leg::wallet_id)
    }
}

fn leg_from_parts(
    side: &str,
    wallet: Option<Wallet>,
    sum: Option<Money>,
) -> ResultEngine<Option<Leg>> {
    match (wallet, sum) {
        (Some(wallet), Some(sum)) => Ok(Some(Leg::new(wallet, sum))),
        (None, None) => Ok(None),
        (Some(wallet), None) => Err(EngineError::InvalidTransactionState(format!(
            "{side} wallet {} set without a {side} sum",
            wallet.id
        ))),
        (None, Some(sum)) => Err(EngineError::InvalidTransactionState(format!(
            "{side} sum {sum} set without a {side} wallet"
        ))),
    }
}

impl TryFrom<TransactionParts> for Transaction {
    type Error = EngineError;

    fn try_from(parts: TransactionParts) -> Result<Self, Self::Error> {
        let source = leg_from_parts("source", parts.source_wallet, parts.source_sum)?;
        let destination = leg_from_parts(
            "destination",
            parts.destination_wallet,
            parts.destination_sum,
        )?;
        Self::build(
            parts.id,
            parts.category_id,
            source,
            destination,
            parts.occurred_at,
            parts.note,
        )
    }
}

/// Inclusive range of `occurred_at` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The year up to now.
    pub fn last_year() -> Self {
        let end = Utc::now();
        Self {
            start: end - chrono::Duration::days(365),
            end,
        }
    }

    /// The last `days` days up to now.
    pub fn last_days(days: i64) -> ResultEngine<Self> {
        let out_of_range =
            || EngineError::InvalidArgument(format!("cannot look {days} days back"));
        if days < 0 {
            return Err(out_of_range());
        }
        let end = Utc::now();
        let start = chrono::Duration::try_days(days)
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(out_of_range)?;
        Ok(Self { start, end })
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::last_year()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category_id: Option<String>,
    pub src_wallet_id: Option<String>,
    pub src_sum: Option<i64>,
    pub dest_wallet_id: Option<String>,
    pub dest_sum: Option<i64>,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::SrcWalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SourceWallet,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::DestWalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    DestinationWallet,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        let source = tx.source();
        let destination = tx.destination();
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            category_id: ActiveValue::Set(tx.category_id.map(|id| id.to_string())),
            src_wallet_id: ActiveValue::Set(source.map(|leg| leg.wallet_id().to_string())),
            src_sum: ActiveValue::Set(source.map(|leg| leg.sum.minor())),
            dest_wallet_id: ActiveValue::Set(
                destination.map(|leg| leg.wallet_id().to_string()),
            ),
            dest_sum: ActiveValue::Set(destination.map(|leg| leg.sum.minor())),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            note: ActiveValue::Set(tx.note.clone()),
        }
    }
}

impl Model {
    fn wallet_ids(&self) -> ResultEngine<Vec<Uuid>> {
        [self.src_wallet_id.as_deref(), self.dest_wallet_id.as_deref()]
            .into_iter()
            .flatten()
            .map(|id| parse_uuid(id, "wallet"))
            .collect()
    }

    /// Rebuilds the domain value, taking wallet snapshots from `wallets`.
    fn hydrate(self, wallets: &HashMap<Uuid, Wallet>) -> ResultEngine<Transaction> {
        let lookup = |id: Option<&str>| -> ResultEngine<Option<Wallet>> {
            parse_optional_uuid(id, "wallet")?
                .map(|id| {
                    wallets
                        .get(&id)
                        .cloned()
                        .ok_or_else(|| EngineError::not_found("wallet", id))
                })
                .transpose()
        };

        Transaction::try_from(TransactionParts {
            id: parse_uuid(&self.id, "transaction")?,
            category_id: parse_optional_uuid(self.category_id.as_deref(), "category")?,
            source_wallet: lookup(self.src_wallet_id.as_deref())?,
            source_sum: self.src_sum.map(Money::from_minor),
            destination_wallet: lookup(self.dest_wallet_id.as_deref())?,
            destination_sum: self.dest_sum.map(Money::from_minor),
            occurred_at: self.occurred_at,
            note: self.note,
        })
    }
}

async fn hydrate_all<C: ConnectionTrait>(
    db: &C,
    models: Vec<Model>,
) -> ResultEngine<Vec<Transaction>> {
    let mut wallet_ids = Vec::new();
    for model in &models {
        wallet_ids.extend(model.wallet_ids()?);
    }
    let wallets = wallets::find_many(db, wallet_ids).await?;
    models
        .into_iter()
        .map(|model| model.hydrate(&wallets))
        .collect()
}

/// Loads a transaction with the current rows of its wallets.
pub(crate) async fn find_by_id<C: ConnectionTrait>(
    db: &C,
    transaction_id: Uuid,
) -> ResultEngine<Option<Transaction>> {
    let Some(model) = Entity::find_by_id(transaction_id.to_string())
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Ok(hydrate_all(db, vec![model]).await?.pop())
}

/// Transactions that occurred within `range`, newest first.
pub(crate) async fn find_in_range<C: ConnectionTrait>(
    db: &C,
    range: DateRange,
) -> ResultEngine<Vec<Transaction>> {
    let models = Entity::find()
        .filter(Column::OccurredAt.gte(range.start))
        .filter(Column::OccurredAt.lte(range.end))
        .order_by_desc(Column::OccurredAt)
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    hydrate_all(db, models).await
}

/// Stores a new transaction row.
pub(crate) async fn insert<C: ConnectionTrait>(db: &C, tx: &Transaction) -> ResultEngine<()> {
    ActiveModel::from(tx).insert(db).await?;
    Ok(())
}

/// Overwrites an existing transaction row.
pub(crate) async fn update<C: ConnectionTrait>(db: &C, tx: &Transaction) -> ResultEngine<()> {
    let result = Entity::update_many()
        .set(ActiveModel::from(tx))
        .filter(Column::Id.eq(tx.id.to_string()))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::not_found("transaction", tx.id));
    }
    Ok(())
}

/// Deletes a transaction row.
pub(crate) async fn delete<C: ConnectionTrait>(db: &C, transaction_id: Uuid) -> ResultEngine<()> {
    let result = Entity::delete_by_id(transaction_id.to_string())
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::not_found("transaction", transaction_id));
    }
    Ok(())
}

/// Moves every transaction of category `from` to `to` (`None` = no
/// category). Returns how many rows changed.
pub(crate) async fn reassign_category<C: ConnectionTrait>(
    db: &C,
    from: Uuid,
    to: Option<Uuid>,
) -> ResultEngine<u64> {
    let result = Entity::update_many()
        .col_expr(Column::CategoryId, Expr::value(to.map(|id| id.to_string())))
        .filter(Column::CategoryId.eq(from.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Deletes every transaction with a leg on `wallet_id`, without touching any
/// balance. Returns how many rows were deleted.
pub(crate) async fn delete_by_wallet<C: ConnectionTrait>(
    db: &C,
    wallet_id: Uuid,
) -> ResultEngine<u64> {
    let wallet_id = wallet_id.to_string();
    let result = Entity::delete_many()
        .filter(
            Condition::any()
                .add(Column::SrcWalletId.eq(wallet_id.clone()))
                .add(Column::DestWalletId.eq(wallet_id)),
        )
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

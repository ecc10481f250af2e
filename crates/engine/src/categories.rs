//! Budget categories used to classify incomes and expenses.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// Which transactions a category fits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Fits both incomes and expenses (e.g. presents).
    #[default]
    Any,
    /// Only incomes (e.g. salary).
    Income,
    /// Only expenses (e.g. food).
    Expense,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "any" => Ok(Self::Any),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid category kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub kind: CategoryKind,
    pub name: String,
    pub icon_code: String,
    pub is_hidden: bool,
    pub note: Option<String>,
}

impl Category {
    pub fn new(name: String, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            name,
            icon_code: String::new(),
            is_hidden: false,
            note: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub name: String,
    pub icon_code: String,
    pub is_hidden: bool,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            name: ActiveValue::Set(value.name.clone()),
            icon_code: ActiveValue::Set(value.icon_code.clone()),
            is_hidden: ActiveValue::Set(value.is_hidden),
            note: ActiveValue::Set(value.note.clone()),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "category")?,
            kind: CategoryKind::try_from(model.kind.as_str())?,
            name: model.name,
            icon_code: model.icon_code,
            is_hidden: model.is_hidden,
            note: model.note,
        })
    }
}

/// Checks that a category row exists.
pub(crate) async fn exists<C: ConnectionTrait>(db: &C, category_id: Uuid) -> Result<bool, DbErr> {
    Ok(Entity::find_by_id(category_id.to_string())
        .one(db)
        .await?
        .is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_storage_name() {
        for kind in [CategoryKind::Any, CategoryKind::Income, CategoryKind::Expense] {
            assert_eq!(CategoryKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(CategoryKind::try_from("transfer").is_err());
    }
}

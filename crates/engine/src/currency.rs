//! Currencies known to the ledger.
//!
//! Currencies are global reference data: the schema seeds them and the
//! application only reads them. Wallets point at a currency through its
//! ISO-4217 code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::Money;

/// A currency money can be kept in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// 3-letter ISO-4217 code, e.g. `EUR`.
    pub code: String,
    /// Symbol used when printing amounts, e.g. `€`.
    pub symbol: String,
    /// `true` when the symbol goes before the amount.
    pub is_prefix: bool,
}

impl Currency {
    pub fn new(code: &str, symbol: &str, is_prefix: bool) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
            is_prefix,
        }
    }

    /// Formats `amount` with this currency symbol.
    ///
    /// ```rust
    /// use engine::{Currency, Money};
    ///
    /// let usd = Currency::new("USD", "$", true);
    /// let byn = Currency::new("BYN", "Br", false);
    /// assert_eq!(usd.format(Money::from_minor(-1250)), "-$12.50");
    /// assert_eq!(byn.format(Money::from_minor(99)), "0.99 Br");
    /// ```
    pub fn format(&self, amount: Money) -> String {
        let text = amount.to_string();
        if !self.is_prefix {
            return format!("{text} {}", self.symbol);
        }
        match text.strip_prefix('-') {
            Some(digits) => format!("-{}{digits}", self.symbol),
            None => format!("{}{text}", self.symbol),
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub symbol: String,
    pub is_prefix: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wallets::Entity")]
    Wallets,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Currency {
    fn from(model: Model) -> Self {
        Self {
            code: model.code,
            symbol: model.symbol,
            is_prefix: model.is_prefix,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_symbol_goes_after_the_sign() {
        let usd = Currency::new("USD", "$", true);
        assert_eq!(usd.format(Money::from_minor(5)), "$0.05");
        assert_eq!(usd.format(Money::from_minor(-5)), "-$0.05");
        assert_eq!(
            usd.format(Money::from_minor(i64::MIN)),
            "-$92233720368547758.08"
        );
    }

    #[test]
    fn suffix_symbol_keeps_the_sign_on_the_amount() {
        let pln = Currency::new("PLN", "zł", false);
        assert_eq!(pln.format(Money::from_minor(-1_050)), "-10.50 zł");
        assert_eq!(
            pln.format(Money::from_minor(i64::MIN)),
            "-92233720368547758.08 zł"
        );
    }
}

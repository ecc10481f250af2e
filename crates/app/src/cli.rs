use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{CategoryKind, Money};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "purse")]
#[command(about = "Track wallets, categories and the money moving between them")]
pub struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Currency(Currency),
    Wallet(Wallet),
    Category(Category),
    Tx(Tx),
}

// ─────────────────────────────────────────────────────────────────────────────
// Currencies
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct Currency {
    #[command(subcommand)]
    pub command: CurrencyCommand,
}

#[derive(Subcommand, Debug)]
pub enum CurrencyCommand {
    List {
        /// Only currencies used by some wallet.
        #[arg(long)]
        preferred: bool,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Wallets
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct Wallet {
    #[command(subcommand)]
    pub command: WalletCommand,
}

#[derive(Subcommand, Debug)]
pub enum WalletCommand {
    Create(WalletCreateArgs),
    List {
        /// Sort by name instead of the custom order.
        #[arg(long, conflicts_with = "as_added")]
        alphanumeric: bool,
        /// Sort by creation instead of the custom order.
        #[arg(long)]
        as_added: bool,
        /// Include hidden wallets.
        #[arg(long)]
        hidden: bool,
    },
    Update(WalletUpdateArgs),
    /// Delete a wallet and every transaction touching it.
    Remove { id: Uuid },
}

#[derive(Args, Debug)]
pub struct WalletCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub balance: Money,
    #[arg(long, default_value = "")]
    pub icon: String,
    #[arg(long)]
    pub reserved: bool,
    #[arg(long)]
    pub hidden: bool,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args, Debug)]
pub struct WalletUpdateArgs {
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub icon: Option<String>,
    #[arg(long)]
    pub reserved: Option<bool>,
    #[arg(long)]
    pub hidden: Option<bool>,
    #[arg(long)]
    pub ordering: Option<i32>,
    /// New note; an empty string clears it.
    #[arg(long)]
    pub note: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Categories
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct Category {
    #[command(subcommand)]
    pub command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommand {
    Create {
        #[arg(long)]
        name: String,
        /// any, income or expense.
        #[arg(long, default_value = "any", value_parser = parse_category_kind)]
        kind: CategoryKind,
        #[arg(long)]
        note: Option<String>,
    },
    List {
        /// Include hidden categories.
        #[arg(long)]
        hidden: bool,
    },
    Remove {
        id: Uuid,
        /// Move the transactions of the removed category here.
        #[arg(long)]
        shift_to: Option<Uuid>,
    },
}

fn parse_category_kind(raw: &str) -> Result<CategoryKind, String> {
    CategoryKind::try_from(raw).map_err(|err| err.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Transactions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Args, Debug)]
pub struct Tx {
    #[command(subcommand)]
    pub command: TxCommand,
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    Income {
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        sum: Money,
        #[command(flatten)]
        details: TxDetails,
    },
    Expense {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        sum: Money,
        #[command(flatten)]
        details: TxDetails,
    },
    /// Move money between two wallets.
    Remit {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        sum: Money,
        /// Sum credited to `--to`, when it differs (e.g. other currency).
        #[arg(long)]
        received: Option<Money>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    Edit(TxEditArgs),
    Remove { id: Uuid },
    List {
        /// How many days back to look.
        #[arg(long, default_value_t = 365, value_parser = clap::value_parser!(u32).range(1..=36_500))]
        days: u32,
    },
}

#[derive(Args, Debug)]
pub struct TxDetails {
    #[arg(long)]
    pub category: Option<Uuid>,
    #[arg(long)]
    pub note: Option<String>,
    /// RFC 3339 timestamp, defaults to now.
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args, Debug)]
pub struct TxEditArgs {
    pub id: Uuid,
    /// Turn an income into an expense or vice versa.
    #[arg(long, value_parser = ["income", "expense"])]
    pub kind: Option<String>,
    #[arg(long)]
    pub from: Option<Uuid>,
    #[arg(long)]
    pub to: Option<Uuid>,
    #[arg(long)]
    pub sum: Option<Money>,
    #[arg(long)]
    pub received: Option<Money>,
    #[arg(long, conflicts_with = "no_category")]
    pub category: Option<Uuid>,
    #[arg(long)]
    pub no_category: bool,
    /// New note; an empty string clears it.
    #[arg(long)]
    pub note: Option<String>,
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

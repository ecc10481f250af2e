use std::{collections::HashMap, error::Error};

use chrono::Utc;
use engine::{
    Currency, DateRange, Engine, Leg, ListOrder, Money, NewWallet, Transaction, TransactionKind,
    Wallet, WalletPatch,
};
use uuid::Uuid;

use crate::cli::{
    CategoryCommand, CurrencyCommand, TxCommand, TxDetails, TxEditArgs, WalletCommand,
    WalletCreateArgs, WalletUpdateArgs,
};

type ResultCli<T> = Result<T, Box<dyn Error + Send + Sync>>;

fn blank_to_none(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

async fn currencies_by_code(engine: &Engine) -> ResultCli<HashMap<String, Currency>> {
    Ok(engine
        .currencies()
        .await?
        .into_iter()
        .map(|currency| (currency.code.clone(), currency))
        .collect())
}

fn format_amount(currencies: &HashMap<String, Currency>, code: &str, amount: Money) -> String {
    currencies
        .get(code)
        .map_or_else(|| format!("{amount} {code}"), |c| c.format(amount))
}

fn print_wallet(currencies: &HashMap<String, Currency>, wallet: &Wallet) {
    let mut flags = Vec::new();
    if wallet.is_reserved {
        flags.push("reserved");
    }
    if wallet.is_hidden {
        flags.push("hidden");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    println!(
        "{}  {:<20} {:>14}{flags}",
        wallet.id,
        wallet.name,
        format_amount(currencies, &wallet.currency_code, wallet.balance)
    );
}

fn print_transaction(currencies: &HashMap<String, Currency>, tx: &Transaction) {
    let side = |leg: Option<&Leg>| {
        leg.map_or_else(
            || "-".to_string(),
            |leg| {
                format!(
                    "{} ({})",
                    leg.wallet.name,
                    format_amount(currencies, &leg.wallet.currency_code, leg.sum)
                )
            },
        )
    };
    println!(
        "{}  {}  {:<10} {} -> {}{}",
        tx.id,
        tx.occurred_at.format("%Y-%m-%d %H:%M"),
        tx.kind(),
        side(tx.source()),
        side(tx.destination()),
        tx.note
            .as_deref()
            .map(|note| format!("  \"{note}\""))
            .unwrap_or_default()
    );
}

pub async fn currency(engine: &Engine, command: CurrencyCommand) -> ResultCli<()> {
    match command {
        CurrencyCommand::List { preferred } => {
            let currencies = if preferred {
                engine.preferred_currencies().await?
            } else {
                engine.currencies().await?
            };
            for currency in currencies {
                println!(
                    "{}  {}",
                    currency.code,
                    currency.format(Money::from_minor(123_456))
                );
            }
        }
    }
    Ok(())
}

pub async fn wallet(engine: &Engine, command: WalletCommand) -> ResultCli<()> {
    let currencies = currencies_by_code(engine).await?;
    match command {
        WalletCommand::Create(WalletCreateArgs {
            name,
            currency,
            balance,
            icon,
            reserved,
            hidden,
            note,
        }) => {
            let wallet = engine
                .new_wallet(NewWallet {
                    currency_code: currency,
                    name,
                    opening_balance: balance,
                    icon_code: icon,
                    is_reserved: reserved,
                    is_hidden: hidden,
                    note,
                })
                .await?;
            print!("created wallet: ");
            print_wallet(&currencies, &wallet);
        }
        WalletCommand::List {
            alphanumeric,
            as_added,
            hidden,
        } => {
            let order = if alphanumeric {
                ListOrder::Alphanumeric
            } else if as_added {
                ListOrder::AsAdded
            } else {
                ListOrder::Custom
            };
            for wallet in engine.wallets(order, hidden).await? {
                print_wallet(&currencies, &wallet);
            }
        }
        WalletCommand::Update(WalletUpdateArgs {
            id,
            name,
            icon,
            reserved,
            hidden,
            ordering,
            note,
        }) => {
            let wallet = engine
                .update_wallet(
                    id,
                    WalletPatch {
                        name,
                        icon_code: icon,
                        is_reserved: reserved,
                        is_hidden: hidden,
                        ordering,
                        note: note.map(blank_to_none),
                    },
                )
                .await?;
            print!("updated wallet: ");
            print_wallet(&currencies, &wallet);
        }
        WalletCommand::Remove { id } => {
            let removed = engine.remove_wallet(id).await?;
            println!("removed wallet {id} and {removed} transaction(s)");
        }
    }
    Ok(())
}

pub async fn category(engine: &Engine, command: CategoryCommand) -> ResultCli<()> {
    match command {
        CategoryCommand::Create { name, kind, note } => {
            let category = engine.new_category(&name, kind, note.as_deref()).await?;
            println!("created category: {} ({})", category.name, category.id);
        }
        CategoryCommand::List { hidden } => {
            for category in engine.categories(hidden).await? {
                println!(
                    "{}  {:<20} {}{}",
                    category.id,
                    category.name,
                    category.kind.as_str(),
                    if category.is_hidden { " [hidden]" } else { "" }
                );
            }
        }
        CategoryCommand::Remove { id, shift_to } => {
            let moved = engine.remove_category(id, shift_to).await?;
            match shift_to {
                Some(target) => {
                    println!("removed category {id}, {moved} transaction(s) moved to {target}")
                }
                None => println!("removed category {id}, {moved} transaction(s) left uncategorized"),
            }
        }
    }
    Ok(())
}

async fn leg(engine: &Engine, wallet_id: Uuid, sum: Money) -> ResultCli<Leg> {
    Ok(Leg::new(engine.wallet(wallet_id).await?, sum))
}

/// Keeps the wallet snapshot of `old` unless another wallet is requested.
async fn revised_leg(
    engine: &Engine,
    old: Option<&Leg>,
    wallet_id: Option<Uuid>,
    sum: Option<Money>,
    side: &str,
) -> ResultCli<Leg> {
    let wallet = match (wallet_id, old) {
        (Some(id), Some(old)) if id == old.wallet_id() => old.wallet.clone(),
        (Some(id), _) => engine.wallet(id).await?,
        (None, Some(old)) => old.wallet.clone(),
        (None, None) => return Err(format!("missing --{side} wallet").into()),
    };
    let sum = match (sum, old) {
        (Some(sum), _) => sum,
        (None, Some(old)) => old.sum,
        (None, None) => return Err(format!("missing sum for --{side} wallet").into()),
    };
    Ok(Leg::new(wallet, sum))
}

async fn edit(engine: &Engine, args: TxEditArgs, trusted_source: bool) -> ResultCli<()> {
    let old = engine.transaction(args.id).await?;
    let kind = match args.kind.as_deref() {
        Some("income") => TransactionKind::Income,
        Some("expense") => TransactionKind::Expense,
        _ => old.kind(),
    };
    // The single leg of an income or expense, whichever side it sits on.
    let single = old.source().or(old.destination());

    let (source, destination) = match kind {
        TransactionKind::Income => {
            let to = args.to.or(args.from);
            (
                None,
                Some(revised_leg(engine, single, to, args.sum, "to").await?),
            )
        }
        TransactionKind::Expense => {
            let from = args.from.or(args.to);
            (
                Some(revised_leg(engine, single, from, args.sum, "from").await?),
                None,
            )
        }
        TransactionKind::Remittance => {
            let source = revised_leg(engine, old.source(), args.from, args.sum, "from").await?;
            let received = args.received.or(args.sum);
            let destination =
                revised_leg(engine, old.destination(), args.to, received, "to").await?;
            (Some(source), Some(destination))
        }
    };

    let category_id = if args.no_category || kind == TransactionKind::Remittance {
        None
    } else {
        args.category.or(old.category_id())
    };
    let note = match args.note {
        Some(note) => blank_to_none(note),
        None => old.note.clone(),
    };
    let new = old.revise(
        source,
        destination,
        category_id,
        args.at.unwrap_or(old.occurred_at),
        note,
    )?;

    engine
        .update_transaction(&old, &new, trusted_source)
        .await?;
    println!("updated transaction {}", new.id);
    Ok(())
}

pub async fn tx(engine: &Engine, command: TxCommand, trusted_source: bool) -> ResultCli<()> {
    let currencies = currencies_by_code(engine).await?;
    let created = match command {
        TxCommand::Income {
            to,
            sum,
            details: TxDetails { category, note, at },
        } => Transaction::income(
            leg(engine, to, sum).await?,
            category,
            at.unwrap_or_else(Utc::now),
            note,
        )?,
        TxCommand::Expense {
            from,
            sum,
            details: TxDetails { category, note, at },
        } => Transaction::expense(
            leg(engine, from, sum).await?,
            category,
            at.unwrap_or_else(Utc::now),
            note,
        )?,
        TxCommand::Remit {
            from,
            to,
            sum,
            received,
            note,
            at,
        } => Transaction::remittance(
            leg(engine, from, sum).await?,
            leg(engine, to, received.unwrap_or(sum)).await?,
            at.unwrap_or_else(Utc::now),
            note,
        )?,
        TxCommand::Edit(args) => return edit(engine, args, trusted_source).await,
        TxCommand::Remove { id } => {
            let tx = engine.transaction(id).await?;
            engine.remove_transaction(&tx, trusted_source).await?;
            println!("removed transaction {id}");
            return Ok(());
        }
        TxCommand::List { days } => {
            for tx in engine.transactions(DateRange::last_days(i64::from(days))?).await? {
                print_transaction(&currencies, &tx);
            }
            return Ok(());
        }
    };

    let created = engine.create_transaction(created, trusted_source).await?;
    print!("created: ");
    print_transaction(&currencies, &created);
    Ok(())
}

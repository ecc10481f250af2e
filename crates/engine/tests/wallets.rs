use chrono::Utc;
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, Leg, ListOrder, Money, NewWallet, Transaction, WalletPatch};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

fn new_wallet(name: &str, currency: &str, balance: i64) -> NewWallet {
    NewWallet {
        currency_code: currency.to_string(),
        name: name.to_string(),
        opening_balance: Money::from_minor(balance),
        ..Default::default()
    }
}

#[tokio::test]
async fn new_wallets_go_to_the_bottom() {
    let (engine, _db) = engine_with_db().await;

    let cash = engine.new_wallet(new_wallet("Cash", "EUR", 0)).await.unwrap();
    let bank = engine.new_wallet(new_wallet("bank", "usd", 0)).await.unwrap();
    let card = engine.new_wallet(new_wallet("Card", "PLN", 0)).await.unwrap();

    assert_eq!(cash.ordering, 0);
    assert_eq!(bank.ordering, 1);
    assert_eq!(card.ordering, 2);
    assert_eq!(bank.currency_code, "USD");

    let custom: Vec<_> = engine
        .wallets(ListOrder::Custom, false)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(custom, vec!["Cash", "bank", "Card"]);

    let alphanumeric: Vec<_> = engine
        .wallets(ListOrder::Alphanumeric, false)
        .await
        .unwrap()
        .into_iter()
        .map(|w| w.name)
        .collect();
    assert_eq!(alphanumeric, vec!["bank", "Card", "Cash"]);
}

#[tokio::test]
async fn as_added_order_ignores_custom_ordering() {
    let (engine, _db) = engine_with_db().await;
    let cash = engine.new_wallet(new_wallet("Cash", "EUR", 0)).await.unwrap();
    engine.new_wallet(new_wallet("Bank", "EUR", 0)).await.unwrap();
    engine.new_wallet(new_wallet("Card", "EUR", 0)).await.unwrap();

    engine
        .update_wallet(
            cash.id,
            WalletPatch {
                ordering: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names = |wallets: Vec<engine::Wallet>| -> Vec<String> {
        wallets.into_iter().map(|w| w.name).collect()
    };
    assert_eq!(
        names(engine.wallets(ListOrder::Custom, false).await.unwrap()),
        vec!["Bank", "Card", "Cash"]
    );
    assert_eq!(
        names(engine.wallets(ListOrder::AsAdded, false).await.unwrap()),
        vec!["Cash", "Bank", "Card"]
    );
}

#[tokio::test]
async fn hidden_wallets_only_on_request() {
    let (engine, _db) = engine_with_db().await;
    engine.new_wallet(new_wallet("Cash", "EUR", 0)).await.unwrap();
    engine
        .new_wallet(NewWallet {
            is_hidden: true,
            ..new_wallet("Savings", "EUR", 0)
        })
        .await
        .unwrap();

    assert_eq!(engine.wallets(ListOrder::Custom, false).await.unwrap().len(), 1);
    assert_eq!(engine.wallets(ListOrder::Custom, true).await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejects_unknown_currency_and_blank_name() {
    let (engine, _db) = engine_with_db().await;

    let err = engine
        .new_wallet(new_wallet("Cash", "XYZ", 0))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::EntityNotFound {
            entity: "currency",
            id: "XYZ".to_string(),
        }
    );

    let err = engine
        .new_wallet(new_wallet("   ", "EUR", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
}

#[tokio::test]
async fn update_changes_metadata_only() {
    let (engine, _db) = engine_with_db().await;
    let cash = engine
        .new_wallet(new_wallet("Cash", "EUR", 1_000))
        .await
        .unwrap();

    let updated = engine
        .update_wallet(
            cash.id,
            WalletPatch {
                name: Some(" Pocket ".to_string()),
                is_reserved: Some(true),
                ordering: Some(9),
                note: Some(Some("coins".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Pocket");
    assert!(updated.is_reserved);
    assert_eq!(updated.ordering, 9);
    assert_eq!(updated.note.as_deref(), Some("coins"));
    assert_eq!(updated.balance, cash.balance);
    assert_eq!(updated.version, cash.version);
    assert_eq!(updated.currency_code, "EUR");

    let cleared = engine
        .update_wallet(
            cash.id,
            WalletPatch {
                note: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.note, None);
    assert_eq!(cleared.name, "Pocket");
}

#[tokio::test]
async fn unknown_wallet_is_not_found() {
    let (engine, _db) = engine_with_db().await;
    let id = Uuid::new_v4();
    let not_found = EngineError::EntityNotFound {
        entity: "wallet",
        id: id.to_string(),
    };

    assert_eq!(engine.wallet(id).await.unwrap_err(), not_found);
    assert_eq!(
        engine
            .update_wallet(id, WalletPatch::default())
            .await
            .unwrap_err(),
        not_found
    );
    assert_eq!(engine.remove_wallet(id).await.unwrap_err(), not_found);
}

#[tokio::test]
async fn remove_wallet_cascades_without_touching_balances() {
    let (engine, _db) = engine_with_db().await;
    let cash = engine.new_wallet(new_wallet("Cash", "EUR", 100)).await.unwrap();
    let bank = engine.new_wallet(new_wallet("Bank", "EUR", 100)).await.unwrap();
    let card = engine.new_wallet(new_wallet("Card", "EUR", 100)).await.unwrap();

    let leg = |wallet: &engine::Wallet, sum: i64| Leg::new(wallet.clone(), Money::from_minor(sum));
    let txs = [
        Transaction::expense(leg(&cash, 10), None, Utc::now(), None).unwrap(),
        Transaction::remittance(leg(&bank, 20), leg(&cash, 20), Utc::now(), None).unwrap(),
        Transaction::remittance(leg(&cash, 5), leg(&card, 5), Utc::now(), None).unwrap(),
        Transaction::expense(leg(&bank, 1), None, Utc::now(), None).unwrap(),
    ];
    for tx in txs {
        engine.create_transaction(tx, false).await.unwrap();
    }
    assert_eq!(engine.wallet(bank.id).await.unwrap().balance.minor(), 79);
    assert_eq!(engine.wallet(card.id).await.unwrap().balance.minor(), 105);

    let removed = engine.remove_wallet(cash.id).await.unwrap();
    assert_eq!(removed, 3);

    assert!(matches!(
        engine.wallet(cash.id).await,
        Err(EngineError::EntityNotFound { .. })
    ));
    // The other ends of the deleted remittances keep their balances.
    assert_eq!(engine.wallet(bank.id).await.unwrap().balance.minor(), 79);
    assert_eq!(engine.wallet(card.id).await.unwrap().balance.minor(), 105);

    let left = engine
        .transactions(engine::DateRange::default())
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].source().unwrap().wallet_id(), bank.id);
}

#[tokio::test]
async fn preferred_currencies_follow_wallets() {
    let (engine, _db) = engine_with_db().await;

    let codes: Vec<_> = engine
        .currencies()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["BYN", "EUR", "PLN", "RUB", "USD"]);
    assert!(engine.preferred_currencies().await.unwrap().is_empty());

    engine.new_wallet(new_wallet("Cash", "PLN", 0)).await.unwrap();
    engine.new_wallet(new_wallet("Bank", "EUR", 0)).await.unwrap();
    engine.new_wallet(new_wallet("Card", "EUR", 0)).await.unwrap();

    let preferred = engine.preferred_currencies().await.unwrap();
    let codes: Vec<_> = preferred.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, vec!["EUR", "PLN"]);

    let pln = engine.currency("pln").await.unwrap();
    assert_eq!(pln.format(Money::from_minor(1_050)), "10.50 zł");
}

//! Balance reconciliation.
//!
//! Every transaction is seen as a list of signed legs: the source leg charges
//! its wallet (`-sum`), the destination leg credits its wallet (`+sum`).
//!
//! - creating `T` applies the signed legs of `T`,
//! - removing `T` applies them negated,
//! - updating `old` into `new` applies `-legs(old) + legs(new)`.
//!
//! The result is grouped by wallet id, zero deltas are dropped and wallets come
//! out sorted by id. Nothing here touches storage.

use std::collections::BTreeMap;

use tracing::warn;
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, Transaction, Wallet};

/// What happens to a transaction.
#[derive(Clone, Copy, Debug)]
pub enum Change<'a> {
    Create(&'a Transaction),
    Update {
        old: &'a Transaction,
        new: &'a Transaction,
    },
    Remove(&'a Transaction),
}

/// Net balance change for one wallet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletDelta {
    /// Freshest snapshot of the wallet found among the legs.
    pub wallet: Wallet,
    pub delta: Money,
}

fn signed_legs(tx: &Transaction) -> impl Iterator<Item = (&Wallet, Money)> {
    let charged = tx.source().map(|leg| (&leg.wallet, -leg.sum));
    let credited = tx.destination().map(|leg| (&leg.wallet, leg.sum));
    charged.into_iter().chain(credited)
}

/// Fails when `old` cannot be updated into `new`.
///
/// Both must share the same id, and a remittance stays a remittance (and
/// vice versa). Income and expense may turn into each other.
pub fn check_transition(old: &Transaction, new: &Transaction) -> ResultEngine<()> {
    if old.id != new.id {
        return Err(EngineError::InvalidArgument(format!(
            "cannot update transaction {} with transaction {}",
            old.id, new.id
        )));
    }
    if old.is_remittance() != new.is_remittance() {
        warn!(
            transaction_id = %old.id,
            from = %old.kind(),
            to = %new.kind(),
            "refusing transaction kind transition"
        );
        return Err(EngineError::IllegalTransition {
            transaction_id: old.id,
            from: old.kind(),
            to: new.kind(),
        });
    }
    Ok(())
}

/// Computes the per-wallet balance changes a [`Change`] requires.
pub fn wallet_deltas(change: Change<'_>) -> ResultEngine<Vec<WalletDelta>> {
    let mut legs: Vec<(&Wallet, Money)> = Vec::new();
    match change {
        Change::Create(tx) => legs.extend(signed_legs(tx)),
        Change::Remove(tx) => legs.extend(signed_legs(tx).map(|(wallet, sum)| (wallet, -sum))),
        Change::Update { old, new } => {
            check_transition(old, new)?;
            legs.extend(signed_legs(old).map(|(wallet, sum)| (wallet, -sum)));
            legs.extend(signed_legs(new));
        }
    }

    let mut grouped: BTreeMap<Uuid, (&Wallet, Money)> = BTreeMap::new();
    for (wallet, sum) in legs {
        match grouped.get_mut(&wallet.id) {
            Some((snapshot, total)) => {
                *total = total.try_add(sum)?;
                if wallet.version > snapshot.version {
                    *snapshot = wallet;
                }
            }
            None => {
                grouped.insert(wallet.id, (wallet, sum));
            }
        }
    }

    Ok(grouped
        .into_values()
        .filter(|(_, delta)| !delta.is_zero())
        .map(|(wallet, delta)| WalletDelta {
            wallet: wallet.clone(),
            delta,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::{Leg, TransactionKind};

    fn wallet(n: u128, balance: i64) -> Wallet {
        Wallet {
            id: Uuid::from_u128(n),
            currency_code: "EUR".to_string(),
            balance: Money::from_minor(balance),
            name: format!("wallet {n}"),
            icon_code: String::new(),
            is_reserved: false,
            is_hidden: false,
            ordering: n as i32,
            note: None,
            version: 0,
        }
    }

    fn leg(wallet: &Wallet, sum: i64) -> Leg {
        Leg::new(wallet.clone(), Money::from_minor(sum))
    }

    fn at() -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn as_pairs(deltas: &[WalletDelta]) -> Vec<(Uuid, i64)> {
        deltas
            .iter()
            .map(|d| (d.wallet.id, d.delta.minor()))
            .collect()
    }

    #[test]
    fn create_and_remove_apply_opposite_signs() {
        let a = wallet(1, 100);
        let b = wallet(2, 100);
        let tx = Transaction::remittance(leg(&a, 30), leg(&b, 25), at(), None).unwrap();

        let created = wallet_deltas(Change::Create(&tx)).unwrap();
        assert_eq!(as_pairs(&created), vec![(a.id, -30), (b.id, 25)]);

        let removed = wallet_deltas(Change::Remove(&tx)).unwrap();
        assert_eq!(as_pairs(&removed), vec![(a.id, 30), (b.id, -25)]);
    }

    #[test]
    fn update_with_itself_changes_nothing() {
        let a = wallet(1, 100);
        let tx = Transaction::expense(leg(&a, 10), None, at(), None).unwrap();
        assert!(
            wallet_deltas(Change::Update { old: &tx, new: &tx })
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn expense_sum_change_on_same_wallet() {
        let a = wallet(1, 90);
        let old = Transaction::expense(leg(&a, 10), None, at(), None).unwrap();
        let new = old
            .revise(Some(leg(&a, 25)), None, None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(as_pairs(&deltas), vec![(a.id, -15)]);
    }

    #[test]
    fn expense_moved_to_another_wallet() {
        let a = wallet(1, 90);
        let b = wallet(2, 50);
        let old = Transaction::expense(leg(&a, 10), None, at(), None).unwrap();
        let new = old
            .revise(Some(leg(&b, 10)), None, None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(as_pairs(&deltas), vec![(a.id, 10), (b.id, -10)]);
    }

    #[test]
    fn income_turned_into_expense_on_same_wallet() {
        let a = wallet(1, 110);
        let old = Transaction::income(leg(&a, 10), None, at(), None).unwrap();
        let new = old
            .revise(Some(leg(&a, 10)), None, None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(as_pairs(&deltas), vec![(a.id, -20)]);
    }

    #[test]
    fn remittance_with_swapped_wallets() {
        let a = wallet(1, 90);
        let b = wallet(2, 110);
        let old = Transaction::remittance(leg(&a, 10), leg(&b, 10), at(), None).unwrap();
        let new = old
            .revise(Some(leg(&b, 10)), Some(leg(&a, 10)), None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(as_pairs(&deltas), vec![(a.id, 20), (b.id, -20)]);
    }

    #[test]
    fn remittance_source_replaced_keeping_destination() {
        let a = wallet(1, 90);
        let b = wallet(2, 110);
        let c = wallet(3, 40);
        let old = Transaction::remittance(leg(&a, 10), leg(&b, 10), at(), None).unwrap();
        let new = old
            .revise(Some(leg(&c, 10)), Some(leg(&b, 10)), None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(as_pairs(&deltas), vec![(a.id, 10), (c.id, -10)]);
    }

    #[test]
    fn remittance_cannot_become_expense() {
        let a = wallet(1, 90);
        let b = wallet(2, 110);
        let old = Transaction::remittance(leg(&a, 10), leg(&b, 10), at(), None).unwrap();
        let new = old.revise(Some(leg(&a, 10)), None, None, at(), None).unwrap();

        let err = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::IllegalTransition {
                transaction_id: old.id,
                from: TransactionKind::Remittance,
                to: TransactionKind::Expense,
            }
        );
    }

    #[test]
    fn update_requires_same_transaction() {
        let a = wallet(1, 90);
        let old = Transaction::expense(leg(&a, 10), None, at(), None).unwrap();
        let other = Transaction::expense(leg(&a, 10), None, at(), None).unwrap();
        assert!(matches!(
            wallet_deltas(Change::Update {
                old: &old,
                new: &other,
            }),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn freshest_snapshot_wins() {
        let stale = wallet(1, 90);
        let mut fresh = stale.clone();
        fresh.balance = Money::from_minor(80);
        fresh.version = 4;

        let old = Transaction::expense(leg(&stale, 10), None, at(), None).unwrap();
        let new = old
            .revise(Some(leg(&fresh, 30)), None, None, at(), None)
            .unwrap();

        let deltas = wallet_deltas(Change::Update {
            old: &old,
            new: &new,
        })
        .unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].wallet, fresh);
        assert_eq!(deltas[0].delta, Money::from_minor(-20));
    }

    const POOL: u128 = 3;

    fn arb_transaction() -> impl Strategy<Value = Transaction> {
        (
            0..3u8,
            1..=POOL,
            1..=POOL,
            1i64..1_000_000,
            1i64..1_000_000,
        )
            .prop_filter_map("remittance needs two wallets", |(kind, s, d, s_sum, d_sum)| {
                let source = leg(&wallet(s, 0), s_sum);
                let destination = leg(&wallet(d, 0), d_sum);
                match kind {
                    0 => Transaction::income(destination, None, at(), None).ok(),
                    1 => Transaction::expense(source, None, at(), None).ok(),
                    _ => Transaction::remittance(source, destination, at(), None).ok(),
                }
            })
    }

    fn apply(balances: &mut BTreeMap<Uuid, i64>, deltas: &[WalletDelta]) {
        for d in deltas {
            *balances.entry(d.wallet.id).or_default() += d.delta.minor();
        }
    }

    fn net(tx: &Transaction) -> i64 {
        tx.destination().map_or(0, |l| l.sum.minor()) - tx.source().map_or(0, |l| l.sum.minor())
    }

    proptest! {
        #[test]
        fn deltas_conserve_the_moved_money(tx in arb_transaction()) {
            let deltas = wallet_deltas(Change::Create(&tx)).unwrap();
            let total: i64 = deltas.iter().map(|d| d.delta.minor()).sum();
            prop_assert_eq!(total, net(&tx));
            prop_assert!(deltas.iter().all(|d| !d.delta.is_zero()));
        }

        #[test]
        fn remove_undoes_create(tx in arb_transaction()) {
            let mut balances = BTreeMap::new();
            apply(&mut balances, &wallet_deltas(Change::Create(&tx)).unwrap());
            apply(&mut balances, &wallet_deltas(Change::Remove(&tx)).unwrap());
            prop_assert!(balances.values().all(|v| *v == 0));
        }

        #[test]
        fn update_equals_remove_then_create(
            old in arb_transaction(),
            new in arb_transaction(),
        ) {
            let source = new.source().cloned();
            let destination = new.destination().cloned();
            let new = old.revise(source, destination, None, at(), None).unwrap();

            let mut two_steps = BTreeMap::new();
            apply(&mut two_steps, &wallet_deltas(Change::Remove(&old)).unwrap());
            apply(&mut two_steps, &wallet_deltas(Change::Create(&new)).unwrap());
            two_steps.retain(|_, v| *v != 0);

            match wallet_deltas(Change::Update { old: &old, new: &new }) {
                Ok(deltas) => {
                    let mut one_step = BTreeMap::new();
                    apply(&mut one_step, &deltas);
                    prop_assert_eq!(one_step, two_steps);
                }
                Err(err) => {
                    prop_assert!(old.is_remittance() != new.is_remittance());
                    let is_illegal = matches!(err, EngineError::IllegalTransition { .. });
                    prop_assert!(is_illegal);
                }
            }
        }

        #[test]
        fn wallets_come_out_sorted_and_unique(
            old in arb_transaction(),
            new in arb_transaction(),
        ) {
            let source = new.source().cloned();
            let destination = new.destination().cloned();
            let new = old.revise(source, destination, None, at(), None).unwrap();
            if let Ok(deltas) = wallet_deltas(Change::Update { old: &old, new: &new }) {
                let ids: Vec<Uuid> = deltas.iter().map(|d| d.wallet.id).collect();
                let mut sorted = ids.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(ids, sorted);
            }
        }
    }
}

use sea_orm::ConnectionTrait;
use tracing::{trace, warn};

use crate::{EngineError, ResultEngine, WalletDelta, wallets};

/// Writes the new balance of every wallet in `deltas`.
///
/// With `trusted_source` the snapshot carried by the delta is the base
/// balance. Otherwise the wallet row is re-read on `db` first. Either way the
/// write only lands if the row is still at the version the base balance came
/// from, so it must run inside the same database transaction as the rest of
/// the operation.
pub(super) async fn apply_wallet_deltas<C: ConnectionTrait>(
    db: &C,
    deltas: &[WalletDelta],
    trusted_source: bool,
) -> ResultEngine<()> {
    for WalletDelta { wallet, delta } in deltas {
        let (balance, version) = if trusted_source {
            trace!(wallet_id = %wallet.id, balance = %wallet.balance, "using trusted wallet snapshot");
            (wallet.balance, wallet.version)
        } else {
            let current = wallets::find_by_id(db, wallet.id)
                .await?
                .ok_or_else(|| EngineError::not_found("wallet", wallet.id))?;
            trace!(wallet_id = %wallet.id, balance = %current.balance, "re-read wallet balance");
            (current.balance, current.version)
        };

        let new_balance = balance.try_add(*delta)?;
        if !wallets::update_balance(db, wallet.id, version, new_balance).await? {
            if wallets::find_by_id(db, wallet.id).await?.is_none() {
                return Err(EngineError::not_found("wallet", wallet.id));
            }
            warn!(
                wallet_id = %wallet.id,
                expected_version = version,
                "wallet version changed, rejecting balance write"
            );
            return Err(EngineError::ConcurrentModification {
                wallet_id: wallet.id,
            });
        }
        trace!(
            wallet_id = %wallet.id,
            old_balance = %balance,
            new_balance = %new_balance,
            "wallet balance updated"
        );
    }
    Ok(())
}

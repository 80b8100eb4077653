use super::pool::{AccountId, Amount, Asset, PoolId, Timestamp, TokenId};
use serde::Deserialize;

/// One line of the host's serialized operation stream.
///
/// `credit` and `approve` act on the sandbox asset ledger (the external
/// world around the engine); the remaining ops are engine calls. `at` is
/// the host clock reading for the operation, in seconds since the epoch —
/// the engine never takes time from the caller's payload itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Credit {
        account: AccountId,
        asset: Asset,
        amount: Amount,
    },
    Approve {
        owner: AccountId,
        token: TokenId,
        amount: Amount,
    },
    CreateNativePool {
        at: Timestamp,
        creator: AccountId,
        name: String,
        recipients: Vec<AccountId>,
        deposit: Amount,
        start_time: Timestamp,
        stop_time: Timestamp,
    },
    CreateTokenPool {
        at: Timestamp,
        creator: AccountId,
        name: String,
        recipients: Vec<AccountId>,
        deposit: Amount,
        token: TokenId,
        start_time: Timestamp,
        stop_time: Timestamp,
    },
    Withdraw {
        at: Timestamp,
        pool_id: PoolId,
        account: AccountId,
        amount: Amount,
    },
}

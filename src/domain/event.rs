use super::pool::{AccountId, Balance, Pool, PoolId, Timestamp};
use serde::{Deserialize, Serialize};

/// Append-only engine events, shaped for external indexers and dashboards.
///
/// Tag names match the historical on-chain event signatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PoolEvent {
    CreateDPool {
        pool_id: PoolId,
        creator: AccountId,
        recipients: Vec<AccountId>,
        total_deposit: Balance,
        start_time: Timestamp,
        stop_time: Timestamp,
    },
    WithdrawFromDPool {
        pool_id: PoolId,
        account: AccountId,
        amount: Balance,
        remaining_balance: Balance,
    },
}

impl PoolEvent {
    pub fn created(pool: &Pool) -> Self {
        PoolEvent::CreateDPool {
            pool_id: pool.id,
            creator: pool.creator.clone(),
            recipients: pool.recipients.clone(),
            total_deposit: pool.total_deposit,
            start_time: pool.start_time,
            stop_time: pool.stop_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags() {
        let event = PoolEvent::WithdrawFromDPool {
            pool_id: PoolId(3),
            account: AccountId::from("bob"),
            amount: Balance(75),
            remaining_balance: Balance(225),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"WithdrawFromDPool\""));
        assert!(json.contains("\"remaining_balance\":225"));

        let back: PoolEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_wide_amounts_survive_the_event_codec() {
        let event = PoolEvent::WithdrawFromDPool {
            pool_id: PoolId(0),
            account: AccountId::from("bob"),
            amount: Balance(u128::MAX - 1),
            remaining_balance: Balance(1),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: PoolEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

use crate::domain::event::PoolEvent;
use crate::domain::pool::{AccountId, Amount, Asset, Balance, Pool, PoolId, Timestamp, TokenId};
use crate::domain::ports::{AssetLedger, Clock, EventSink, PoolStore};
use crate::error::{PoolError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Append-only in-memory pool arena.
///
/// Ids are the vector indices, assigned monotonically and never reclaimed,
/// so historical lookups keep working after pools are exhausted. `Clone`
/// shares the underlying storage.
#[derive(Default, Clone)]
pub struct InMemoryPoolStore {
    pools: Arc<RwLock<Vec<Pool>>>,
}

impl InMemoryPoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PoolStore for InMemoryPoolStore {
    async fn append(&self, mut pool: Pool) -> Result<PoolId> {
        let mut pools = self.pools.write().await;
        let id = PoolId(pools.len() as u64);
        pool.id = id;
        pools.push(pool);
        Ok(id)
    }

    async fn update(&self, pool: Pool) -> Result<()> {
        let mut pools = self.pools.write().await;
        let slot = pools
            .get_mut(pool.id.0 as usize)
            .ok_or(PoolError::NotFound(pool.id))?;
        *slot = pool;
        Ok(())
    }

    async fn get(&self, id: PoolId) -> Result<Option<Pool>> {
        let pools = self.pools.read().await;
        Ok(pools.get(id.0 as usize).cloned())
    }

    async fn count(&self) -> Result<u64> {
        let pools = self.pools.read().await;
        Ok(pools.len() as u64)
    }

    async fn all(&self) -> Result<Vec<Pool>> {
        let pools = self.pools.read().await;
        Ok(pools.clone())
    }
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(Asset, AccountId), u128>,
    /// Token allowances granted by an owner toward the engine's custody.
    allowances: HashMap<(TokenId, AccountId), u128>,
}

/// Sandbox asset ledger standing in for the external world: per-account
/// native and token balances plus token allowances toward custody.
///
/// Transfers fail atomically; every check runs before the first mutation.
#[derive(Clone)]
pub struct InMemoryLedger {
    custody: AccountId,
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }

    /// Mints `amount` of `asset` to `account`. Setup entry point for the
    /// host op stream and tests; not part of the engine surface.
    pub async fn credit(&self, asset: &Asset, account: &AccountId, amount: Amount) {
        let mut state = self.state.write().await;
        *state
            .balances
            .entry((asset.clone(), account.clone()))
            .or_insert(0) += amount.value();
    }

    /// Authorizes the engine to pull up to `amount` of `token` from
    /// `owner`. Mirrors the external pre-authorization a token create
    /// requires.
    pub async fn approve(&self, token: &TokenId, owner: &AccountId, amount: Amount) {
        let mut state = self.state.write().await;
        state
            .allowances
            .insert((token.clone(), owner.clone()), amount.value());
    }

    pub async fn balance(&self, asset: &Asset, account: &AccountId) -> Balance {
        let state = self.state.read().await;
        Balance(
            state
                .balances
                .get(&(asset.clone(), account.clone()))
                .copied()
                .unwrap_or(0),
        )
    }
}

#[async_trait]
impl AssetLedger for InMemoryLedger {
    async fn transfer_in(&self, asset: &Asset, from: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write().await;
        let units = amount.value();

        if let Asset::Token(token) = asset {
            let allowance = state
                .allowances
                .get(&(token.clone(), from.clone()))
                .copied()
                .unwrap_or(0);
            if allowance < units {
                return Err(PoolError::Transfer(format!(
                    "{from} has not authorized {units} of {token}"
                )));
            }
        }
        let from_key = (asset.clone(), from.clone());
        let funds = state.balances.get(&from_key).copied().unwrap_or(0);
        if funds < units {
            return Err(PoolError::Transfer(format!(
                "{from} holds {funds}, cannot move {units}"
            )));
        }

        state.balances.insert(from_key, funds - units);
        *state
            .balances
            .entry((asset.clone(), self.custody.clone()))
            .or_insert(0) += units;
        if let Asset::Token(token) = asset {
            let key = (token.clone(), from.clone());
            let allowance = state.allowances.get(&key).copied().unwrap_or(0);
            state.allowances.insert(key, allowance - units);
        }
        Ok(())
    }

    async fn transfer_out(&self, asset: &Asset, to: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write().await;
        let units = amount.value();
        let custody_key = (asset.clone(), self.custody.clone());
        let escrowed = state.balances.get(&custody_key).copied().unwrap_or(0);
        if escrowed < units {
            return Err(PoolError::Transfer(format!(
                "custody holds {escrowed}, cannot release {units}"
            )));
        }
        state.balances.insert(custody_key, escrowed - units);
        *state
            .balances
            .entry((asset.clone(), to.clone()))
            .or_insert(0) += units;
        Ok(())
    }
}

/// Append-only in-memory event record.
#[derive(Default, Clone)]
pub struct InMemoryEventLog {
    events: Arc<RwLock<Vec<PoolEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<PoolEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl EventSink for InMemoryEventLog {
    async fn append(&self, event: PoolEvent) -> Result<()> {
        self.events.write().await.push(event);
        Ok(())
    }
}

/// Host-driven engine clock. The host sets it from its authoritative time
/// source before each operation; the engine only ever reads it.
#[derive(Default, Clone)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start.0)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now.0, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.load(Ordering::SeqCst))
    }
}

use super::event::PoolEvent;
use super::pool::{AccountId, Amount, Asset, Pool, PoolId, Timestamp};
use crate::error::Result;
use async_trait::async_trait;

/// Authoritative pool table: an append-only arena with monotonic ids.
/// Pools are never deleted; `Exhausted` records stay queryable forever.
#[async_trait]
pub trait PoolStore: Send + Sync {
    /// Assigns the next sequential id to `pool`, persists it and returns
    /// the id. The id on the incoming record is ignored.
    async fn append(&self, pool: Pool) -> Result<PoolId>;
    /// Overwrites an existing record (bookkeeping updates only; terms are
    /// immutable by construction).
    async fn update(&self, pool: Pool) -> Result<()>;
    async fn get(&self, id: PoolId) -> Result<Option<Pool>>;
    async fn count(&self) -> Result<u64>;
    async fn all(&self) -> Result<Vec<Pool>>;
}

/// Moves assets into and out of the engine's custody, abstracting native
/// currency and fungible tokens behind one interface. Both operations fail
/// atomically with no side effects on failure.
#[async_trait]
pub trait AssetLedger: Send + Sync {
    async fn transfer_in(&self, asset: &Asset, from: &AccountId, amount: Amount) -> Result<()>;
    async fn transfer_out(&self, asset: &Asset, to: &AccountId, amount: Amount) -> Result<()>;
}

/// Append-only event record consumed by external indexers.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn append(&self, event: PoolEvent) -> Result<()>;
}

/// The host execution environment's authoritative clock. Read once per
/// operation; never fed from caller-supplied wall-clock input.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

pub type PoolStoreBox = Box<dyn PoolStore>;
pub type AssetLedgerBox = Box<dyn AssetLedger>;
pub type EventSinkBox = Box<dyn EventSink>;
pub type ClockBox = Box<dyn Clock>;

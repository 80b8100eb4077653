use crate::domain::pool::{Pool, PoolId};
use crate::domain::ports::PoolStore;
use crate::error::{PoolError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family for pool records, keyed by big-endian id so iteration
/// order matches id order.
pub const CF_POOLS: &str = "pools";
/// Column Family for engine metadata (the next-id counter).
pub const CF_META: &str = "meta";

const NEXT_ID_KEY: &[u8] = b"next_pool_id";

/// Persistent pool arena backed by RocksDB.
///
/// The next-id counter lives in its own Column Family and is advanced in
/// the same `WriteBatch` that stores the new pool, so ids stay monotonic
/// across restarts and are never reused even if the process dies between
/// operations. `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDbPoolStore {
    db: Arc<DB>,
}

impl RocksDbPoolStore {
    /// Opens or creates a RocksDB instance at `path`, ensuring the
    /// required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_pools = ColumnFamilyDescriptor::new(CF_POOLS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_pools, cf_meta])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            PoolError::Storage(Box::new(std::io::Error::other(format!(
                "{name} column family not found"
            ))))
        })
    }

    fn next_id(&self) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(cf, NEXT_ID_KEY)? {
            Some(bytes) => {
                let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    PoolError::Storage(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "corrupt next-id counter",
                    )))
                })?;
                Ok(u64::from_be_bytes(bytes))
            }
            None => Ok(0),
        }
    }

    fn encode(pool: &Pool) -> Result<Vec<u8>> {
        serde_json::to_vec(pool).map_err(PoolError::from)
    }

    fn decode(bytes: &[u8]) -> Result<Pool> {
        serde_json::from_slice(bytes).map_err(PoolError::from)
    }
}

#[async_trait]
impl PoolStore for RocksDbPoolStore {
    async fn append(&self, mut pool: Pool) -> Result<PoolId> {
        let id = self.next_id()?;
        pool.id = PoolId(id);

        let cf_pools = self.cf(CF_POOLS)?;
        let cf_meta = self.cf(CF_META)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_pools, id.to_be_bytes(), Self::encode(&pool)?);
        batch.put_cf(cf_meta, NEXT_ID_KEY, (id + 1).to_be_bytes());
        self.db.write(batch)?;

        Ok(pool.id)
    }

    async fn update(&self, pool: Pool) -> Result<()> {
        let cf = self.cf(CF_POOLS)?;
        let key = pool.id.0.to_be_bytes();
        if self.db.get_pinned_cf(cf, key)?.is_none() {
            return Err(PoolError::NotFound(pool.id));
        }
        self.db.put_cf(cf, key, Self::encode(&pool)?)?;
        Ok(())
    }

    async fn get(&self, id: PoolId) -> Result<Option<Pool>> {
        let cf = self.cf(CF_POOLS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn count(&self) -> Result<u64> {
        self.next_id()
    }

    async fn all(&self) -> Result<Vec<Pool>> {
        let cf = self.cf(CF_POOLS)?;
        let mut pools = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            pools.push(Self::decode(&value)?);
        }
        Ok(pools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pool::{AccountId, Amount, Asset, Balance, Timestamp};
    use tempfile::tempdir;

    fn sample_pool(name: &str) -> Pool {
        Pool::new(
            name,
            AccountId::from("milo"),
            vec![AccountId::from("bob"), AccountId::from("mark")],
            Asset::Native,
            Amount::new(300).unwrap(),
            Timestamp(1_000),
            Timestamp(2_000),
        )
    }

    #[tokio::test]
    async fn test_open_creates_column_families() {
        let dir = tempdir().unwrap();
        let store = RocksDbPoolStore::open(dir.path()).expect("Failed to open RocksDB");
        assert!(store.db.cf_handle(CF_POOLS).is_some());
        assert!(store.db.cf_handle(CF_META).is_some());
    }

    #[tokio::test]
    async fn test_append_and_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDbPoolStore::open(dir.path()).unwrap();

        let first = store.append(sample_pool("a")).await.unwrap();
        let second = store.append(sample_pool("b")).await.unwrap();
        assert_eq!(first, PoolId(0));
        assert_eq!(second, PoolId(1));
        assert_eq!(store.count().await.unwrap(), 2);

        let retrieved = store.get(first).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "a");
        assert_eq!(retrieved.total_deposit, Balance(300));
        assert!(store.get(PoolId(9)).await.unwrap().is_none());

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first);
        assert_eq!(all[1].id, second);
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let dir = tempdir().unwrap();
        let store = RocksDbPoolStore::open(dir.path()).unwrap();

        let id = store.append(sample_pool("a")).await.unwrap();
        let mut pool = store.get(id).await.unwrap().unwrap();
        pool.record_withdrawal(&AccountId::from("bob"), Amount::new(50).unwrap())
            .unwrap();
        store.update(pool.clone()).await.unwrap();
        assert_eq!(
            store.get(id).await.unwrap().unwrap().remaining_balance,
            Balance(250)
        );

        let mut phantom = sample_pool("x");
        phantom.id = PoolId(42);
        assert!(matches!(
            store.update(phantom).await,
            Err(PoolError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ids_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDbPoolStore::open(dir.path()).unwrap();
            store.append(sample_pool("a")).await.unwrap();
        }
        let store = RocksDbPoolStore::open(dir.path()).unwrap();
        let id = store.append(sample_pool("b")).await.unwrap();
        assert_eq!(id, PoolId(1));
        assert_eq!(store.count().await.unwrap(), 2);
    }
}

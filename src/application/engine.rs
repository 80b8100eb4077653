use crate::config::EngineConfig;
use crate::domain::accrual;
use crate::domain::event::PoolEvent;
use crate::domain::pool::{AccountId, Amount, Asset, Balance, Pool, PoolId, Timestamp, TokenId};
use crate::domain::ports::{AssetLedgerBox, ClockBox, EventSinkBox, PoolStoreBox};
use crate::error::{PoolError, Result};
use std::collections::HashSet;

/// The pool accounting engine: registry, withdrawal processor and accrual
/// queries behind one serialized facade.
///
/// Sequential consistency comes from the host: methods take `&self`, await
/// every port operation, and the host issues one operation at a time. Each
/// call is all-or-nothing — a failed validation or transfer leaves no
/// observable ledger mutation behind.
pub struct PoolEngine {
    store: PoolStoreBox,
    ledger: AssetLedgerBox,
    events: EventSinkBox,
    clock: ClockBox,
    config: EngineConfig,
}

impl PoolEngine {
    pub fn new(
        store: PoolStoreBox,
        ledger: AssetLedgerBox,
        events: EventSinkBox,
        clock: ClockBox,
    ) -> Self {
        Self::with_config(store, ledger, events, clock, EngineConfig::default())
    }

    pub fn with_config(
        store: PoolStoreBox,
        ledger: AssetLedgerBox,
        events: EventSinkBox,
        clock: ClockBox,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            events,
            clock,
            config,
        }
    }

    /// Creates a pool escrowing native currency. The deposit is the value
    /// attached to the call, so it is exact by construction.
    pub async fn create_native_pool(
        &self,
        creator: AccountId,
        name: String,
        recipients: Vec<AccountId>,
        deposit: Amount,
        start_time: Timestamp,
        stop_time: Timestamp,
    ) -> Result<PoolId> {
        self.create_pool(creator, name, recipients, deposit, Asset::Native, start_time, stop_time)
            .await
    }

    /// Creates a pool escrowing a fungible token via a pull transfer. The
    /// creator must have authorized at least `deposit` to the engine's
    /// custody beforehand; that authorization is external to this core.
    pub async fn create_token_pool(
        &self,
        creator: AccountId,
        name: String,
        recipients: Vec<AccountId>,
        deposit: Amount,
        token: TokenId,
        start_time: Timestamp,
        stop_time: Timestamp,
    ) -> Result<PoolId> {
        self.create_pool(
            creator,
            name,
            recipients,
            deposit,
            Asset::Token(token),
            start_time,
            stop_time,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_pool(
        &self,
        creator: AccountId,
        name: String,
        recipients: Vec<AccountId>,
        deposit: Amount,
        asset: Asset,
        start_time: Timestamp,
        stop_time: Timestamp,
    ) -> Result<PoolId> {
        let now = self.clock.now();
        self.validate_terms(&creator, &recipients, start_time, stop_time, now)?;

        // Escrow before any record exists; a failed transfer consumes no id.
        self.ledger.transfer_in(&asset, &creator, deposit).await?;

        let mut pool = Pool::new(name, creator, recipients, asset, deposit, start_time, stop_time);
        match self.store.append(pool.clone()).await {
            Ok(id) => pool.id = id,
            Err(err) => {
                // A storage fault must not strand the deposit in custody.
                self.ledger
                    .transfer_out(&pool.asset, &pool.creator, deposit)
                    .await?;
                return Err(err);
            }
        }

        self.events.append(PoolEvent::created(&pool)).await?;
        Ok(pool.id)
    }

    fn validate_terms(
        &self,
        creator: &AccountId,
        recipients: &[AccountId],
        start_time: Timestamp,
        stop_time: Timestamp,
        now: Timestamp,
    ) -> Result<()> {
        if recipients.is_empty() {
            return Err(PoolError::Validation(
                "there should be at least one recipient".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for recipient in recipients {
            if recipient.is_zero() {
                return Err(PoolError::Validation(
                    "no recipient address provided".to_string(),
                ));
            }
            if *recipient == self.config.custody {
                return Err(PoolError::Validation(
                    "recipient should not be the engine".to_string(),
                ));
            }
            if recipient == creator {
                return Err(PoolError::Validation(
                    "recipient should not be the creator".to_string(),
                ));
            }
            if !seen.insert(recipient) {
                return Err(PoolError::Validation(format!(
                    "duplicate recipient {recipient}"
                )));
            }
        }
        if start_time <= now {
            return Err(PoolError::Validation(
                "start time should be after the current time".to_string(),
            ));
        }
        if stop_time <= start_time {
            return Err(PoolError::Validation(
                "stop time should be greater than start time".to_string(),
            ));
        }
        if stop_time.0 - start_time.0 < self.config.min_pool_duration_secs {
            return Err(PoolError::Validation(format!(
                "vesting window must span at least {} seconds",
                self.config.min_pool_duration_secs
            )));
        }
        Ok(())
    }

    /// Executes a withdrawal and returns the pool's new remaining balance.
    ///
    /// Bookkeeping lands in the store before the outward transfer runs, so
    /// a reentrant call through `transfer_out` sees the debited books. If
    /// the transfer then fails, the prior record is restored before the
    /// error surfaces — under the host's serialized execution this is
    /// indistinguishable from never having mutated it. If the compensating
    /// write itself fails, the storage error surfaces and the host must
    /// treat it as fatal: the books and the ledger no longer agree.
    pub async fn withdraw(
        &self,
        pool_id: PoolId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<Balance> {
        let now = self.clock.now();
        let pool = self.pool(pool_id).await?;
        if !pool.is_participant(account) {
            return Err(PoolError::Unauthorized(format!(
                "{account} is neither creator nor recipient of pool {pool_id}"
            )));
        }
        let entitled = accrual::accrued(&pool, account, now);
        if Balance::from(amount) > entitled {
            return Err(PoolError::InsufficientAccrued {
                requested: amount.into(),
                entitled,
            });
        }

        let previous = pool.clone();
        let mut staged = pool;
        let remaining = staged.record_withdrawal(account, amount)?;
        let asset = staged.asset.clone();
        self.store.update(staged).await?;

        if let Err(err) = self.ledger.transfer_out(&asset, account, amount).await {
            self.store.update(previous).await?;
            return Err(err);
        }

        self.events
            .append(PoolEvent::WithdrawFromDPool {
                pool_id,
                account: account.clone(),
                amount: amount.into(),
                remaining_balance: remaining,
            })
            .await?;
        Ok(remaining)
    }

    /// Claimable balance of `account` in `pool_id` at the current clock
    /// reading. Read-only.
    pub async fn balance_of(&self, pool_id: PoolId, account: &AccountId) -> Result<Balance> {
        let pool = self.pool(pool_id).await?;
        Ok(accrual::accrued(&pool, account, self.clock.now()))
    }

    pub async fn pool_count(&self) -> Result<u64> {
        self.store.count().await
    }

    pub async fn pool(&self, id: PoolId) -> Result<Pool> {
        self.store
            .get(id)
            .await?
            .ok_or(PoolError::NotFound(id))
    }

    /// Ids are assigned densely from zero, so index and id coincide.
    pub async fn pool_by_index(&self, index: u64) -> Result<Pool> {
        self.pool(PoolId(index)).await
    }

    pub async fn pools(&self) -> Result<Vec<Pool>> {
        self.store.all().await
    }

    /// Pools funded by `account`. Unknown accounts yield an empty list.
    pub async fn pools_by_creator(&self, account: &AccountId) -> Result<Vec<Pool>> {
        Ok(self
            .pools()
            .await?
            .into_iter()
            .filter(|pool| pool.creator == *account)
            .collect())
    }

    /// Pools naming `account` as a recipient. Unknown accounts yield an
    /// empty list.
    pub async fn pools_by_recipient(&self, account: &AccountId) -> Result<Vec<Pool>> {
        Ok(self
            .pools()
            .await?
            .into_iter()
            .filter(|pool| pool.recipients.contains(account))
            .collect())
    }

    pub async fn recipient_pool_ids(&self, account: &AccountId) -> Result<Vec<PoolId>> {
        Ok(self
            .pools_by_recipient(account)
            .await?
            .into_iter()
            .map(|pool| pool.id)
            .collect())
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

use crate::domain::pool::AccountId;

/// Engine policy knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Address holding escrowed deposits. Never a valid recipient.
    pub custody: AccountId,
    /// Minimum vesting window in seconds. A product policy, not a
    /// protocol rule: one deployment required at least 23 hours, the
    /// default enforces nothing beyond `stop_time > start_time`.
    pub min_pool_duration_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            custody: AccountId::new("pool-custody"),
            min_pool_duration_secs: 0,
        }
    }
}

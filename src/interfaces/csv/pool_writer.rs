use crate::domain::pool::{Asset, Pool, Timestamp};
use crate::error::Result;
use std::io::Write;

/// Writes the final pool table as CSV, one row per pool in id order.
/// `state` is derived from `now`, the host clock reading at output time.
pub struct PoolWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PoolWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_pools(&mut self, mut pools: Vec<Pool>, now: Timestamp) -> Result<()> {
        self.writer.write_record([
            "pool_id",
            "name",
            "creator",
            "asset_kind",
            "token",
            "total_deposit",
            "remaining_balance",
            "start_time",
            "stop_time",
            "state",
        ])?;
        pools.sort_by_key(|pool| pool.id);
        for pool in pools {
            let token = match &pool.asset {
                Asset::Native => String::new(),
                Asset::Token(token) => token.to_string(),
            };
            self.writer.write_record([
                pool.id.to_string(),
                pool.name.clone(),
                pool.creator.to_string(),
                pool.asset.kind_str().to_string(),
                token,
                pool.total_deposit.to_string(),
                pool.remaining_balance.to_string(),
                pool.start_time.to_string(),
                pool.stop_time.to_string(),
                pool.state(now).to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

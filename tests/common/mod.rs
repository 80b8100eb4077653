use serde_json::{Value, json};
use std::fs::File;
use std::io::{Error, Write};
use std::path::Path;

pub fn write_ops(path: &Path, ops: &[Value]) -> Result<(), Error> {
    let mut file = File::create(path)?;
    for op in ops {
        writeln!(file, "{op}")?;
    }
    Ok(())
}

/// Funds `milo` with TTK, approves the engine and creates a four-recipient
/// token pool vesting from t=1000 to t=2000, mirroring the canonical
/// DecentralizedPools test fixture.
pub fn token_pool_setup(deposit: u64) -> Vec<Value> {
    vec![
        json!({"op": "credit", "account": "milo",
               "asset": {"kind": "token", "token": "TTK"}, "amount": 90_000}),
        json!({"op": "approve", "owner": "milo", "token": "TTK", "amount": 90_000}),
        json!({"op": "create_token_pool", "at": 100, "creator": "milo",
               "name": "team vest", "recipients": ["bob", "mark", "maga", "goku"],
               "deposit": deposit, "token": "TTK",
               "start_time": 1_000, "stop_time": 2_000}),
    ]
}

pub fn withdraw(at: u64, pool_id: u64, account: &str, amount: u64) -> Value {
    json!({"op": "withdraw", "at": at, "pool_id": pool_id,
           "account": account, "amount": amount})
}

#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use serde_json::json;
use std::process::Command;
use tempfile::{NamedTempFile, tempdir};

mod common;

#[test]
fn test_rocksdb_pools_survive_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("pools_db");

    // 1. First run: create pool 0.
    let ops1 = NamedTempFile::new().unwrap();
    common::write_ops(ops1.path(), &common::token_pool_setup(300)).unwrap();

    let output1 = Command::new(cargo_bin!("dpools"))
        .arg(ops1.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("0,team vest,milo,token,TTK,300,300,1000,2000,"));

    // 2. Second run against the same database: pool 0 is recovered and
    //    the id sequence continues at 1.
    let ops2 = NamedTempFile::new().unwrap();
    common::write_ops(
        ops2.path(),
        &[
            json!({"op": "credit", "account": "alice",
                   "asset": {"kind": "native"}, "amount": 500}),
            json!({"op": "create_native_pool", "at": 100, "creator": "alice",
                   "name": "second", "recipients": ["goku"], "deposit": 500,
                   "start_time": 1_000, "stop_time": 2_000}),
        ],
    )
    .unwrap();

    let output2 = Command::new(cargo_bin!("dpools"))
        .arg(ops2.path())
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("0,team vest,milo,token,TTK,300,300,1000,2000,"));
    assert!(stdout2.contains("1,second,alice,native,,500,500,1000,2000,"));
}

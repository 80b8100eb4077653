use clap::Parser;
use dpools::application::engine::PoolEngine;
use dpools::config::EngineConfig;
use dpools::domain::operation::Operation;
use dpools::domain::pool::Timestamp;
use dpools::domain::ports::{Clock, PoolStoreBox};
use dpools::infrastructure::in_memory::{
    InMemoryEventLog, InMemoryLedger, InMemoryPoolStore, ManualClock,
};
use dpools::interfaces::csv::pool_writer::PoolWriter;
use dpools::interfaces::jsonl::operation_reader::OperationReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input operations file, one JSON operation per line
    input: PathBuf,

    /// Path to a persistent pool database (requires the storage-rocksdb feature)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Minimum vesting window in seconds (policy; 0 disables the check)
    #[arg(long, default_value_t = 0)]
    min_duration_secs: u64,

    /// Write the event log to this file as JSON lines
    #[arg(long)]
    events_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = EngineConfig {
        min_pool_duration_secs: cli.min_duration_secs,
        ..EngineConfig::default()
    };
    let clock = ManualClock::new(Timestamp(0));
    let ledger = InMemoryLedger::new(config.custody.clone());
    let events = InMemoryEventLog::new();

    let store: PoolStoreBox = match cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => Box::new(
            dpools::infrastructure::rocksdb::RocksDbPoolStore::open(db_path).into_diagnostic()?,
        ),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            return Err(miette::miette!(
                "rebuild with --features storage-rocksdb to use --db-path"
            ));
        }
        None => Box::new(InMemoryPoolStore::new()),
    };

    let engine = PoolEngine::with_config(
        store,
        Box::new(ledger.clone()),
        Box::new(events.clone()),
        Box::new(clock.clone()),
        config,
    );

    // Process operations. Each op is atomic; a failed op is reported and
    // the stream continues (retry is the caller's business, not ours).
    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = OperationReader::new(file);
    for op_result in reader.operations() {
        match op_result {
            Ok(op) => {
                if let Err(e) = apply(&engine, &ledger, &clock, op).await {
                    eprintln!("Error processing operation: {e}");
                }
            }
            Err(e) => {
                eprintln!("Error reading operation: {e}");
            }
        }
    }

    if let Some(path) = cli.events_out {
        let mut out = File::create(path).into_diagnostic()?;
        for event in events.all().await {
            serde_json::to_writer(&mut out, &event).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }

    // Output the final pool table.
    let pools = engine.pools().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = PoolWriter::new(stdout.lock());
    writer.write_pools(pools, clock.now()).into_diagnostic()?;

    Ok(())
}

async fn apply(
    engine: &PoolEngine,
    ledger: &InMemoryLedger,
    clock: &ManualClock,
    op: Operation,
) -> dpools::error::Result<()> {
    match op {
        Operation::Credit {
            account,
            asset,
            amount,
        } => {
            ledger.credit(&asset, &account, amount).await;
            Ok(())
        }
        Operation::Approve {
            owner,
            token,
            amount,
        } => {
            ledger.approve(&token, &owner, amount).await;
            Ok(())
        }
        Operation::CreateNativePool {
            at,
            creator,
            name,
            recipients,
            deposit,
            start_time,
            stop_time,
        } => {
            clock.set(at);
            engine
                .create_native_pool(creator, name, recipients, deposit, start_time, stop_time)
                .await
                .map(|_| ())
        }
        Operation::CreateTokenPool {
            at,
            creator,
            name,
            recipients,
            deposit,
            token,
            start_time,
            stop_time,
        } => {
            clock.set(at);
            engine
                .create_token_pool(
                    creator, name, recipients, deposit, token, start_time, stop_time,
                )
                .await
                .map(|_| ())
        }
        Operation::Withdraw {
            at,
            pool_id,
            account,
            amount,
        } => {
            clock.set(at);
            engine.withdraw(pool_id, &account, amount).await.map(|_| ())
        }
    }
}

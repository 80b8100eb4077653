use dpools::application::engine::PoolEngine;
use dpools::config::EngineConfig;
use dpools::domain::pool::{AccountId, Amount, Asset, Balance, PoolId, Timestamp, TokenId};
use dpools::domain::ports::Clock;
use dpools::infrastructure::in_memory::{
    InMemoryEventLog, InMemoryLedger, InMemoryPoolStore, ManualClock,
};
use rand::Rng;

struct Harness {
    engine: PoolEngine,
    ledger: InMemoryLedger,
    clock: ManualClock,
}

fn harness() -> Harness {
    let config = EngineConfig::default();
    let ledger = InMemoryLedger::new(config.custody.clone());
    let clock = ManualClock::new(Timestamp(100));
    let engine = PoolEngine::with_config(
        Box::new(InMemoryPoolStore::new()),
        Box::new(ledger.clone()),
        Box::new(InMemoryEventLog::new()),
        Box::new(clock.clone()),
        config,
    );
    Harness {
        engine,
        ledger,
        clock,
    }
}

async fn create_token_pool(h: &Harness, deposit: u128, recipients: &[AccountId]) -> PoolId {
    let token = TokenId::from("TTK");
    let creator = AccountId::from("milo");
    h.ledger
        .credit(
            &Asset::Token(token.clone()),
            &creator,
            Amount::new(deposit).unwrap(),
        )
        .await;
    h.ledger
        .approve(&token, &creator, Amount::new(deposit).unwrap())
        .await;
    h.engine
        .create_token_pool(
            creator,
            "soak".to_string(),
            recipients.to_vec(),
            Amount::new(deposit).unwrap(),
            token,
            Timestamp(1_000),
            Timestamp(101_000),
        )
        .await
        .unwrap()
}

/// Conservation must hold after every operation, successful or not, for
/// arbitrary interleavings of withdrawal attempts.
#[tokio::test]
async fn test_randomized_withdrawals_conserve_the_deposit() {
    let mut rng = rand::thread_rng();

    for _ in 0..20 {
        let h = harness();
        let n = rng.gen_range(1..=6);
        let recipients: Vec<AccountId> = (0..n)
            .map(|i| AccountId::new(format!("recipient-{i}")))
            .collect();
        let deposit: u128 = rng.gen_range(1..=1_000_000_000_000);
        let id = create_token_pool(&h, deposit, &recipients).await;

        let mut participants = recipients.clone();
        participants.push(AccountId::from("milo"));
        participants.push(AccountId::from("stranger"));

        let mut at = 1_000u64;
        for _ in 0..50 {
            at += rng.gen_range(0..5_000);
            h.clock.set(Timestamp(at));
            let account = &participants[rng.gen_range(0..participants.len())];
            let amount = rng.gen_range(1..=deposit / 2 + 1);
            // Failures are expected; state must stay consistent either way.
            let _ = h
                .engine
                .withdraw(id, account, Amount::new(amount).unwrap())
                .await;

            let pool = h.engine.pool(id).await.unwrap();
            assert_eq!(
                pool.remaining_balance + pool.total_withdrawn(),
                pool.total_deposit,
                "conservation broken at t={at} for deposit {deposit}"
            );
        }

        // Everyone who withdrew stayed within entitlement.
        let pool = h.engine.pool(id).await.unwrap();
        for account in &participants {
            let withdrawn = pool.withdrawn_by(account);
            let share = dpools::domain::accrual::share_of(&pool, account)
                .unwrap_or(Balance::ZERO);
            assert!(withdrawn <= share, "{account} overdrew: {withdrawn} > {share}");
        }
    }
}

/// `balance_of` is non-decreasing in time while nothing is withdrawn, and
/// never exceeds the account's share.
#[tokio::test]
async fn test_accrual_is_monotonic_in_time() {
    let h = harness();
    let recipients = vec![AccountId::from("bob"), AccountId::from("mark")];
    let id = create_token_pool(&h, 1_000_003, &recipients).await;
    let bob = AccountId::from("bob");

    let pool = h.engine.pool(id).await.unwrap();
    let share = dpools::domain::accrual::share_of(&pool, &bob).unwrap();

    let mut rng = rand::thread_rng();
    let mut previous = Balance::ZERO;
    let mut at = 500u64;
    for _ in 0..200 {
        at += rng.gen_range(1..2_000);
        h.clock.set(Timestamp(at));
        let claimable = h.engine.balance_of(id, &bob).await.unwrap();
        assert!(claimable >= previous, "accrual regressed at t={at}");
        assert!(claimable <= share);
        previous = claimable;
    }
    // Past the stop time the full share is claimable.
    h.clock.set(Timestamp(1_000_000));
    assert_eq!(h.engine.balance_of(id, &bob).await.unwrap(), share);
}

/// A successful withdrawal of X reduces a subsequent `balance_of` by
/// exactly X.
#[tokio::test]
async fn test_withdrawal_effect_is_exact() {
    let h = harness();
    let recipients = vec![AccountId::from("bob"), AccountId::from("mark")];
    let id = create_token_pool(&h, 100_000, &recipients).await;
    let bob = AccountId::from("bob");

    h.clock.set(Timestamp(51_000)); // half the window
    let before = h.engine.balance_of(id, &bob).await.unwrap();
    assert!(before > Balance::ZERO);

    let taken = 1_234u128;
    h.engine
        .withdraw(id, &bob, Amount::new(taken).unwrap())
        .await
        .unwrap();
    let after = h.engine.balance_of(id, &bob).await.unwrap();
    assert_eq!(before - after, Balance(taken));

    let pool = h.engine.pool(id).await.unwrap();
    assert_eq!(pool.withdrawn_by(&bob), Balance(taken));
    assert_eq!(pool.remaining_balance, Balance(100_000 - taken));
    assert_eq!(h.clock.now(), Timestamp(51_000));
}

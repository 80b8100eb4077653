//! Pure entitlement arithmetic: no state, no I/O, callable at any time to
//! back the read-only claimable-balance query.

use super::pool::{AccountId, Balance, Pool, Timestamp};

/// Portion of the deposit assigned to `account`, or `None` for outsiders.
///
/// Recipients split the deposit equally with truncating division; the
/// creator holds the undistributed remainder of that split, vesting on the
/// same schedule. The shares therefore sum to exactly `total_deposit`.
pub fn share_of(pool: &Pool, account: &AccountId) -> Option<Balance> {
    let n = pool.recipients.len() as u128;
    let per_recipient = pool.total_deposit.0 / n;
    if pool.recipients.contains(account) {
        Some(Balance(per_recipient))
    } else if *account == pool.creator {
        Some(Balance(pool.total_deposit.0 - per_recipient * n))
    } else {
        None
    }
}

/// Amount `account` is entitled to withdraw at `at`, net of what it has
/// already taken.
pub fn accrued(pool: &Pool, account: &AccountId, at: Timestamp) -> Balance {
    let Some(share) = share_of(pool, account) else {
        return Balance::ZERO;
    };
    if at <= pool.start_time {
        return Balance::ZERO;
    }
    let elapsed = at.0.min(pool.stop_time.0) - pool.start_time.0;
    let duration = pool.stop_time.0 - pool.start_time.0;
    let gross = mul_div(share.0, elapsed as u128, duration as u128);
    Balance(gross.saturating_sub(pool.withdrawn_by(account).0))
}

/// Exact truncating `a * b / d` for `b <= d`, without intermediate
/// overflow: `b` and `d` fit in 64 bits, so `(a % d) * b < 2^128`, and the
/// quotient term never exceeds `a`.
fn mul_div(a: u128, b: u128, d: u128) -> u128 {
    debug_assert!(d > 0 && b <= d);
    (a / d) * b + (a % d) * b / d
}

use crate::error::{PoolError, Result};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Monotonically assigned pool identifier.
///
/// Ids start at zero, are never reused and double as the arena index, so
/// `get_by_index` and `get_by_id` coincide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PoolId(pub u64);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque ledger address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null address; never a valid recipient.
    pub fn zero() -> Self {
        Self("0x0000000000000000000000000000000000000000".to_string())
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Identifier of a fungible-token contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The two supported asset kinds, abstracted behind one ledger interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "token", rename_all = "lowercase")]
pub enum Asset {
    Native,
    Token(TokenId),
}

impl Asset {
    pub fn kind_str(&self) -> &'static str {
        match self {
            Asset::Native => "native",
            Asset::Token(_) => "token",
        }
    }
}

/// Engine-clock reading in seconds since the epoch.
///
/// The external boundary uses seconds exclusively. Earlier clients mixed
/// milliseconds and seconds; this type pins the unit once and for all.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn secs(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger balance in the asset's smallest unit.
///
/// Wraps `u128` to keep financial arithmetic integer-only: no floating
/// point anywhere, division truncates toward zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Balance(pub u128);

impl Balance {
    pub const ZERO: Self = Self(0);

    pub fn new(units: u128) -> Self {
        Self(units)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A strictly positive amount for deposits and withdrawal requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(u128);

impl Amount {
    pub fn new(units: u128) -> Result<Self> {
        if units > 0 {
            Ok(Self(units))
        } else {
            Err(PoolError::Validation(
                "deposit should be greater than 0".to_string(),
            ))
        }
    }

    pub fn value(&self) -> u128 {
        self.0
    }
}

impl TryFrom<u128> for Amount {
    type Error = PoolError;

    fn try_from(units: u128) -> Result<Self> {
        Self::new(units)
    }
}

impl From<Amount> for u128 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Wire format shared by `Balance` and `Amount`: values fitting in 64 bits
// travel as JSON numbers, wider ones as decimal strings. The tagged
// operation and event enums buffer their fields through an intermediate
// representation without 128-bit integers, so a bare u128 number would be
// rejected at that boundary.
fn serialize_units<S: Serializer>(
    units: u128,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match u64::try_from(units) {
        Ok(narrow) => serializer.serialize_u64(narrow),
        Err(_) => serializer.collect_str(&units),
    }
}

struct UnitsVisitor;

impl Visitor<'_> for UnitsVisitor {
    type Value = u128;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a decimal string")
    }

    fn visit_u64<E: de::Error>(self, units: u64) -> std::result::Result<u128, E> {
        Ok(units as u128)
    }

    fn visit_u128<E: de::Error>(self, units: u128) -> std::result::Result<u128, E> {
        Ok(units)
    }

    fn visit_str<E: de::Error>(self, units: &str) -> std::result::Result<u128, E> {
        units.parse().map_err(de::Error::custom)
    }
}

impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_units(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(UnitsVisitor).map(Balance)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_units(self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let units = deserializer.deserialize_any(UnitsVisitor)?;
        Amount::new(units).map_err(de::Error::custom)
    }
}

/// Lifecycle of a pool, driven only by time and withdrawals.
///
/// There is no cancel, pause or edit transition; `Exhausted` is terminal
/// but the record stays queryable forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolState {
    Scheduled,
    Vesting,
    FullyVested,
    Exhausted,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PoolState::Scheduled => "scheduled",
            PoolState::Vesting => "vesting",
            PoolState::FullyVested => "fully_vested",
            PoolState::Exhausted => "exhausted",
        };
        write!(f, "{label}")
    }
}

/// The unit of escrow and vesting.
///
/// Terms (`name`, `creator`, `recipients`, `asset`, `total_deposit`,
/// `start_time`, `stop_time`) are fixed at creation; only `withdrawn`
/// and `remaining_balance` ever change, and only through
/// [`Pool::record_withdrawal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    pub name: String,
    pub creator: AccountId,
    pub recipients: Vec<AccountId>,
    pub asset: Asset,
    pub total_deposit: Balance,
    pub start_time: Timestamp,
    pub stop_time: Timestamp,
    pub remaining_balance: Balance,
    pub withdrawn: BTreeMap<AccountId, Balance>,
}

impl Pool {
    /// Builds a freshly funded pool record. The id is assigned by the
    /// store on append; the value passed here is a placeholder.
    pub fn new(
        name: impl Into<String>,
        creator: AccountId,
        recipients: Vec<AccountId>,
        asset: Asset,
        deposit: Amount,
        start_time: Timestamp,
        stop_time: Timestamp,
    ) -> Self {
        let mut withdrawn: BTreeMap<AccountId, Balance> = recipients
            .iter()
            .cloned()
            .map(|recipient| (recipient, Balance::ZERO))
            .collect();
        withdrawn.insert(creator.clone(), Balance::ZERO);
        Self {
            id: PoolId(0),
            name: name.into(),
            creator,
            recipients,
            asset,
            total_deposit: deposit.into(),
            start_time,
            stop_time,
            remaining_balance: deposit.into(),
            withdrawn,
        }
    }

    /// Whether `account` may withdraw from this pool at all.
    pub fn is_participant(&self, account: &AccountId) -> bool {
        *account == self.creator || self.recipients.contains(account)
    }

    /// Cumulative amount `account` has withdrawn so far.
    pub fn withdrawn_by(&self, account: &AccountId) -> Balance {
        self.withdrawn.get(account).copied().unwrap_or(Balance::ZERO)
    }

    pub fn total_withdrawn(&self) -> Balance {
        self.withdrawn
            .values()
            .fold(Balance::ZERO, |sum, w| sum + *w)
    }

    pub fn state(&self, now: Timestamp) -> PoolState {
        if self.remaining_balance == Balance::ZERO {
            PoolState::Exhausted
        } else if now < self.start_time {
            PoolState::Scheduled
        } else if now < self.stop_time {
            PoolState::Vesting
        } else {
            PoolState::FullyVested
        }
    }

    /// Books a withdrawal against this record and returns the new
    /// remaining balance.
    ///
    /// Checks authorization and the balance-side precondition; the
    /// entitlement check against accrual is the engine's concern since it
    /// needs the clock. Conservation holds after every successful call:
    /// `remaining_balance + Σ withdrawn == total_deposit`.
    pub fn record_withdrawal(&mut self, account: &AccountId, amount: Amount) -> Result<Balance> {
        if !self.is_participant(account) {
            return Err(PoolError::Unauthorized(format!(
                "{account} is neither creator nor recipient of pool {}",
                self.id
            )));
        }
        let amount = Balance::from(amount);
        if amount > self.remaining_balance {
            return Err(PoolError::InsufficientRemainingBalance {
                requested: amount,
                remaining: self.remaining_balance,
            });
        }
        *self.withdrawn.entry(account.clone()).or_insert(Balance::ZERO) += amount;
        self.remaining_balance -= amount;
        debug_assert_eq!(
            self.remaining_balance + self.total_withdrawn(),
            self.total_deposit
        );
        Ok(self.remaining_balance)
    }
}

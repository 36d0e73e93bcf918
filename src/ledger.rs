//! Bilateral liabilities between the participants of a channel.
//!
//! For every ordered pair `(from, to)` of participant indices the ledger keeps
//! two per-asset balances: the amount `from` has asked `to` to settle
//! (pending) and the amount `to` has confirmed so far (executed).

use std::collections::{btree_map, BTreeMap};

use core::fmt::Display;

use tracing::warn;

use crate::{abiencode::types::U256, channel::PartIdx};

/// Identifies an asset, e.g. `"ETH"` or `"USDT"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetCode(String);

impl AssetCode {
    pub fn new(code: impl Into<String>) -> Self {
        AssetCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetCode {
    fn from(code: &str) -> Self {
        AssetCode(code.to_owned())
    }
}

impl From<String> for AssetCode {
    fn from(code: String) -> Self {
        AssetCode(code)
    }
}

impl Display for AssetCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum LedgerError {
    #[error("no liabilities recorded from participant {from} to participant {to}")]
    NoSuchPair { from: PartIdx, to: PartIdx },
    #[error("no pending liability in {asset}")]
    NoPendingAmount { asset: AssetCode },
    #[error("amount {requested} exceeds the pending liability of {pending} {asset}")]
    AmountExceedsPending {
        asset: AssetCode,
        requested: U256,
        pending: U256,
    },
}

/// Balances of a single `(from, to)` pair.
///
/// Pending entries are removed when they drop to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairLiabilities {
    pub(crate) pending: BTreeMap<AssetCode, U256>,
    pub(crate) executed: BTreeMap<AssetCode, U256>,
}

impl PairLiabilities {
    pub fn pending(&self) -> &BTreeMap<AssetCode, U256> {
        &self.pending
    }

    pub fn executed(&self) -> &BTreeMap<AssetCode, U256> {
        &self.executed
    }

    fn merge(&mut self, other: &PairLiabilities) {
        for (asset, amount) in &other.pending {
            add_to(&mut self.pending, asset, *amount);
        }
        for (asset, amount) in &other.executed {
            add_to(&mut self.executed, asset, *amount);
        }
    }
}

fn add_to(map: &mut BTreeMap<AssetCode, U256>, asset: &AssetCode, amount: U256) {
    if amount.is_zero() {
        return;
    }
    let entry = map.entry(asset.clone()).or_default();
    let (sum, overflow) = entry.overflowing_add(amount);
    if overflow {
        warn!(%asset, "liability amount capped at U256::MAX");
        *entry = U256::MAX;
    } else {
        *entry = sum;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiabilityLedger {
    pub(crate) pairs: BTreeMap<(PartIdx, PartIdx), PairLiabilities>,
}

impl LiabilityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` asks `to` for `amount` of `asset`.
    ///
    /// Always succeeds. A zero amount only creates the pair, a sum beyond
    /// `U256::MAX` is capped.
    pub fn request(&mut self, from: PartIdx, to: PartIdx, asset: &AssetCode, amount: U256) {
        let pair = self.pairs.entry((from, to)).or_default();
        add_to(&mut pair.pending, asset, amount);
    }

    /// Take `amount` of `asset` off pending and record it as the executed
    /// amount, replacing an earlier one.
    pub fn acknowledge(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let pair = self.take_pending(from, to, asset, amount)?;
        if amount.is_zero() {
            pair.executed.remove(asset);
        } else {
            pair.executed.insert(asset.clone(), amount);
        }
        Ok(())
    }

    /// Withdraw `amount` of a pending request without executing it.
    pub fn revert(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<(), LedgerError> {
        self.take_pending(from, to, asset, amount)?;
        Ok(())
    }

    // Validates before mutating, so a failed call leaves the ledger untouched.
    fn take_pending(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<&mut PairLiabilities, LedgerError> {
        let pair = self
            .pairs
            .get_mut(&(from, to))
            .ok_or(LedgerError::NoSuchPair { from, to })?;

        let btree_map::Entry::Occupied(mut pending) = pair.pending.entry(asset.clone()) else {
            return Err(LedgerError::NoPendingAmount {
                asset: asset.clone(),
            });
        };
        if amount > *pending.get() {
            return Err(LedgerError::AmountExceedsPending {
                asset: asset.clone(),
                requested: amount,
                pending: *pending.get(),
            });
        }

        let rest = *pending.get() - amount;
        if rest.is_zero() {
            pending.remove();
        } else {
            pending.insert(rest);
        }
        Ok(pair)
    }

    /// Add all balances of `other` to this ledger, capping at `U256::MAX`.
    pub fn merge(&mut self, other: &LiabilityLedger) {
        for (key, theirs) in &other.pairs {
            self.pairs.entry(*key).or_default().merge(theirs);
        }
    }

    pub fn pair(&self, from: PartIdx, to: PartIdx) -> Option<&PairLiabilities> {
        self.pairs.get(&(from, to))
    }

    /// Pending amount of `asset`, zero if there is none.
    pub fn pending(&self, from: PartIdx, to: PartIdx, asset: &AssetCode) -> U256 {
        self.pair(from, to)
            .and_then(|p| p.pending.get(asset).copied())
            .unwrap_or_default()
    }

    /// Executed amount of `asset`, zero if there is none.
    pub fn executed(&self, from: PartIdx, to: PartIdx, asset: &AssetCode) -> U256 {
        self.pair(from, to)
            .and_then(|p| p.executed.get(asset).copied())
            .unwrap_or_default()
    }

    /// Iterate over all pairs in `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = (&(PartIdx, PartIdx), &PairLiabilities)> {
        self.pairs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Whether any pair still has pending requests.
    pub fn has_pending(&self) -> bool {
        self.pairs.values().any(|p| !p.pending.is_empty())
    }
}

//! Player economy seam.
//!
//! The simulation never owns currency persistence. It talks to an
//! [`Economy`] collaborator injected at construction: spawn requests are
//! gated and debited through it, and enemy kills credit it according to a
//! [`RewardPolicy`]. [`Wallet`] is the in-memory implementation used by the
//! headless runner and tests.
//!
//! All calculations use integer math for deterministic simulation.

use serde::{Deserialize, Serialize};

/// Currency collaborator consumed by spawning and kill rewards.
pub trait Economy: std::fmt::Debug + Send {
    /// Check whether `amount` can be paid right now.
    fn has_enough_funds(&self, amount: u32) -> bool;

    /// Debit `amount`. Returns false (and changes nothing) if funds are short.
    fn spend(&mut self, amount: u32) -> bool;

    /// Credit `amount`.
    fn reward(&mut self, amount: u32);

    /// Current balance, for reporting.
    fn funds(&self) -> i64;
}

/// Simple in-memory balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Wallet {
    /// Current balance.
    pub balance: i64,
    /// Lifetime credited amount.
    pub earned: i64,
    /// Lifetime debited amount.
    pub spent: i64,
}

impl Wallet {
    /// Create a wallet with a starting balance.
    #[must_use]
    pub const fn new(balance: i64) -> Self {
        Self {
            balance,
            earned: 0,
            spent: 0,
        }
    }
}

impl Economy for Wallet {
    fn has_enough_funds(&self, amount: u32) -> bool {
        self.balance >= i64::from(amount)
    }

    fn spend(&mut self, amount: u32) -> bool {
        // Free items are always allowed
        if amount == 0 {
            return true;
        }
        if !self.has_enough_funds(amount) {
            return false;
        }
        self.balance -= i64::from(amount);
        self.spent += i64::from(amount);
        true
    }

    fn reward(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.balance += i64::from(amount);
        self.earned += i64::from(amount);
    }

    fn funds(&self) -> i64 {
        self.balance
    }
}

/// How much the player earns for destroying an enemy agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardPolicy {
    /// The killed unit's cost plus a fixed bonus. Units missing from the
    /// roster pay `fallback` instead.
    CostPlusBonus {
        /// Added on top of the unit's cost.
        bonus: u32,
        /// Paid for units the roster does not describe.
        fallback: u32,
    },
    /// A flat amount for every kill.
    Flat {
        /// Amount per kill.
        amount: u32,
    },
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self::CostPlusBonus {
            bonus: 3,
            fallback: 10,
        }
    }
}

impl RewardPolicy {
    /// Reward for killing a unit. `unit_cost` is `None` when the unit has
    /// no roster entry.
    #[must_use]
    pub const fn reward_for(&self, unit_cost: Option<u32>) -> u32 {
        match (*self, unit_cost) {
            (Self::CostPlusBonus { bonus, .. }, Some(cost)) => cost.saturating_add(bonus),
            (Self::CostPlusBonus { fallback, .. }, None) => fallback,
            (Self::Flat { amount }, _) => amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_spend_is_all_or_nothing() {
        let mut wallet = Wallet::new(20);
        assert!(!wallet.spend(30));
        assert_eq!(wallet.funds(), 20);
        assert_eq!(wallet.spent, 0);

        assert!(wallet.spend(15));
        assert_eq!(wallet.funds(), 5);
        assert_eq!(wallet.spent, 15);
    }

    #[test]
    fn test_wallet_zero_cost_is_free() {
        let mut wallet = Wallet::new(0);
        assert!(wallet.spend(0));
        assert_eq!(wallet.funds(), 0);
    }

    #[test]
    fn test_wallet_reward_tracks_earnings() {
        let mut wallet = Wallet::new(100);
        wallet.reward(23);
        wallet.reward(0);
        assert_eq!(wallet.funds(), 123);
        assert_eq!(wallet.earned, 23);
    }

    #[test]
    fn test_reward_policy_cost_plus_bonus() {
        let policy = RewardPolicy::default();
        assert_eq!(policy.reward_for(Some(20)), 23);
        // Free units still pay the bonus; only unknown units fall back.
        assert_eq!(policy.reward_for(Some(0)), 3);
        assert_eq!(policy.reward_for(None), 10);
        assert_eq!(policy.reward_for(Some(u32::MAX)), u32::MAX);
    }

    #[test]
    fn test_reward_policy_flat() {
        let policy = RewardPolicy::Flat { amount: 10 };
        assert_eq!(policy.reward_for(Some(20)), 10);
        assert_eq!(policy.reward_for(Some(0)), 10);
        assert_eq!(policy.reward_for(None), 10);
    }
}

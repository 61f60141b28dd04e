use std::collections::BTreeSet;

use prize_draw_common::types::PrizeTier;

use crate::error::ContractError;

/// The immutable set of prize tiers a draw can award from.
#[derive(Clone, Debug, PartialEq)]
pub struct PrizeInventory {
    tiers: Vec<PrizeTier>,
}

impl PrizeInventory {
    /// Validate and sort the configured tiers.
    pub fn new(mut tiers: Vec<PrizeTier>) -> Result<Self, ContractError> {
        if tiers.is_empty() {
            return Err(ContractError::InvalidTiers {
                reason: "at least one tier is required".to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        for tier in &tiers {
            if tier.amount == 0 {
                return Err(ContractError::InvalidTiers {
                    reason: "tier amount must be greater than zero".to_string(),
                });
            }
            if tier.quota == 0 {
                return Err(ContractError::InvalidTiers {
                    reason: format!("tier {} has a zero quota", tier.amount),
                });
            }
            if !seen.insert(tier.amount) {
                return Err(ContractError::InvalidTiers {
                    reason: format!("tier {} is listed more than once", tier.amount),
                });
            }
        }

        tiers.sort_by_key(|t| t.amount);
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[PrizeTier] {
        &self.tiers
    }

    pub fn quota_of(&self, amount: u64) -> Option<u32> {
        self.tiers
            .iter()
            .find(|t| t.amount == amount)
            .map(|t| t.quota)
    }

    pub fn total_quota(&self) -> u64 {
        self.tiers.iter().map(|t| u64::from(t.quota)).sum()
    }

    pub fn into_tiers(self) -> Vec<PrizeTier> {
        self.tiers
    }
}

use cosmwasm_std::{Event, Storage, Timestamp};
use prize_draw_common::selection::{pick_weighted_tier, RollSource};
use prize_draw_common::types::{total_remaining, TierRemaining, WinnerRecord};

use crate::directory;
use crate::error::{describe_remaining, ContractError};
use crate::inventory::PrizeInventory;
use crate::ledger::{self, CommitOutcome};
use crate::state::DrawConfig;
use crate::store::DrawStore;

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 5;
pub const MAX_COMMIT_ATTEMPTS_LIMIT: u32 = 64;

/// Result of a successful draw.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawReceipt {
    pub record: WinnerRecord,
    /// Taken inside the same exclusive section as the commit
    pub remaining: Vec<TierRemaining>,
    /// Commit attempts used, 1 when there was no conflict
    pub attempts: u32,
}

impl DrawReceipt {
    pub fn to_event(&self) -> Event {
        Event::new("prize_draw_awarded")
            .add_attribute("winner_id", self.record.id.to_string())
            .add_attribute("phone", self.record.phone.clone())
            .add_attribute("tier", self.record.tier.to_string())
            .add_attribute("attempts", self.attempts.to_string())
            .add_attribute("remaining", describe_remaining(&self.remaining))
            .add_attribute("timestamp", self.record.awarded_at.seconds().to_string())
    }
}

pub fn validate_max_commit_attempts(attempts: u32) -> Result<u32, ContractError> {
    if attempts == 0 || attempts > MAX_COMMIT_ATTEMPTS_LIMIT {
        return Err(ContractError::InvalidInput {
            reason: format!(
                "max_commit_attempts must be between 1 and {MAX_COMMIT_ATTEMPTS_LIMIT}, got {attempts}"
            ),
        });
    }
    Ok(attempts)
}

/// Allocates prize tiers to participants, at most one award each and never
/// beyond a tier's quota.
#[derive(Clone, Debug)]
pub struct DrawEngine {
    inventory: PrizeInventory,
    max_commit_attempts: u32,
}

impl DrawEngine {
    pub fn new(inventory: PrizeInventory, max_commit_attempts: u32) -> Result<Self, ContractError> {
        Ok(Self {
            inventory,
            max_commit_attempts: validate_max_commit_attempts(max_commit_attempts)?,
        })
    }

    pub fn from_config(config: &DrawConfig) -> Result<Self, ContractError> {
        Self::new(
            PrizeInventory::new(config.tiers.clone())?,
            config.max_commit_attempts,
        )
    }

    pub fn inventory(&self) -> &PrizeInventory {
        &self.inventory
    }

    /// Run one draw for `phone`.
    ///
    /// 1. Trim and validate the identifier
    /// 2. Resolve the participant in the directory
    /// 3. Refuse participants that already won
    /// 4. Read remaining capacity per tier
    /// 5. Pick a tier weighted by remaining capacity
    /// 6. Guarded commit; on conflict go back to 3 with fresh reads
    ///
    /// Nothing is written unless the commit succeeds.
    pub fn draw<S, R>(
        &self,
        store: &S,
        phone: &str,
        now: Timestamp,
        rolls: &mut R,
    ) -> Result<DrawReceipt, ContractError>
    where
        S: DrawStore,
        R: RollSource,
    {
        let phone = directory::normalize_phone(phone)?;
        let participant = store.read(|storage| directory::find(storage, &phone))?;

        let mut attempts = 0;
        while attempts < self.max_commit_attempts {
            attempts += 1;

            let remaining = store.read(|storage| self.unclaimed_snapshot(storage, &phone))?;

            let Some(tier) = pick_weighted_tier(&remaining, rolls.next_roll()) else {
                return Err(ContractError::PoolExhausted { remaining });
            };

            let committed = store.commit(|storage| {
                match ledger::try_commit(storage, &self.inventory, &participant, tier, now)? {
                    CommitOutcome::Committed(record) => {
                        let remaining = ledger::remaining_by_tier(storage, &self.inventory)?;
                        Ok(Some((record, remaining)))
                    }
                    CommitOutcome::Conflict(_) => Ok(None),
                }
            })?;

            if let Some((record, remaining)) = committed {
                return Ok(DrawReceipt {
                    record,
                    remaining,
                    attempts,
                });
            }
        }

        Err(ContractError::Contention { phone, attempts })
    }

    /// Steps 1 to 4 of a draw, plus the exhausted-pool check, without
    /// selecting or writing anything. Returns the trimmed phone and the
    /// snapshot it was checked against.
    pub fn check_eligible<S: DrawStore>(
        &self,
        store: &S,
        phone: &str,
    ) -> Result<(String, Vec<TierRemaining>), ContractError> {
        let phone = directory::normalize_phone(phone)?;
        let remaining = store.read(|storage| {
            directory::find(storage, &phone)?;
            let remaining = self.unclaimed_snapshot(storage, &phone)?;
            if total_remaining(&remaining) == 0 {
                return Err(ContractError::PoolExhausted { remaining });
            }
            Ok(remaining)
        })?;
        Ok((phone, remaining))
    }

    /// Remaining capacity, or `AlreadyWon` when `phone` holds an award.
    fn unclaimed_snapshot(
        &self,
        storage: &dyn Storage,
        phone: &str,
    ) -> Result<Vec<TierRemaining>, ContractError> {
        let remaining = ledger::remaining_by_tier(storage, &self.inventory)?;
        if let Some(prior) = ledger::winner_of(storage, phone)? {
            return Err(ContractError::AlreadyWon {
                phone: prior.phone,
                tier: prior.tier,
                awarded_at: prior.awarded_at,
                remaining,
            });
        }
        Ok(remaining)
    }

    pub fn remaining_by_tier<S: DrawStore>(
        &self,
        store: &S,
    ) -> Result<Vec<TierRemaining>, ContractError> {
        store.read(|storage| Ok(ledger::remaining_by_tier(storage, &self.inventory)?))
    }

    pub fn has_won<S: DrawStore>(&self, store: &S, phone: &str) -> Result<bool, ContractError> {
        let phone = directory::normalize_phone(phone)?;
        store.read(|storage| Ok(ledger::has_won(storage, &phone)?))
    }

    /// Clear the ledger under exclusive access, so no commit can interleave.
    pub fn reset_all<S: DrawStore>(&self, store: &S) -> Result<u64, ContractError> {
        store.commit(|storage| Ok(ledger::reset_all(storage)?))
    }
}

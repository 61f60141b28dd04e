use cosmwasm_std::{Order, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;
use prize_draw_common::types::{Participant, TierRemaining, WinnerRecord};

use crate::inventory::PrizeInventory;
use crate::state::{LedgerState, LEDGER_STATE, TIER_AWARDED, WINNERS, WINNER_LOG};

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 100;

/// Why a guarded commit refused to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConflictReason {
    AlreadyWon,
    TierFull,
    UnknownTier,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CommitOutcome {
    Committed(WinnerRecord),
    Conflict(ConflictReason),
}

pub fn ledger_state(storage: &dyn Storage) -> StdResult<LedgerState> {
    Ok(LEDGER_STATE.may_load(storage)?.unwrap_or_default())
}

pub fn has_won(storage: &dyn Storage, phone: &str) -> StdResult<bool> {
    Ok(WINNERS.has(storage, phone))
}

pub fn winner_of(storage: &dyn Storage, phone: &str) -> StdResult<Option<WinnerRecord>> {
    WINNERS.may_load(storage, phone)
}

pub fn count_by_tier(storage: &dyn Storage, tier: u64) -> StdResult<u32> {
    Ok(TIER_AWARDED.may_load(storage, tier)?.unwrap_or(0))
}

/// Snapshot of quota usage for every configured tier, ascending by amount.
pub fn remaining_by_tier(
    storage: &dyn Storage,
    inventory: &PrizeInventory,
) -> StdResult<Vec<TierRemaining>> {
    inventory
        .tiers()
        .iter()
        .map(|tier| -> StdResult<TierRemaining> {
            let awarded = count_by_tier(storage, tier.amount)?;
            Ok(TierRemaining {
                tier: tier.amount,
                quota: tier.quota,
                awarded,
                remaining: tier.quota.saturating_sub(awarded),
            })
        })
        .collect()
}

/// Insert a winner record, re-checking both eligibility conditions against
/// the storage being written.
///
/// Callers must hold exclusive access to `storage` for the whole call; the
/// check and the insert are not separable.
pub fn try_commit(
    storage: &mut dyn Storage,
    inventory: &PrizeInventory,
    participant: &Participant,
    tier: u64,
    now: Timestamp,
) -> StdResult<CommitOutcome> {
    let Some(quota) = inventory.quota_of(tier) else {
        return Ok(CommitOutcome::Conflict(ConflictReason::UnknownTier));
    };
    if WINNERS.has(storage, &participant.phone) {
        return Ok(CommitOutcome::Conflict(ConflictReason::AlreadyWon));
    }
    let awarded = count_by_tier(storage, tier)?;
    if awarded >= quota {
        return Ok(CommitOutcome::Conflict(ConflictReason::TierFull));
    }

    let mut state = ledger_state(storage)?;
    let record = WinnerRecord {
        id: state.next_winner_id,
        phone: participant.phone.clone(),
        name: participant.name.clone(),
        tier,
        awarded_at: now,
    };

    WINNERS.save(storage, &record.phone, &record)?;
    WINNER_LOG.save(storage, record.id, &record.phone)?;
    TIER_AWARDED.save(storage, tier, &(awarded + 1))?;

    state.next_winner_id += 1;
    state.winner_count += 1;
    LEDGER_STATE.save(storage, &state)?;

    Ok(CommitOutcome::Committed(record))
}

/// Remove every winner record and zero every tier count.
/// Returns the number of records removed.
pub fn reset_all(storage: &mut dyn Storage) -> StdResult<u64> {
    let phones = WINNERS
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<String>>>()?;
    for phone in &phones {
        WINNERS.remove(storage, phone);
    }

    let ids = WINNER_LOG
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<u64>>>()?;
    for id in ids {
        WINNER_LOG.remove(storage, id);
    }

    let tiers = TIER_AWARDED
        .keys(storage, None, None, Order::Ascending)
        .collect::<StdResult<Vec<u64>>>()?;
    for tier in tiers {
        TIER_AWARDED.remove(storage, tier);
    }

    let mut state = ledger_state(storage)?;
    state.winner_count = 0;
    state.total_resets += 1;
    LEDGER_STATE.save(storage, &state)?;

    Ok(phones.len() as u64)
}

/// Winner records, newest first. `start_after` is an exclusive winner id.
pub fn list_winners(
    storage: &dyn Storage,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<WinnerRecord>> {
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT) as usize;
    let end = start_after.map(Bound::exclusive);

    WINNER_LOG
        .range(storage, None, end, Order::Descending)
        .take(limit)
        .map(|entry| -> StdResult<WinnerRecord> {
            let (_, phone) = entry?;
            WINNERS.load(storage, &phone)
        })
        .collect()
}

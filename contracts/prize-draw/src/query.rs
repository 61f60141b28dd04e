use cosmwasm_std::{to_json_binary, Binary, Deps, StdError, StdResult, Storage};
use prize_draw_common::types::{total_remaining, ParticipantStatus};

use crate::directory;
use crate::error::ContractError;
use crate::inventory::PrizeInventory;
use crate::ledger;
use crate::msg::{LookupResponse, RemainingResponse, SummaryResponse, WinnersResponse};
use crate::state::{BEACONS, CONFIG, PENDING_DRAWS};

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

/// Participant status for display: registered, name, and prior award.
pub fn lookup(storage: &dyn Storage, phone: &str) -> Result<LookupResponse, ContractError> {
    let phone = directory::normalize_phone(phone)?;
    let participant = match directory::find(storage, &phone) {
        Ok(participant) => participant,
        Err(ContractError::ParticipantNotFound { .. }) => {
            return Ok(LookupResponse {
                found: false,
                phone: None,
                name: None,
                has_won: false,
                status: ParticipantStatus::Unregistered,
                award: None,
                pending_round: None,
            })
        }
        Err(err) => return Err(err),
    };

    let award = ledger::winner_of(storage, &phone)?;
    let pending_round = PENDING_DRAWS
        .may_load(storage, &phone)?
        .map(|pending| pending.target_round);
    let status = if award.is_some() {
        ParticipantStatus::Won
    } else {
        ParticipantStatus::Eligible
    };

    Ok(LookupResponse {
        found: true,
        phone: Some(participant.phone),
        name: Some(participant.name),
        has_won: award.is_some(),
        status,
        award,
        pending_round,
    })
}

pub fn query_lookup(deps: Deps, phone: String) -> StdResult<Binary> {
    let response = lookup(deps.storage, &phone).map_err(into_std_error)?;
    to_json_binary(&response)
}

pub fn query_winner(deps: Deps, phone: String) -> StdResult<Binary> {
    let winner = ledger::winner_of(deps.storage, phone.trim())?;
    to_json_binary(&winner)
}

pub fn query_pending(deps: Deps, phone: String) -> StdResult<Binary> {
    let pending = PENDING_DRAWS.may_load(deps.storage, phone.trim())?;
    to_json_binary(&pending)
}

pub fn query_beacon(deps: Deps, round: u64) -> StdResult<Binary> {
    let beacon = BEACONS.may_load(deps.storage, round)?;
    to_json_binary(&beacon)
}

pub fn query_list_winners(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let winners = ledger::list_winners(deps.storage, start_after, limit)?;
    to_json_binary(&WinnersResponse { winners })
}

pub fn query_remaining_by_tier(deps: Deps) -> StdResult<Binary> {
    let inventory = load_inventory(deps)?;
    let tiers = ledger::remaining_by_tier(deps.storage, &inventory)?;
    to_json_binary(&RemainingResponse {
        total_remaining: total_remaining(&tiers),
        tiers,
    })
}

pub fn query_summary(deps: Deps) -> StdResult<Binary> {
    let inventory = load_inventory(deps)?;
    let tiers = ledger::remaining_by_tier(deps.storage, &inventory)?;
    let state = ledger::ledger_state(deps.storage)?;

    to_json_binary(&SummaryResponse {
        participants: directory::participant_count(deps.storage)?,
        winners: state.winner_count,
        total_quota: inventory.total_quota(),
        total_remaining: total_remaining(&tiers),
        total_resets: state.total_resets,
    })
}

fn load_inventory(deps: Deps) -> StdResult<PrizeInventory> {
    let config = CONFIG.load(deps.storage)?;
    PrizeInventory::new(config.tiers).map_err(into_std_error)
}

fn into_std_error(err: ContractError) -> StdError {
    match err {
        ContractError::Std(err) => err,
        other => StdError::generic_err(other.to_string()),
    }
}

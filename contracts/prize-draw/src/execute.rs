use cosmwasm_std::{to_json_binary, DepsMut, Env, Event, MessageInfo, Response};
use prize_draw_common::selection::HashRolls;
use prize_draw_common::types::Participant;

use crate::beacon;
use crate::directory;
use crate::engine::DrawEngine;
use crate::error::{describe_remaining, ContractError};
use crate::msg::{CommitDrawResponse, DrawResponse};
use crate::state::{PendingDraw, StoredBeacon, BEACONS, CONFIG, PENDING_DRAWS};
use crate::store::{DrawStore, TxStorage};

/// Request a draw for `phone`. Anyone can call.
///
/// The participant must be eligible now. The request is bound to a drand
/// round that is not published yet, so the outcome is unknown when the
/// request is made, and a request cannot be replaced.
pub fn commit_draw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    phone: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let engine = DrawEngine::from_config(&config)?;

    let store = TxStorage::new(deps.storage);
    let (phone, remaining) = engine.check_eligible(&store, &phone)?;

    let target_round = beacon::target_round(&config.beacon, env.block.time);
    let reveal_after = beacon::round_published_at(&config.beacon, target_round);
    let request = PendingDraw {
        phone: phone.clone(),
        target_round,
        requested_at: env.block.time,
    };
    store.commit(|storage| {
        if let Some(pending) = PENDING_DRAWS.may_load(storage, &request.phone)? {
            return Err(ContractError::DrawPending {
                phone: pending.phone,
                target_round: pending.target_round,
            });
        }
        Ok(PENDING_DRAWS.save(storage, &request.phone, &request)?)
    })?;

    let data = CommitDrawResponse {
        phone: phone.clone(),
        target_round,
        reveal_after,
    };

    Ok(Response::new()
        .set_data(to_json_binary(&data)?)
        .add_attribute("action", "commit_draw")
        .add_attribute("phone", phone.clone())
        .add_attribute("target_round", target_round.to_string())
        .add_event(
            Event::new("prize_draw_committed")
                .add_attribute("phone", phone)
                .add_attribute("target_round", target_round.to_string())
                .add_attribute("reveal_after", reveal_after.to_string())
                .add_attribute("remaining", describe_remaining(&remaining))
                .add_attribute("requested_by", info.sender.to_string()),
        ))
}

/// Store a verified drand beacon. Anyone can call.
pub fn submit_beacon(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    round: u64,
    signature_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    if BEACONS.has(deps.storage, round) {
        return Err(ContractError::BeaconAlreadyExists { round });
    }

    let signature = hex::decode(signature_hex.trim()).map_err(|_| ContractError::InvalidHex {
        field: "signature_hex".to_string(),
    })?;
    let randomness = beacon::verify_beacon(&config.beacon, round, &signature)?;

    BEACONS.save(
        deps.storage,
        round,
        &StoredBeacon {
            round,
            randomness: randomness.to_vec(),
            submitted_at: env.block.time,
            submitted_by: info.sender.clone(),
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "submit_beacon")
        .add_attribute("round", round.to_string())
        .add_event(
            Event::new("prize_draw_beacon_submitted")
                .add_attribute("round", round.to_string())
                .add_attribute("randomness", hex::encode(randomness))
                .add_attribute("submitted_by", info.sender.to_string()),
        ))
}

/// Resolve the pending draw of `phone`. Anyone can call.
///
/// Rolls come only from the target round's beacon, the phone and the round.
/// The request is consumed only by a successful draw; a failed reveal
/// leaves both the request and the ledger untouched.
pub fn reveal_draw(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    phone: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let engine = DrawEngine::from_config(&config)?;

    let phone = directory::normalize_phone(&phone)?;
    let store = TxStorage::new(deps.storage);
    let (pending, beacon) = store.read(|storage| {
        let pending = PENDING_DRAWS
            .may_load(storage, &phone)?
            .ok_or_else(|| ContractError::NoPendingDraw {
                phone: phone.clone(),
            })?;
        let beacon = BEACONS
            .may_load(storage, pending.target_round)?
            .ok_or(ContractError::BeaconNotFound {
                round: pending.target_round,
            })?;
        Ok((pending, beacon))
    })?;

    let mut rolls = draw_rolls(&beacon, &pending);
    let seed_hex = rolls.seed_hex();

    let receipt = engine.draw(&store, &phone, env.block.time, &mut rolls)?;
    store.commit(|storage| {
        PENDING_DRAWS.remove(storage, &phone);
        Ok(())
    })?;

    let data = DrawResponse {
        winner_id: receipt.record.id,
        tier: receipt.record.tier,
        awarded_at: receipt.record.awarded_at,
        remaining: receipt.remaining.clone(),
    };

    Ok(Response::new()
        .set_data(to_json_binary(&data)?)
        .add_attribute("action", "reveal_draw")
        .add_attribute("phone", receipt.record.phone.clone())
        .add_attribute("tier", receipt.record.tier.to_string())
        .add_event(
            receipt
                .to_event()
                .add_attribute("drand_round", pending.target_round.to_string())
                .add_attribute("seed", seed_hex),
        ))
}

/// Roll source of a pending draw. Nothing in it is chosen by the caller.
pub fn draw_rolls(beacon: &StoredBeacon, pending: &PendingDraw) -> HashRolls {
    HashRolls::from_material(&[
        &beacon.randomness,
        pending.phone.as_bytes(),
        &pending.target_round.to_be_bytes(),
    ])
}

/// Bulk import of participants. Admin only.
pub fn register_participants(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    participants: Vec<Participant>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can register participants".to_string(),
        });
    }

    let summary = directory::register(deps.storage, participants)?;
    let total = directory::participant_count(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "register_participants")
        .add_attribute("added", summary.added.to_string())
        .add_event(
            Event::new("prize_draw_participants_registered")
                .add_attribute("added", summary.added.to_string())
                .add_attribute("skipped", summary.skipped.to_string())
                .add_attribute("total", total.to_string()),
        ))
}

/// Clear the winner ledger and restore every quota. Admin only.
pub fn reset_winners(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can reset winners".to_string(),
        });
    }

    let engine = DrawEngine::from_config(&config)?;
    let store = TxStorage::new(deps.storage);
    let removed = engine.reset_all(&store)?;

    Ok(Response::new()
        .add_attribute("action", "reset_winners")
        .add_attribute("removed", removed.to_string())
        .add_event(
            Event::new("prize_draw_winners_reset")
                .add_attribute("removed", removed.to_string())
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        ))
}

/// Transfer the admin role. Admin only.
pub fn update_admin(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    admin: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update admin".to_string(),
        });
    }

    config.admin = deps.api.addr_validate(&admin)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_admin")
        .add_event(
            Event::new("prize_draw_admin_updated")
                .add_attribute("previous", info.sender.to_string())
                .add_attribute("admin", config.admin.to_string()),
        ))
}

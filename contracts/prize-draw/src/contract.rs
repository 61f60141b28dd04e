use cosmwasm_std::{entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult};
use cw2::{get_contract_version, set_contract_version};

use crate::beacon::beacon_config;
use crate::engine::{validate_max_commit_attempts, DEFAULT_MAX_COMMIT_ATTEMPTS};
use crate::error::ContractError;
use crate::execute;
use crate::inventory::PrizeInventory;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{DrawConfig, LedgerState, CONFIG, LEDGER_STATE, PARTICIPANT_COUNT};

const CONTRACT_NAME: &str = "crates.io:prize-draw";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let inventory = PrizeInventory::new(msg.tiers)?;
    let max_commit_attempts =
        validate_max_commit_attempts(msg.max_commit_attempts.unwrap_or(DEFAULT_MAX_COMMIT_ATTEMPTS))?;
    let beacon = beacon_config(msg.beacon, msg.round_delay)?;
    let total_quota = inventory.total_quota();

    let config = DrawConfig {
        admin: info.sender.clone(),
        tiers: inventory.into_tiers(),
        max_commit_attempts,
        beacon,
    };
    CONFIG.save(deps.storage, &config)?;
    LEDGER_STATE.save(deps.storage, &LedgerState::default())?;
    PARTICIPANT_COUNT.save(deps.storage, &0u64)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "prize-draw")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute("tiers", config.tiers.len().to_string())
        .add_attribute("total_quota", total_quota.to_string())
        .add_attribute("round_delay", config.beacon.round_delay.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::CommitDraw { phone } => execute::commit_draw(deps, env, info, phone),
        ExecuteMsg::SubmitBeacon {
            round,
            signature_hex,
        } => execute::submit_beacon(deps, env, info, round, signature_hex),
        ExecuteMsg::RevealDraw { phone } => execute::reveal_draw(deps, env, info, phone),
        ExecuteMsg::RegisterParticipants { participants } => {
            execute::register_participants(deps, env, info, participants)
        }
        ExecuteMsg::ResetWinners {} => execute::reset_winners(deps, env, info),
        ExecuteMsg::UpdateAdmin { admin } => execute::update_admin(deps, env, info, admin),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::Lookup { phone } => query::query_lookup(deps, phone),
        QueryMsg::Winner { phone } => query::query_winner(deps, phone),
        QueryMsg::Pending { phone } => query::query_pending(deps, phone),
        QueryMsg::Beacon { round } => query::query_beacon(deps, round),
        QueryMsg::ListWinners { start_after, limit } => {
            query::query_list_winners(deps, start_after, limit)
        }
        QueryMsg::RemainingByTier {} => query::query_remaining_by_tier(deps),
        QueryMsg::Summary {} => query::query_summary(deps),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}

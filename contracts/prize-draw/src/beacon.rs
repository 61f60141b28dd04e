use cosmwasm_std::Timestamp;
use drand_verify::{G2PubkeyRfc, Pubkey};
use sha2::{Digest, Sha256};

use crate::error::ContractError;
use crate::msg::BeaconParams;
use crate::state::BeaconConfig;

/// drand quicknet group key (bls-unchained-g1-rfc9380), hex encoded.
pub const QUICKNET_PUBKEY_HEX: &str = "83cf0f2896adee7eb8b5f01fcad3912212c437e0073e911fb90022d3e760183c8c4b450b6a0a6c3ac6a5776a2d1064510d1fec758c921cc22b0e17e63aaf4bcb5ed66304de9cf809bd274ca73bab4af5a6e9c76a4bc09e76eae8991ef5ece45a";
pub const QUICKNET_GENESIS_TIME: u64 = 1_692_803_367;
pub const QUICKNET_PERIOD_SECONDS: u64 = 3;

pub const DEFAULT_ROUND_DELAY: u64 = 2;
pub const MAX_ROUND_DELAY: u64 = 100;

const PUBKEY_LEN: usize = 96;

pub fn beacon_config(
    params: Option<BeaconParams>,
    round_delay: Option<u64>,
) -> Result<BeaconConfig, ContractError> {
    let params = params.unwrap_or_else(|| BeaconParams {
        pubkey_hex: QUICKNET_PUBKEY_HEX.to_string(),
        genesis_time: QUICKNET_GENESIS_TIME,
        period_seconds: QUICKNET_PERIOD_SECONDS,
    });

    let pubkey = hex::decode(params.pubkey_hex.trim()).map_err(|_| ContractError::InvalidHex {
        field: "pubkey_hex".to_string(),
    })?;
    if pubkey.len() != PUBKEY_LEN {
        return Err(ContractError::InvalidInput {
            reason: format!("drand pubkey must be {PUBKEY_LEN} bytes, got {}", pubkey.len()),
        });
    }
    if params.period_seconds == 0 {
        return Err(ContractError::InvalidInput {
            reason: "drand period must be positive".to_string(),
        });
    }

    let round_delay = round_delay.unwrap_or(DEFAULT_ROUND_DELAY);
    if round_delay == 0 || round_delay > MAX_ROUND_DELAY {
        return Err(ContractError::InvalidInput {
            reason: format!("round_delay must be between 1 and {MAX_ROUND_DELAY}, got {round_delay}"),
        });
    }

    Ok(BeaconConfig {
        pubkey,
        genesis_time: params.genesis_time,
        period_seconds: params.period_seconds,
        round_delay,
    })
}

/// Latest round published at `time`. Round 1 is published at genesis,
/// 0 means nothing has been published yet.
pub fn round_at(config: &BeaconConfig, time: Timestamp) -> u64 {
    let now = time.seconds();
    if now < config.genesis_time {
        return 0;
    }
    (now - config.genesis_time) / config.period_seconds + 1
}

/// Unix seconds at which `round` is published.
pub fn round_published_at(config: &BeaconConfig, round: u64) -> u64 {
    config
        .genesis_time
        .saturating_add(round.saturating_sub(1).saturating_mul(config.period_seconds))
}

/// Round a draw requested at `time` resolves against. Its signature does
/// not exist yet at `time`.
pub fn target_round(config: &BeaconConfig, time: Timestamp) -> u64 {
    round_at(config, time).saturating_add(config.round_delay)
}

/// BLS-verify an unchained drand signature and return sha256(signature).
pub fn verify_beacon(
    config: &BeaconConfig,
    round: u64,
    signature: &[u8],
) -> Result<[u8; 32], ContractError> {
    let key: [u8; PUBKEY_LEN] = config.pubkey.as_slice().try_into().map_err(|_| {
        ContractError::VerificationFailed {
            reason: "stored pubkey has the wrong length".to_string(),
        }
    })?;
    let pubkey = G2PubkeyRfc::from_fixed(key).map_err(|_| ContractError::VerificationFailed {
        reason: "pubkey is not a valid G2 point".to_string(),
    })?;

    let valid = pubkey
        .verify(round, &[], signature)
        .map_err(|err| ContractError::VerificationFailed {
            reason: format!("{err:?}"),
        })?;
    if !valid {
        return Err(ContractError::VerificationFailed {
            reason: format!("signature does not match round {round}"),
        });
    }

    Ok(Sha256::digest(signature).into())
}

use cosmwasm_std::{StdError, Timestamp};
use prize_draw_common::types::TierRemaining;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("invalid prize tiers: {reason}")]
    InvalidTiers { reason: String },

    #[error("invalid hex: {field}")]
    InvalidHex { field: String },

    #[error("participant directory is empty")]
    DirectoryEmpty,

    #[error("participant {phone} not found")]
    ParticipantNotFound { phone: String },

    #[error("participant {phone} already won tier {tier} at {awarded_at}")]
    AlreadyWon {
        phone: String,
        tier: u64,
        awarded_at: Timestamp,
        remaining: Vec<TierRemaining>,
    },

    #[error("prize pool exhausted: {}", describe_remaining(.remaining))]
    PoolExhausted { remaining: Vec<TierRemaining> },

    #[error("draw for {phone} lost the commit race {attempts} times, retry later")]
    Contention { phone: String, attempts: u32 },

    #[error("storage unavailable: {reason}")]
    StorageUnavailable { reason: String },

    #[error("draw for {phone} already requested for drand round {target_round}")]
    DrawPending { phone: String, target_round: u64 },

    #[error("no pending draw for {phone}")]
    NoPendingDraw { phone: String },

    #[error("drand beacon for round {round} not submitted yet")]
    BeaconNotFound { round: u64 },

    #[error("drand beacon for round {round} already submitted")]
    BeaconAlreadyExists { round: u64 },

    #[error("drand beacon verification failed: {reason}")]
    VerificationFailed { reason: String },
}

impl ContractError {
    /// HTTP status a gateway should answer with for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            ContractError::ParticipantNotFound { .. } | ContractError::NoPendingDraw { .. } => 404,
            ContractError::InvalidInput { .. }
            | ContractError::InvalidHex { .. }
            | ContractError::VerificationFailed { .. }
            | ContractError::InvalidTiers { .. }
            | ContractError::AlreadyWon { .. }
            | ContractError::PoolExhausted { .. } => 400,
            ContractError::Unauthorized { .. } => 401,
            ContractError::Contention { .. }
            | ContractError::DrawPending { .. }
            | ContractError::BeaconAlreadyExists { .. } => 409,
            ContractError::DirectoryEmpty
            | ContractError::StorageUnavailable { .. }
            | ContractError::BeaconNotFound { .. } => 503,
            ContractError::Std(_) => 500,
        }
    }

    /// Remaining-by-tier snapshot carried by the failure, if any.
    pub fn remaining(&self) -> Option<&[TierRemaining]> {
        match self {
            ContractError::AlreadyWon { remaining, .. }
            | ContractError::PoolExhausted { remaining } => Some(remaining),
            _ => None,
        }
    }
}

/// `20:0/500, 30:0/60` style summary of a snapshot.
pub fn describe_remaining(remaining: &[TierRemaining]) -> String {
    remaining
        .iter()
        .map(|t| format!("{}:{}/{}", t.tier, t.remaining, t.quota))
        .collect::<Vec<_>>()
        .join(", ")
}

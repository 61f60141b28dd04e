use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Timestamp;
use prize_draw_common::types::{
    Participant, ParticipantStatus, PrizeTier, TierRemaining, WinnerRecord,
};

use crate::state::{DrawConfig, PendingDraw, StoredBeacon};

#[cw_serde]
pub struct InstantiateMsg {
    pub tiers: Vec<PrizeTier>,
    /// Defaults to 5
    pub max_commit_attempts: Option<u32>,
    /// Defaults to drand quicknet
    pub beacon: Option<BeaconParams>,
    /// Defaults to 2
    pub round_delay: Option<u64>,
}

#[cw_serde]
pub struct BeaconParams {
    pub pubkey_hex: String,
    pub genesis_time: u64,
    pub period_seconds: u64,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Request a draw for a registered participant against a drand round
    /// that is not published yet. Anyone can call.
    CommitDraw { phone: String },
    /// Submit a drand beacon. Anyone can call; the signature is verified.
    SubmitBeacon { round: u64, signature_hex: String },
    /// Resolve a pending draw once its target round is submitted.
    /// Anyone can call.
    RevealDraw { phone: String },
    /// Bulk import of participants. Admin only.
    RegisterParticipants { participants: Vec<Participant> },
    /// Remove every winner record and restore all quotas. Admin only.
    ResetWinners {},
    /// Hand the admin role to another address. Admin only.
    UpdateAdmin { admin: String },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(DrawConfig)]
    Config {},
    #[returns(LookupResponse)]
    Lookup { phone: String },
    #[returns(Option<WinnerRecord>)]
    Winner { phone: String },
    #[returns(Option<PendingDraw>)]
    Pending { phone: String },
    #[returns(Option<StoredBeacon>)]
    Beacon { round: u64 },
    /// Newest first
    #[returns(WinnersResponse)]
    ListWinners {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(RemainingResponse)]
    RemainingByTier {},
    #[returns(SummaryResponse)]
    Summary {},
}

/// Set as the response data of `CommitDraw`.
#[cw_serde]
pub struct CommitDrawResponse {
    pub phone: String,
    pub target_round: u64,
    /// Unix seconds at which the target round is published
    pub reveal_after: u64,
}

/// Set as the response data of a successful `RevealDraw`.
#[cw_serde]
pub struct DrawResponse {
    pub winner_id: u64,
    pub tier: u64,
    pub awarded_at: Timestamp,
    pub remaining: Vec<TierRemaining>,
}

#[cw_serde]
pub struct LookupResponse {
    pub found: bool,
    /// Trimmed identifier as registered
    pub phone: Option<String>,
    pub name: Option<String>,
    pub has_won: bool,
    pub status: ParticipantStatus,
    pub award: Option<WinnerRecord>,
    /// Target round of a draw waiting to be revealed
    pub pending_round: Option<u64>,
}

#[cw_serde]
pub struct WinnersResponse {
    pub winners: Vec<WinnerRecord>,
}

#[cw_serde]
pub struct RemainingResponse {
    pub tiers: Vec<TierRemaining>,
    pub total_remaining: u64,
}

#[cw_serde]
pub struct SummaryResponse {
    pub participants: u64,
    pub winners: u64,
    pub total_quota: u64,
    pub total_remaining: u64,
    pub total_resets: u64,
}

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Timestamp;

/// A prize tier: the prize amount is the tier key, the quota caps how many
/// times it can ever be awarded.
#[cw_serde]
pub struct PrizeTier {
    pub amount: u64,
    pub quota: u32,
}

/// A registered participant, keyed by phone number.
#[cw_serde]
pub struct Participant {
    pub phone: String,
    pub name: String,
}

/// A committed award. Name is copied from the directory at award time.
#[cw_serde]
pub struct WinnerRecord {
    pub id: u64,
    pub phone: String,
    pub name: String,
    pub tier: u64,
    pub awarded_at: Timestamp,
}

/// Per-tier quota usage at the moment the snapshot was taken.
#[cw_serde]
pub struct TierRemaining {
    pub tier: u64,
    pub quota: u32,
    pub awarded: u32,
    pub remaining: u32,
}

/// Lifecycle of a participant with respect to the draw.
/// `Won` is terminal; `Unregistered` never transitions.
#[cw_serde]
pub enum ParticipantStatus {
    Unregistered,
    Eligible,
    Won,
}

/// Total number of draw slots left across all tiers.
pub fn total_remaining(snapshot: &[TierRemaining]) -> u64 {
    snapshot.iter().map(|t| u64::from(t.remaining)).sum()
}

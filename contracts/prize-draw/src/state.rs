use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::{Item, Map};
use prize_draw_common::types::{Participant, PrizeTier, WinnerRecord};

pub const CONFIG: Item<DrawConfig> = Item::new("config");

/// Participant directory, keyed by trimmed phone number.
pub const PARTICIPANTS: Map<&str, Participant> = Map::new("participants");
pub const PARTICIPANT_COUNT: Item<u64> = Item::new("participant_count");

/// Winner ledger. Keyed by phone, which is what makes a second win for the
/// same participant unrepresentable.
pub const WINNERS: Map<&str, WinnerRecord> = Map::new("winners");
/// winner id -> phone, for newest-first listing
pub const WINNER_LOG: Map<u64, String> = Map::new("winner_log");
/// tier amount -> awards committed
pub const TIER_AWARDED: Map<u64, u32> = Map::new("tier_awarded");
pub const LEDGER_STATE: Item<LedgerState> = Item::new("ledger_state");

/// Verified drand beacons, keyed by round.
pub const BEACONS: Map<u64, StoredBeacon> = Map::new("beacons");
/// Draw requests waiting for their target round, keyed by phone.
pub const PENDING_DRAWS: Map<&str, PendingDraw> = Map::new("pending_draws");

#[cw_serde]
pub struct DrawConfig {
    pub admin: Addr,
    /// Sorted by amount, validated at instantiation, never updated
    pub tiers: Vec<PrizeTier>,
    /// How many times a draw re-reads and retries after a commit conflict
    pub max_commit_attempts: u32,
    pub beacon: BeaconConfig,
}

#[cw_serde]
pub struct BeaconConfig {
    /// drand group public key, 96 bytes (G2 point)
    pub pubkey: Vec<u8>,
    /// Unix seconds of round 1
    pub genesis_time: u64,
    pub period_seconds: u64,
    /// Rounds between the latest round at request time and the target round
    pub round_delay: u64,
}

#[cw_serde]
pub struct StoredBeacon {
    pub round: u64,
    /// sha256(signature)
    pub randomness: Vec<u8>,
    pub submitted_at: Timestamp,
    pub submitted_by: Addr,
}

#[cw_serde]
pub struct PendingDraw {
    pub phone: String,
    /// Not yet published when the request was made
    pub target_round: u64,
    pub requested_at: Timestamp,
}

#[cw_serde]
#[derive(Default)]
pub struct LedgerState {
    /// Never reset, so winner ids stay unique across ledger resets
    pub next_winner_id: u64,
    /// Records currently in the ledger
    pub winner_count: u64,
    pub total_resets: u64,
}

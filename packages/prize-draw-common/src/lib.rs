pub mod selection;
pub mod types;

pub use selection::{derive_seed, pick_weighted_tier, HashRolls, RollSource};
pub use types::{
    total_remaining, Participant, ParticipantStatus, PrizeTier, TierRemaining, WinnerRecord,
};

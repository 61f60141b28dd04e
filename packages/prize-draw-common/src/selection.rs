use sha2::{Digest, Sha256};

use crate::types::TierRemaining;

/// Source of uniformly distributed 64-bit rolls for tier selection.
pub trait RollSource {
    fn next_roll(&mut self) -> u64;
}

/// Deterministic roll stream derived from a 32-byte seed.
///
/// `roll_n = u64(sha256( 0x02 || seed || n_u64_be )[0..8])`
///
/// The 0x02 prefix keeps roll hashes apart from seed derivation hashes.
#[derive(Clone, Debug)]
pub struct HashRolls {
    seed: [u8; 32],
    counter: u64,
}

impl HashRolls {
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed, counter: 0 }
    }

    /// Build a roll stream from arbitrary seed material (hashed to 32 bytes).
    pub fn from_material(parts: &[&[u8]]) -> Self {
        Self::new(derive_seed(parts))
    }

    /// Hex form of the seed, for event attributes.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }
}

impl RollSource for HashRolls {
    fn next_roll(&mut self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update([0x02]);
        hasher.update(self.seed);
        hasher.update(self.counter.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        self.counter += 1;

        let mut roll_bytes = [0u8; 8];
        roll_bytes.copy_from_slice(&digest[0..8]);
        u64::from_be_bytes(roll_bytes)
    }
}

/// `seed = sha256( 0x01 || len(part_0)_u64_be || part_0 || ... )`
///
/// Each part is length-prefixed so ("ab", "c") and ("a", "bc") differ.
pub fn derive_seed(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update([0x01]);
    for part in parts {
        hasher.update((part.len() as u64).to_be_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Pick a tier from the pool of tiers that still have capacity, weighted by
/// their remaining count.
///
/// Tiers are laid out as consecutive cumulative ranges `[start, end)` where
/// `end - start = remaining`; `ticket = roll % total_remaining` selects the
/// range containing it. Returns `None` when every tier is exhausted.
///
/// The modulo bias is at most `total / 2^64` and is ignored.
pub fn pick_weighted_tier(snapshot: &[TierRemaining], roll: u64) -> Option<u64> {
    let total: u64 = snapshot.iter().map(|t| u64::from(t.remaining)).sum();
    if total == 0 {
        return None;
    }

    let ticket = roll % total;
    let mut cumulative_start = 0u64;
    for tier in snapshot.iter().filter(|t| t.remaining > 0) {
        let cumulative_end = cumulative_start + u64::from(tier.remaining);
        if ticket < cumulative_end {
            return Some(tier.tier);
        }
        cumulative_start = cumulative_end;
    }

    None
}

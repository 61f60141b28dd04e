use std::collections::BTreeSet;

use cosmwasm_std::{StdResult, Storage};
use prize_draw_common::types::Participant;

use crate::error::ContractError;
use crate::state::{PARTICIPANTS, PARTICIPANT_COUNT};

/// Outcome of a bulk import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegisterSummary {
    pub added: u64,
    /// Phones already present in the directory or repeated in the batch
    pub skipped: u64,
}

/// Trim surrounding whitespace and reject empty identifiers.
pub fn normalize_phone(raw: &str) -> Result<String, ContractError> {
    let phone = raw.trim();
    if phone.is_empty() {
        return Err(ContractError::InvalidInput {
            reason: "participant phone must not be empty".to_string(),
        });
    }
    Ok(phone.to_string())
}

pub fn participant_count(storage: &dyn Storage) -> StdResult<u64> {
    Ok(PARTICIPANT_COUNT.may_load(storage)?.unwrap_or(0))
}

/// Look up a participant by exact (trimmed) phone.
///
/// An empty directory is reported as `DirectoryEmpty` rather than
/// `ParticipantNotFound`: it means the import never ran.
pub fn find(storage: &dyn Storage, phone: &str) -> Result<Participant, ContractError> {
    let phone = phone.trim();
    if participant_count(storage)? == 0 {
        return Err(ContractError::DirectoryEmpty);
    }
    PARTICIPANTS
        .may_load(storage, phone)?
        .ok_or_else(|| ContractError::ParticipantNotFound {
            phone: phone.to_string(),
        })
}

/// Bulk import. Entries are validated before anything is written; phones
/// already registered are left untouched.
pub fn register(
    storage: &mut dyn Storage,
    entries: Vec<Participant>,
) -> Result<RegisterSummary, ContractError> {
    let mut batch = Vec::with_capacity(entries.len());
    for entry in entries {
        let phone = normalize_phone(&entry.phone)?;
        let name = entry.name.trim().to_string();
        if name.is_empty() {
            return Err(ContractError::InvalidInput {
                reason: format!("participant {phone} has an empty name"),
            });
        }
        batch.push(Participant { phone, name });
    }

    let mut summary = RegisterSummary::default();
    let mut seen = BTreeSet::new();
    for participant in batch {
        if !seen.insert(participant.phone.clone())
            || PARTICIPANTS.has(storage, &participant.phone)
        {
            summary.skipped += 1;
            continue;
        }
        PARTICIPANTS.save(storage, &participant.phone, &participant)?;
        summary.added += 1;
    }

    let count = participant_count(storage)?;
    PARTICIPANT_COUNT.save(storage, &(count + summary.added))?;

    Ok(summary)
}

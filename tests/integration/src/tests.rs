//! Integration tests for the prize draw contract.
//!
//! Entry-point flows run against `cosmwasm_std::testing` mocks. The
//! concurrency tests move the instantiated storage into a `SharedStore`
//! and run many draws at once from scoped threads, the way an off-chain
//! kiosk service would drive the engine.
//!
//! Run:
//! ```bash
//! cargo test -p prize-draw-integration-tests
//! ```

use std::collections::BTreeMap;
use std::sync::Barrier;
use std::thread;

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi};
use cosmwasm_std::{from_json, MemoryStorage, Timestamp};
use prize_draw::contract::{execute, instantiate, query};
use prize_draw::beacon::{DEFAULT_ROUND_DELAY, QUICKNET_PUBKEY_HEX};
use prize_draw::msg::{
    BeaconParams, CommitDrawResponse, DrawResponse, ExecuteMsg, InstantiateMsg, LookupResponse,
    QueryMsg, RemainingResponse, WinnersResponse,
};
use prize_draw::state::{PendingDraw, CONFIG};
use prize_draw::{ContractError, DrawEngine, DrawStore, SharedStore};
use prize_draw_common::selection::HashRolls;
use prize_draw_common::types::{Participant, ParticipantStatus, PrizeTier, TierRemaining};

// ─── Helpers ───

/// Published drand quicknet beacon
const DRAND_ROUND: u64 = 1000;
const DRAND_SIG_HEX: &str = "b44679b9a59af2ec876b1a6b1ad52ea9b1615fc3982b19576350f93447cb1125e342b73a8dd2bacbe47e4b6b63ed5e39";
const DRAND_PERIOD_SECONDS: u64 = 3;

/// Quicknet key on a schedule where requests made in the first seconds
/// after `mock_env()` time target `DRAND_ROUND`.
fn mock_beacon_params() -> BeaconParams {
    let now = mock_env().block.time.seconds();
    BeaconParams {
        pubkey_hex: QUICKNET_PUBKEY_HEX.to_string(),
        genesis_time: now - (DRAND_ROUND - DEFAULT_ROUND_DELAY - 1) * DRAND_PERIOD_SECONDS,
        period_seconds: DRAND_PERIOD_SECONDS,
    }
}

/// Thread-portable summary of a draw result.
#[derive(Clone, Debug, PartialEq)]
enum Outcome {
    Won { tier: u64, awarded_at: Timestamp },
    AlreadyWon { tier: u64, awarded_at: Timestamp },
    PoolExhausted,
    Contention,
    Failed(String),
}

impl From<Result<prize_draw::DrawReceipt, ContractError>> for Outcome {
    fn from(result: Result<prize_draw::DrawReceipt, ContractError>) -> Self {
        match result {
            Ok(receipt) => Outcome::Won {
                tier: receipt.record.tier,
                awarded_at: receipt.record.awarded_at,
            },
            Err(ContractError::AlreadyWon {
                tier, awarded_at, ..
            }) => Outcome::AlreadyWon { tier, awarded_at },
            Err(ContractError::PoolExhausted { .. }) => Outcome::PoolExhausted,
            Err(ContractError::Contention { .. }) => Outcome::Contention,
            Err(err) => Outcome::Failed(err.to_string()),
        }
    }
}

fn tiers(entries: &[(u64, u32)]) -> Vec<PrizeTier> {
    entries
        .iter()
        .map(|&(amount, quota)| PrizeTier { amount, quota })
        .collect()
}

fn phones(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("555-{:04}", 100 + i)).collect()
}

/// Instantiate through the entry points, import `phones`, then hand the
/// storage over to a thread-shared store.
fn setup_shared(
    tiers: Vec<PrizeTier>,
    max_commit_attempts: Option<u32>,
    phones: &[String],
) -> (DrawEngine, SharedStore<MemoryStorage>) {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");

    instantiate(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        InstantiateMsg {
            tiers,
            max_commit_attempts,
            beacon: None,
            round_delay: None,
        },
    )
    .unwrap();

    let participants = phones
        .iter()
        .map(|phone| Participant {
            phone: phone.clone(),
            name: format!("member {phone}"),
        })
        .collect();
    execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::RegisterParticipants { participants },
    )
    .unwrap();

    let config = CONFIG.load(&deps.storage).unwrap();
    let engine = DrawEngine::from_config(&config).unwrap();
    (engine, SharedStore::new(deps.storage))
}

/// Run one draw per entry of `phones`, all released at the same instant.
fn draw_concurrently(
    engine: &DrawEngine,
    store: &SharedStore<MemoryStorage>,
    phones: &[String],
) -> Vec<(String, Outcome)> {
    let barrier = Barrier::new(phones.len());
    let barrier = &barrier;
    let now = mock_env().block.time;

    thread::scope(|s| {
        let handles: Vec<_> = phones
            .iter()
            .enumerate()
            .map(|(i, phone)| {
                s.spawn(move || {
                    let mut rolls = HashRolls::from_material(&[
                        b"concurrent",
                        phone.as_bytes(),
                        &i.to_be_bytes(),
                    ]);
                    barrier.wait();
                    let outcome = Outcome::from(engine.draw(store, phone, now, &mut rolls));
                    (phone.clone(), outcome)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    })
}

fn remaining(engine: &DrawEngine, store: &SharedStore<MemoryStorage>) -> Vec<TierRemaining> {
    engine.remaining_by_tier(store).unwrap()
}

/// Every ledger record is counted in its tier and no tier is over quota.
fn assert_ledger_consistent(engine: &DrawEngine, store: &SharedStore<MemoryStorage>) {
    let winners = store
        .read(|storage| Ok(prize_draw::ledger::list_winners(storage, None, Some(100))?))
        .unwrap();
    let mut per_tier: BTreeMap<u64, u32> = BTreeMap::new();
    for winner in &winners {
        *per_tier.entry(winner.tier).or_default() += 1;
    }

    let mut seen = std::collections::BTreeSet::new();
    for winner in &winners {
        assert!(seen.insert(winner.phone.clone()), "{} won twice", winner.phone);
    }

    for tier in remaining(engine, store) {
        let recorded = per_tier.get(&tier.tier).copied().unwrap_or(0);
        assert_eq!(recorded, tier.awarded, "tier {} count drifted", tier.tier);
        assert!(tier.awarded <= tier.quota, "tier {} over quota", tier.tier);
        assert_eq!(tier.remaining, tier.quota - tier.awarded);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_five_concurrent_draws_for_three_slots() {
    let phones = phones(5);
    let (engine, store) = setup_shared(tiers(&[(20, 2), (30, 1)]), None, &phones);

    let outcomes = draw_concurrently(&engine, &store, &phones);

    let mut won_per_tier: BTreeMap<u64, u32> = BTreeMap::new();
    let mut exhausted = 0;
    for (phone, outcome) in &outcomes {
        match outcome {
            Outcome::Won { tier, .. } => *won_per_tier.entry(*tier).or_default() += 1,
            Outcome::PoolExhausted => exhausted += 1,
            other => panic!("unexpected outcome for {phone}: {other:?}"),
        }
    }

    assert_eq!(won_per_tier.get(&20), Some(&2));
    assert_eq!(won_per_tier.get(&30), Some(&1));
    assert_eq!(exhausted, 2);

    let after = remaining(&engine, &store);
    assert!(after.iter().all(|t| t.remaining == 0));
    assert_ledger_consistent(&engine, &store);
}

#[test]
fn test_stress_quota_never_exceeded() {
    // 18 slots, 64 contenders. A contender can lose at most one race per
    // committed slot, so slots + 1 attempts always reach a definite answer.
    let phones = phones(64);
    let (engine, store) =
        setup_shared(tiers(&[(20, 10), (30, 5), (40, 3)]), Some(19), &phones);

    let outcomes = draw_concurrently(&engine, &store, &phones);

    let winners: Vec<_> = outcomes
        .iter()
        .filter(|(_, o)| matches!(o, Outcome::Won { .. }))
        .collect();
    let exhausted = outcomes
        .iter()
        .filter(|(_, o)| *o == Outcome::PoolExhausted)
        .count();

    assert_eq!(winners.len(), 18);
    assert_eq!(exhausted, 64 - 18);
    assert_ledger_consistent(&engine, &store);
    assert!(remaining(&engine, &store).iter().all(|t| t.remaining == 0));
}

#[test]
fn test_same_participant_races_itself() {
    let phone = "555-0100".to_string();
    let contenders = vec![phone.clone(); 16];
    let (engine, store) = setup_shared(tiers(&[(20, 500), (30, 60), (40, 40)]), None, &[phone]);

    let outcomes = draw_concurrently(&engine, &store, &contenders);

    let won: Vec<_> = outcomes
        .iter()
        .filter_map(|(_, o)| match o {
            Outcome::Won { tier, awarded_at } => Some((*tier, *awarded_at)),
            _ => None,
        })
        .collect();
    assert_eq!(won.len(), 1, "exactly one draw may succeed: {outcomes:?}");
    let (tier, awarded_at) = won[0];

    for (_, outcome) in &outcomes {
        match outcome {
            Outcome::Won { .. } => {}
            Outcome::AlreadyWon {
                tier: prior_tier,
                awarded_at: prior_at,
            } => {
                assert_eq!(*prior_tier, tier);
                assert_eq!(*prior_at, awarded_at);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    let total_awarded: u32 = remaining(&engine, &store).iter().map(|t| t.awarded).sum();
    assert_eq!(total_awarded, 1);
}

#[test]
fn test_draw_twice_then_reset() {
    let phone = "555-0100".to_string();
    let (engine, store) = setup_shared(tiers(&[(20, 2), (30, 1)]), None, &[phone.clone()]);
    let original = remaining(&engine, &store);
    let now = mock_env().block.time;

    let mut rolls = HashRolls::from_material(&[b"twice"]);
    let receipt = engine.draw(&store, &phone, now, &mut rolls).unwrap();
    let tier = receipt.record.tier;

    let second = engine.draw(&store, &phone, now.plus_seconds(30), &mut rolls);
    assert_eq!(
        Outcome::from(second),
        Outcome::AlreadyWon {
            tier,
            awarded_at: now
        }
    );

    assert_eq!(engine.reset_all(&store).unwrap(), 1);
    assert_eq!(remaining(&engine, &store), original);
    assert!(!engine.has_won(&store, &phone).unwrap());
}

#[test]
fn test_failed_draws_leave_snapshot_identical() {
    let mut roster = phones(2);
    let (engine, store) = setup_shared(tiers(&[(20, 1)]), None, &roster);
    let now = mock_env().block.time;
    let mut rolls = HashRolls::from_material(&[b"idempotence"]);

    engine.draw(&store, &roster[0], now, &mut rolls).unwrap();
    let snapshot = || serde_json::to_vec(&remaining(&engine, &store)).unwrap();
    let before = snapshot();

    // AlreadyWon, PoolExhausted, ParticipantNotFound, InvalidInput
    roster.push("555-9999".to_string());
    roster.push("   ".to_string());
    for phone in &roster {
        assert!(engine.draw(&store, phone, now, &mut rolls).is_err());
        assert_eq!(snapshot(), before);
    }
}

#[test]
fn test_resets_serialize_with_draws() {
    let phones = phones(32);
    let (engine, store) = setup_shared(tiers(&[(20, 4), (30, 2)]), Some(40), &phones);
    let now = mock_env().block.time;

    thread::scope(|s| {
        for (i, phone) in phones.iter().enumerate() {
            let engine = &engine;
            let store = &store;
            s.spawn(move || {
                let mut rolls = HashRolls::from_material(&[b"reset-race", &i.to_be_bytes()]);
                // Any typed outcome is acceptable; only the ledger state is checked
                let _ = engine.draw(store, phone, now, &mut rolls);
            });
        }
        for _ in 0..4 {
            let engine = &engine;
            let store = &store;
            s.spawn(move || {
                engine.reset_all(store).unwrap();
            });
        }
    });

    assert_ledger_consistent(&engine, &store);
}

#[test]
fn test_entry_point_flow() {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");
    let kiosk = MockApi::default().addr_make("kiosk");
    let relayer = MockApi::default().addr_make("relayer");

    instantiate(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        InstantiateMsg {
            tiers: tiers(&[(20, 500), (30, 60), (40, 40)]),
            max_commit_attempts: None,
            beacon: Some(mock_beacon_params()),
            round_delay: None,
        },
    )
    .unwrap();

    execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::RegisterParticipants {
            participants: vec![
                Participant {
                    phone: "555-0100".to_string(),
                    name: "Layla".to_string(),
                },
                Participant {
                    phone: "555-0101".to_string(),
                    name: "Omar".to_string(),
                },
            ],
        },
    )
    .unwrap();

    let lookup: LookupResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Lookup {
                phone: " 555-0100 ".to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(lookup.status, ParticipantStatus::Eligible);
    assert_eq!(lookup.phone.as_deref(), Some("555-0100"));

    let res = execute(
        deps.as_mut(),
        mock_env(),
        message_info(&kiosk, &[]),
        ExecuteMsg::CommitDraw {
            phone: "555-0100".to_string(),
        },
    )
    .unwrap();
    let committed: CommitDrawResponse = from_json(res.data.unwrap()).unwrap();
    assert_eq!(committed.target_round, DRAND_ROUND);

    let pending: Option<PendingDraw> = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::Pending {
                phone: "555-0100".to_string(),
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(pending.map(|p| p.target_round), Some(DRAND_ROUND));

    let mut later = mock_env();
    later.block.time = Timestamp::from_seconds(committed.reveal_after);
    later.block.height += 2;
    execute(
        deps.as_mut(),
        later.clone(),
        message_info(&relayer, &[]),
        ExecuteMsg::SubmitBeacon {
            round: DRAND_ROUND,
            signature_hex: DRAND_SIG_HEX.to_string(),
        },
    )
    .unwrap();

    let res = execute(
        deps.as_mut(),
        later.clone(),
        message_info(&relayer, &[]),
        ExecuteMsg::RevealDraw {
            phone: "555-0100".to_string(),
        },
    )
    .unwrap();
    let drawn: DrawResponse = from_json(res.data.unwrap()).unwrap();
    assert_eq!(drawn.awarded_at, later.block.time);
    let event = res
        .events
        .iter()
        .find(|e| e.ty == "prize_draw_awarded")
        .unwrap();
    assert!(event
        .attributes
        .iter()
        .any(|a| a.key == "tier" && a.value == drawn.tier.to_string()));
    assert!(event.attributes.iter().any(|a| a.key == "seed"));

    let err = execute(
        deps.as_mut(),
        later.clone(),
        message_info(&kiosk, &[]),
        ExecuteMsg::CommitDraw {
            phone: "555-0100".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.remaining().is_some());

    let err = execute(
        deps.as_mut(),
        later,
        message_info(&kiosk, &[]),
        ExecuteMsg::CommitDraw {
            phone: "555-0404".to_string(),
        },
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 404);

    let remaining: RemainingResponse =
        from_json(query(deps.as_ref(), mock_env(), QueryMsg::RemainingByTier {}).unwrap())
            .unwrap();
    assert_eq!(remaining.total_remaining, 599);
    assert_eq!(remaining.tiers, drawn.remaining);

    let winners: WinnersResponse = from_json(
        query(
            deps.as_ref(),
            mock_env(),
            QueryMsg::ListWinners {
                start_after: None,
                limit: None,
            },
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(winners.winners.len(), 1);
    assert_eq!(winners.winners[0].name, "Layla");
    assert_eq!(winners.winners[0].tier, drawn.tier);
}

/// Commit every phone as `caller`, `offset` seconds after `mock_env()`
/// time, then reveal them all in order. Returns the awarded tier per phone.
fn award_through_beacon(phones: &[String], caller: &str, offset: u64) -> BTreeMap<String, u64> {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");
    let caller = deps.api.addr_make(caller);

    instantiate(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        InstantiateMsg {
            tiers: tiers(&[(20, 500), (30, 60), (40, 40)]),
            max_commit_attempts: None,
            beacon: Some(mock_beacon_params()),
            round_delay: None,
        },
    )
    .unwrap();
    let participants = phones
        .iter()
        .map(|phone| Participant {
            phone: phone.clone(),
            name: format!("member {phone}"),
        })
        .collect();
    execute(
        deps.as_mut(),
        mock_env(),
        message_info(&admin, &[]),
        ExecuteMsg::RegisterParticipants { participants },
    )
    .unwrap();

    let mut env = mock_env();
    env.block.time = env.block.time.plus_seconds(offset);
    env.block.height += offset;
    for phone in phones {
        execute(
            deps.as_mut(),
            env.clone(),
            message_info(&caller, &[]),
            ExecuteMsg::CommitDraw {
                phone: phone.clone(),
            },
        )
        .unwrap();
        // A second request cannot buy another roll
        let err = execute(
            deps.as_mut(),
            env.clone(),
            message_info(&caller, &[]),
            ExecuteMsg::CommitDraw {
                phone: phone.clone(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::DrawPending { .. }));
    }

    execute(
        deps.as_mut(),
        env.clone(),
        message_info(&caller, &[]),
        ExecuteMsg::SubmitBeacon {
            round: DRAND_ROUND,
            signature_hex: DRAND_SIG_HEX.to_string(),
        },
    )
    .unwrap();

    phones
        .iter()
        .map(|phone| {
            let res = execute(
                deps.as_mut(),
                env.clone(),
                message_info(&caller, &[]),
                ExecuteMsg::RevealDraw {
                    phone: phone.clone(),
                },
            )
            .unwrap();
            let drawn: DrawResponse = from_json(res.data.unwrap()).unwrap();
            (phone.clone(), drawn.tier)
        })
        .collect()
}

#[test]
fn test_callers_cannot_steer_awarded_tiers() {
    let phones = phones(20);

    // Every input a caller controls: who sends, and when inside the
    // request window.
    let baseline = award_through_beacon(&phones, "kiosk", 0);
    for (caller, offset) in [("mallory", 0), ("kiosk", 1), ("wrapper", 2)] {
        assert_eq!(
            award_through_beacon(&phones, caller, offset),
            baseline,
            "{caller} at +{offset}s changed the outcome"
        );
    }

    // 40 of 600 slots are top tier; a steered run would hand it to everyone
    let top_tier = baseline.values().filter(|&&tier| tier == 40).count();
    assert!(top_tier < phones.len() / 2, "top tier won {top_tier} times");
}

//! Tally boundary integration tests
//!
//! Weighted multi-team outcomes, boost mechanics, tie handling, the vote
//! cutover, cadence grants, and effect enactment/expiry — all driven through
//! the engine against the demo league:
//! Thorns (3 governors), Breakers (2), Foxes (1), Wolves (2).

use std::sync::Arc;

use tempfile::TempDir;
use uuid::Uuid;

use floor_engine::config::Config;
use floor_engine::engine::{GovernanceEngine, SeasonCtx};
use floor_engine::error::EngineError;
use floor_engine::interpret::{
    Candidate, EffectDuration, EffectSpec, Interpretation, ParamMutation, RuleChange, Scope,
    ScriptedInterpreter,
};
use floor_engine::league::League;
use floor_engine::proposal::{ProposalState, VoteChoice};
use floor_engine::registry::{ParamValue, RuleSpace};
use floor_engine::tally::Outcome;

fn open_engine(dir: &TempDir) -> (Arc<ScriptedInterpreter>, GovernanceEngine) {
    let mut config = Config::default();
    config.engine.data_dir = dir.path().to_path_buf();
    let interpreter = Arc::new(ScriptedInterpreter::new());
    let engine = GovernanceEngine::open(
        &config,
        League::demo(),
        RuleSpace::builtin(),
        interpreter.clone(),
        0,
    )
    .unwrap();
    (interpreter, engine)
}

fn ctx(round: u64) -> SeasonCtx {
    SeasonCtx::at("season-test", round, 1_000 + round)
}

fn rule_change(param: &str, value: ParamValue) -> Interpretation {
    Interpretation {
        candidate: Candidate::RuleChange(RuleChange {
            mutations: vec![ParamMutation {
                param: param.into(),
                value,
            }],
        }),
        confidence: 0.9,
    }
}

fn effect_for_rounds(rounds: u32) -> Interpretation {
    Interpretation {
        candidate: Candidate::Effect(EffectSpec {
            trigger: "steal".into(),
            condition: "always".into(),
            action: "boost_stamina".into(),
            magnitude: 1.5,
            scope: Scope::Game,
            duration: EffectDuration::Rounds(rounds),
            then: None,
        }),
        confidence: 0.9,
    }
}

/// Draft and confirm a tier-1 rule change, returning the open proposal id.
async fn open_tier_one(
    interpreter: &ScriptedInterpreter,
    engine: &GovernanceEngine,
    author: &str,
    value: i64,
) -> Uuid {
    interpreter.push(rule_change("foul_out_limit", ParamValue::Integer(value)));
    let receipt = engine
        .propose(&ctx(1), author, None, "adjust the foul limit")
        .await
        .unwrap();
    assert_eq!(receipt.state, ProposalState::AwaitingConfirmation);
    engine.confirm(&ctx(1), receipt.proposal_id, author).await.unwrap();
    receipt.proposal_id
}

#[tokio::test]
async fn four_team_weighted_majority_passes() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let id = open_tier_one(&interpreter, &engine, "ava", 5).await;

    // Thorns split 2-1, Breakers all yes, Foxes no, Wolves split 1-1
    for (governor, choice) in [
        ("ava", VoteChoice::Yes),
        ("ben", VoteChoice::Yes),
        ("cora", VoteChoice::No),
        ("dev", VoteChoice::Yes),
        ("esi", VoteChoice::Yes),
        ("finn", VoteChoice::No),
        ("gia", VoteChoice::Yes),
        ("hugo", VoteChoice::No),
    ] {
        engine.vote(&ctx(2), id, governor, choice, false).await.unwrap();
    }

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    assert_eq!(decisions.len(), 1);
    let d = &decisions[0];
    assert_eq!(d.outcome, Outcome::Passed);
    assert!((d.yes_weight - (2.0 / 3.0 + 1.0 + 0.5)).abs() < 1e-9);
    assert!((d.no_weight - (1.0 / 3.0 + 1.0 + 0.5)).abs() < 1e-9);
    assert!((d.ratio.unwrap() - 0.5417).abs() < 1e-3);

    let p = engine.proposal(id).await.unwrap();
    assert_eq!(p.state, ProposalState::Passed);

    let version = engine.current_ruleset();
    assert_eq!(version.values["foul_out_limit"], ParamValue::Integer(5));
    assert_eq!(version.number, 1);
}

#[tokio::test]
async fn boosted_no_from_a_single_governor_team_wins_outright() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let id = open_tier_one(&interpreter, &engine, "ava", 5).await;

    // Foxes' lone governor boosts a no: 1.0 x 2. Two Thorns vote yes at
    // 1/3 each.
    engine.vote(&ctx(2), id, "finn", VoteChoice::No, true).await.unwrap();
    engine.vote(&ctx(2), id, "ava", VoteChoice::Yes, false).await.unwrap();
    engine.vote(&ctx(2), id, "ben", VoteChoice::Yes, false).await.unwrap();

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    let d = &decisions[0];
    assert_eq!(d.outcome, Outcome::Failed);
    assert!((d.no_weight - 2.0).abs() < 1e-9);
    assert!((d.yes_weight - 2.0 / 3.0).abs() < 1e-9);

    // Nothing was enacted
    assert_eq!(engine.current_ruleset().number, 0);
}

#[tokio::test]
async fn a_tie_on_the_threshold_fails() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let id = open_tier_one(&interpreter, &engine, "ava", 5).await;

    // Breakers split 1-1: ratio is exactly the tier-1 threshold of 0.50
    engine.vote(&ctx(2), id, "dev", VoteChoice::Yes, false).await.unwrap();
    engine.vote(&ctx(2), id, "esi", VoteChoice::No, false).await.unwrap();

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    let d = &decisions[0];
    assert_eq!(d.ratio, Some(0.5));
    assert_eq!(d.threshold, 0.5);
    assert_eq!(d.outcome, Outcome::Failed);
}

#[tokio::test]
async fn zero_votes_resolves_expired() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let id = open_tier_one(&interpreter, &engine, "ava", 5).await;

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    assert_eq!(decisions[0].outcome, Outcome::Expired);
    assert_eq!(decisions[0].ratio, None);
    assert_eq!(
        engine.proposal(id).await.unwrap().state,
        ProposalState::Expired
    );
}

#[tokio::test]
async fn votes_after_the_cutover_are_rejected() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let id = open_tier_one(&interpreter, &engine, "ava", 5).await;

    engine.vote(&ctx(2), id, "finn", VoteChoice::Yes, false).await.unwrap();
    engine.tally(&ctx(4)).await.unwrap();

    let err = engine
        .vote(&ctx(4), id, "hugo", VoteChoice::Yes, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::VoteAfterClose { .. }));
}

#[tokio::test]
async fn every_open_proposal_resolves_exactly_once() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);
    let first = open_tier_one(&interpreter, &engine, "ava", 5).await;
    let second = open_tier_one(&interpreter, &engine, "ben", 4).await;

    engine.vote(&ctx(2), first, "finn", VoteChoice::Yes, false).await.unwrap();

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    assert_eq!(decisions.len(), 2);
    let ids: Vec<Uuid> = decisions.iter().map(|d| d.proposal_id).collect();
    assert!(ids.contains(&first) && ids.contains(&second));

    // The next boundary has nothing left to resolve
    let decisions = engine.tally(&ctx(8)).await.unwrap();
    assert!(decisions.is_empty());
}

#[tokio::test]
async fn grants_arrive_on_the_tally_cadence() {
    let dir = TempDir::new().unwrap();
    let (_interpreter, engine) = open_engine(&dir);

    // Opening grant only
    let before = engine.balance("gia").await;
    assert_eq!((before.propose, before.amend, before.boost), (2, 2, 1));

    engine.tally(&ctx(4)).await.unwrap();
    let after = engine.balance("gia").await;
    assert_eq!((after.propose, after.amend, after.boost), (4, 4, 2));

    engine.tally(&ctx(8)).await.unwrap();
    let after = engine.balance("gia").await;
    assert_eq!((after.propose, after.amend, after.boost), (6, 6, 3));
}

#[tokio::test]
async fn enacted_effects_expire_on_schedule() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);

    interpreter.push(effect_for_rounds(2));
    let receipt = engine
        .propose(&ctx(1), "dev", None, "stamina boost off steals")
        .await
        .unwrap();
    let id = receipt.proposal_id;
    engine.confirm(&ctx(1), id, "dev").await.unwrap();
    engine.vote(&ctx(2), id, "dev", VoteChoice::Yes, false).await.unwrap();
    engine.vote(&ctx(2), id, "esi", VoteChoice::Yes, false).await.unwrap();

    let decisions = engine.tally(&ctx(4)).await.unwrap();
    assert_eq!(decisions[0].outcome, Outcome::Passed);

    let version = engine.current_ruleset();
    assert_eq!(version.effects.len(), 1);
    assert_eq!(version.effects[0].proposal_id, id);
    assert_eq!(version.effects[0].expires_after_round, Some(6));
    let enacted_version = version.number;

    // Still active through round 6... the boundary past it retires it
    engine.tally(&ctx(8)).await.unwrap();
    let version = engine.current_ruleset();
    assert!(version.effects.is_empty());
    assert_eq!(version.number, enacted_version + 1);
}

#[tokio::test]
async fn multi_mutation_changes_enact_atomically() {
    let dir = TempDir::new().unwrap();
    let (interpreter, engine) = open_engine(&dir);

    interpreter.push(Interpretation {
        candidate: Candidate::RuleChange(RuleChange {
            mutations: vec![
                ParamMutation {
                    param: "foul_out_limit".into(),
                    value: ParamValue::Integer(5),
                },
                ParamMutation {
                    param: "overtime_length_minutes".into(),
                    value: ParamValue::Integer(4),
                },
            ],
        }),
        confidence: 0.9,
    });
    let receipt = engine
        .propose(&ctx(1), "ava", None, "shorter overtimes, tighter fouls")
        .await
        .unwrap();
    let id = receipt.proposal_id;
    engine.confirm(&ctx(1), id, "ava").await.unwrap();
    engine.vote(&ctx(2), id, "finn", VoteChoice::Yes, false).await.unwrap();

    engine.tally(&ctx(4)).await.unwrap();
    let version = engine.current_ruleset();
    assert_eq!(version.values["foul_out_limit"], ParamValue::Integer(5));
    assert_eq!(
        version.values["overtime_length_minutes"],
        ParamValue::Integer(4)
    );
    assert_eq!(version.number, 1);
}

//! Governance engine — the command surface over the event log
//!
//! One engine instance owns the append path: sequence assignment and
//! projection updates happen together under a single lock, so commands are
//! serialized at the log while interpretation calls (the dominant latency
//! source) run outside it, concurrently across independent proposals.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{Config, GovernanceConfig, InterpreterConfig, SanitizerConfig, TokenConfig};
use crate::error::EngineError;
use crate::events::projection::TradeOffer;
use crate::events::{DraftOutcome, EventPayload, EventStore, GovernanceEvent, Projections};
use crate::interpret::{Candidate, Interpretation, Interpreter};
use crate::league::League;
use crate::ledger::{SpendReason, TokenBalance, TokenKind};
use crate::proposal::{ProposalRecord, ProposalState, Tier, VoteChoice};
use crate::registry::RuleSpace;
use crate::ruleset::RuleSetVersion;
use crate::sanitize::sanitize;
use crate::tally::{self, Outcome, TallyDecision};
use crate::validate::{required_tier, validate};

/// Externally-owned season/round context passed into commands. The engine
/// never consults an ambient clock, so simulated clocks and multiple seasons
/// coexist cleanly.
#[derive(Debug, Clone)]
pub struct SeasonCtx {
    pub season_id: String,
    pub round: u64,
    pub now_ms: u64,
}

impl SeasonCtx {
    pub fn at(season_id: impl Into<String>, round: u64, now_ms: u64) -> Self {
        Self {
            season_id: season_id.into(),
            round,
            now_ms,
        }
    }
}

/// Milliseconds since the epoch, for callers driving real wall-clock time.
pub fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// What the author sees after a draft, revision, or amendment: the
/// interpretation, the resolved tier, what confirmation will cost, and the
/// rejection reason when the proposal did not advance.
#[derive(Debug, Clone, Serialize)]
pub struct ProposeReceipt {
    pub proposal_id: Uuid,
    pub state: ProposalState,
    pub tier: Tier,
    pub confirm_cost: u32,
    pub interpretation: Interpretation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

struct EngineState {
    store: EventStore,
    view: Projections,
}

pub struct GovernanceEngine {
    state: Mutex<EngineState>,
    interpreter: Arc<dyn Interpreter>,
    league: Arc<League>,
    rule_space: Arc<RuleSpace>,
    sanitizer: SanitizerConfig,
    policy: InterpreterConfig,
    tokens: TokenConfig,
    governance: GovernanceConfig,
    ruleset_tx: watch::Sender<Arc<RuleSetVersion>>,
}

impl GovernanceEngine {
    /// Open the event log, rebuild projections by replay, and publish the
    /// current rule-set version. A fresh log gets an opening token grant for
    /// every governor (boundary round 0).
    pub fn open(
        config: &Config,
        league: League,
        rule_space: RuleSpace,
        interpreter: Arc<dyn Interpreter>,
        now_ms: u64,
    ) -> Result<Self> {
        let mut store = EventStore::open(&config.engine.data_dir)?;
        let events = store.replay()?;
        let mut view = Projections::replay(&rule_space, events.iter());
        info!(
            events = events.len(),
            proposals = view.proposals.len(),
            ruleset_version = view.ruleset.number,
            "Projections rebuilt from log"
        );

        if store.last_seq() == 0 {
            let grants: Vec<EventPayload> = league
                .governors()
                .map(|g| EventPayload::TokensGranted {
                    governor: g.clone(),
                    propose: config.tokens.grant_propose,
                    amend: config.tokens.grant_amend,
                    boost: config.tokens.grant_boost,
                    round: 0,
                })
                .collect();
            let appended = store.append_all(now_ms, grants)?;
            for event in &appended {
                view.apply(event);
            }
            info!(governors = appended.len(), "Opening token grant");
        }

        let (ruleset_tx, _) = watch::channel(Arc::new(view.ruleset.clone()));

        Ok(Self {
            state: Mutex::new(EngineState { store, view }),
            interpreter,
            league: Arc::new(league),
            rule_space: Arc::new(rule_space),
            sanitizer: config.sanitizer.clone(),
            policy: config.interpreter.clone(),
            tokens: config.tokens.clone(),
            governance: config.governance.clone(),
            ruleset_tx,
        })
    }

    /// Subscribe to rule-set versions. The simulation reads the latest value
    /// at each round start; versions are always fully constructed before
    /// they are published.
    pub fn ruleset_watch(&self) -> watch::Receiver<Arc<RuleSetVersion>> {
        self.ruleset_tx.subscribe()
    }

    pub fn league(&self) -> &League {
        &self.league
    }

    pub fn rule_space(&self) -> &RuleSpace {
        &self.rule_space
    }

    // --- commands ---

    /// Draft a proposal: sanitize, interpret across the trust boundary,
    /// validate, and record the attempt. The receipt reports whether the
    /// proposal now awaits confirmation or why it did not advance.
    pub async fn propose(
        &self,
        ctx: &SeasonCtx,
        governor: &str,
        tier_hint: Option<u8>,
        text: &str,
    ) -> Result<ProposeReceipt, EngineError> {
        let team = self
            .league
            .team_of(governor)
            .ok_or_else(|| EngineError::UnknownGovernor(governor.to_string()))?
            .id
            .clone();

        let sanitized = sanitize(text, self.sanitizer.max_proposal_len);
        let interpretation = self.interpret_with_policy(&sanitized).await;

        let mut state = self.state.lock().await;
        let proposal_id = Uuid::new_v4();

        let (tier, outcome) = self.evaluate_draft(&state.view, governor, tier_hint, &interpretation);

        let event = EventPayload::ProposalDrafted {
            proposal_id,
            governor: governor.to_string(),
            team,
            tier,
            raw_text: text.to_string(),
            sanitized_text: sanitized,
            interpretation: interpretation.clone(),
            outcome: outcome.clone(),
        };
        Self::append(&mut state, ctx.now_ms, vec![event])?;

        let record = &state.view.proposals[&proposal_id];
        info!(
            %proposal_id,
            governor,
            tier = tier.0,
            state = record.state.as_str(),
            "Proposal drafted"
        );
        Ok(Self::receipt(record, &outcome))
    }

    /// Replace the proposal text before confirmation. Free, unlimited, and
    /// only available to the author while the proposal is unconfirmed.
    pub async fn revise(
        &self,
        ctx: &SeasonCtx,
        proposal_id: Uuid,
        governor: &str,
        text: &str,
    ) -> Result<ProposeReceipt, EngineError> {
        {
            let state = self.state.lock().await;
            let p = Self::proposal_ref(&state.view, proposal_id)?;
            Self::require_author(p, governor)?;
            if !p.state.accepts_revision() {
                return Err(Self::state_error(p, "awaiting_confirmation"));
            }
        }

        let sanitized = sanitize(text, self.sanitizer.max_proposal_len);
        let interpretation = self.interpret_with_policy(&sanitized).await;

        let mut state = self.state.lock().await;
        // Re-check: the state may have moved while the interpreter ran
        let p = Self::proposal_ref(&state.view, proposal_id)?;
        Self::require_author(p, governor)?;
        if !p.state.accepts_revision() {
            return Err(Self::state_error(p, "awaiting_confirmation"));
        }

        let (tier, outcome) = self.evaluate_draft(&state.view, governor, None, &interpretation);

        let event = EventPayload::ProposalRevised {
            proposal_id,
            governor: governor.to_string(),
            tier,
            raw_text: text.to_string(),
            sanitized_text: sanitized,
            interpretation: interpretation.clone(),
            outcome: outcome.clone(),
        };
        Self::append(&mut state, ctx.now_ms, vec![event])?;

        let record = &state.view.proposals[&proposal_id];
        debug!(%proposal_id, state = record.state.as_str(), "Proposal revised");
        Ok(Self::receipt(record, &outcome))
    }

    /// Confirm the interpreted proposal onto the Floor, spending the tier's
    /// PROPOSE cost. The proposal becomes publicly visible and votable until
    /// the next tally boundary.
    pub async fn confirm(
        &self,
        ctx: &SeasonCtx,
        proposal_id: Uuid,
        governor: &str,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        let p = Self::proposal_ref(&state.view, proposal_id)?;
        Self::require_author(p, governor)?;
        if p.state != ProposalState::AwaitingConfirmation {
            return Err(Self::state_error(p, "awaiting_confirmation"));
        }

        let cost = p.tier.propose_cost();
        let balance = state.view.balance(governor);
        if balance.propose < cost {
            return Err(EngineError::TokenInsufficient {
                kind: TokenKind::Propose,
                needed: cost,
                available: balance.propose,
            });
        }

        let events = vec![
            EventPayload::TokensSpent {
                governor: governor.to_string(),
                token: TokenKind::Propose,
                amount: cost,
                reason: SpendReason::Confirm,
                proposal_id: Some(proposal_id),
            },
            EventPayload::ProposalConfirmed {
                proposal_id,
                governor: governor.to_string(),
                rule_space_version: self.rule_space.version,
                round: ctx.round,
            },
        ];
        Self::append(&mut state, ctx.now_ms, events)?;

        info!(%proposal_id, governor, cost, "Proposal confirmed onto the Floor");
        Ok(())
    }

    /// Cancel an unconfirmed proposal. Free; impossible once confirmed.
    pub async fn cancel(
        &self,
        ctx: &SeasonCtx,
        proposal_id: Uuid,
        governor: &str,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        let p = Self::proposal_ref(&state.view, proposal_id)?;
        Self::require_author(p, governor)?;
        if !p.state.accepts_revision() {
            return Err(Self::state_error(p, "unconfirmed"));
        }

        let event = EventPayload::ProposalCancelled {
            proposal_id,
            governor: governor.to_string(),
        };
        Self::append(&mut state, ctx.now_ms, vec![event])?;
        info!(%proposal_id, governor, "Proposal cancelled");
        Ok(())
    }

    /// Amend an open proposal: one AMEND token, and the replacement candidate
    /// must re-pass validation at the proposal's tier before it replaces the
    /// open content. Amendment history stays in the log.
    pub async fn amend(
        &self,
        ctx: &SeasonCtx,
        proposal_id: Uuid,
        governor: &str,
        text: &str,
    ) -> Result<ProposeReceipt, EngineError> {
        if self.league.team_of(governor).is_none() {
            return Err(EngineError::UnknownGovernor(governor.to_string()));
        }
        {
            let state = self.state.lock().await;
            let p = Self::proposal_ref(&state.view, proposal_id)?;
            if !p.state.accepts_amendment() {
                return Err(Self::state_error(p, "open"));
            }
        }

        let sanitized = sanitize(text, self.sanitizer.max_amendment_len);
        let interpretation = self.interpret_with_policy(&sanitized).await;

        let mut state = self.state.lock().await;
        let p = Self::proposal_ref(&state.view, proposal_id)?;
        if !p.state.accepts_amendment() {
            return Err(Self::state_error(p, "open"));
        }
        let tier = p.tier;

        // A failed amendment appends nothing and spends nothing
        match &interpretation.candidate {
            Candidate::Rejection(r) => {
                return Err(EngineError::InterpreterRejection {
                    reason: r.reason.clone(),
                })
            }
            candidate => validate(
                candidate,
                &self.rule_space,
                tier,
                self.governance.max_mutations_per_proposal,
            )?,
        }

        let balance = state.view.balance(governor);
        if balance.amend < 1 {
            return Err(EngineError::TokenInsufficient {
                kind: TokenKind::Amend,
                needed: 1,
                available: balance.amend,
            });
        }

        let events = vec![
            EventPayload::TokensSpent {
                governor: governor.to_string(),
                token: TokenKind::Amend,
                amount: 1,
                reason: SpendReason::Amend,
                proposal_id: Some(proposal_id),
            },
            EventPayload::ProposalAmended {
                proposal_id,
                governor: governor.to_string(),
                raw_text: text.to_string(),
                sanitized_text: sanitized,
                interpretation: interpretation.clone(),
            },
        ];
        Self::append(&mut state, ctx.now_ms, events)?;

        let record = &state.view.proposals[&proposal_id];
        info!(%proposal_id, governor, "Proposal amended");
        Ok(Self::receipt(record, &DraftOutcome::Accepted))
    }

    /// Cast a vote on an open proposal. One vote per governor per proposal,
    /// immutable once cast. Boosting doubles this vote's weight and spends
    /// one BOOST token at cast time.
    pub async fn vote(
        &self,
        ctx: &SeasonCtx,
        proposal_id: Uuid,
        governor: &str,
        choice: VoteChoice,
        boosted: bool,
    ) -> Result<(), EngineError> {
        let base_weight = self
            .league
            .vote_weight(governor)
            .ok_or_else(|| EngineError::UnknownGovernor(governor.to_string()))?;

        let mut state = self.state.lock().await;
        let p = Self::proposal_ref(&state.view, proposal_id)?;
        match p.state {
            ProposalState::Open => {}
            ProposalState::Passed | ProposalState::Failed | ProposalState::Expired => {
                return Err(EngineError::VoteAfterClose {
                    proposal: proposal_id,
                })
            }
            _ => return Err(Self::state_error(p, "open")),
        }
        if p.votes.contains_key(governor) {
            return Err(EngineError::DuplicateVote {
                proposal: proposal_id,
                governor: governor.to_string(),
            });
        }

        let mut events = Vec::with_capacity(2);
        let weight = if boosted {
            let balance = state.view.balance(governor);
            if balance.boost < 1 {
                return Err(EngineError::TokenInsufficient {
                    kind: TokenKind::Boost,
                    needed: 1,
                    available: balance.boost,
                });
            }
            events.push(EventPayload::TokensSpent {
                governor: governor.to_string(),
                token: TokenKind::Boost,
                amount: 1,
                reason: SpendReason::BoostedVote,
                proposal_id: Some(proposal_id),
            });
            base_weight * 2.0
        } else {
            base_weight
        };

        events.push(EventPayload::VoteCast {
            proposal_id,
            governor: governor.to_string(),
            choice,
            boosted,
            weight,
        });
        Self::append(&mut state, ctx.now_ms, events)?;

        debug!(%proposal_id, governor, ?choice, boosted, weight, "Vote cast");
        Ok(())
    }

    /// Resolve every open proposal at a round boundary from one consistent
    /// vote snapshot, enact the passing ones, grant the boundary's tokens,
    /// and publish the resulting rule-set version.
    ///
    /// The lock held across this method is the vote cutover: votes arriving
    /// after tallying begins observe the resolved state and are rejected.
    pub async fn tally(&self, ctx: &SeasonCtx) -> Result<Vec<TallyDecision>, EngineError> {
        let mut state = self.state.lock().await;

        let mut open: Vec<ProposalRecord> = state
            .view
            .proposals
            .values()
            .filter(|p| p.state == ProposalState::Open)
            .cloned()
            .collect();
        open.sort_by(|a, b| (a.created_ms, a.id).cmp(&(b.created_ms, b.id)));

        // Dry-run enactments against a working copy so conflicts are known
        // before anything is appended, and version numbers line up with what
        // the projection will compute.
        let mut working = state.view.ruleset.clone();
        working.retire_expired(ctx.round);

        let mut events = Vec::new();
        let mut decisions = Vec::with_capacity(open.len());

        for p in &open {
            let mut decision = tally::decide(p);

            if decision.outcome == Outcome::Passed {
                let candidate = p.interpretation.candidate.clone();
                match working.enact(&candidate, p.id, ctx.round) {
                    Ok(()) => {
                        events.push(Self::tally_event(ctx, &decision));
                        events.push(EventPayload::RuleEnacted {
                            proposal_id: p.id,
                            version: working.number,
                            round: ctx.round,
                            candidate,
                        });
                        decisions.push(decision);
                        continue;
                    }
                    Err(reason) => {
                        warn!(
                            proposal_id = %p.id,
                            %reason,
                            "Enactment conflict, marking proposal failed"
                        );
                        decision.outcome = Outcome::Failed;
                    }
                }
            }

            events.push(Self::tally_event(ctx, &decision));
            decisions.push(decision);
        }

        for governor in self.league.governors() {
            events.push(EventPayload::TokensGranted {
                governor: governor.clone(),
                propose: self.tokens.grant_propose,
                amend: self.tokens.grant_amend,
                boost: self.tokens.grant_boost,
                round: ctx.round,
            });
        }

        Self::append(&mut state, ctx.now_ms, events)?;

        let version = Arc::new(state.view.ruleset.clone());
        self.ruleset_tx.send_replace(version.clone());

        info!(
            season = %ctx.season_id,
            round = ctx.round,
            resolved = decisions.len(),
            passed = decisions
                .iter()
                .filter(|d| d.outcome == Outcome::Passed)
                .count(),
            ruleset_version = version.number,
            "Tally boundary resolved"
        );
        Ok(decisions)
    }

    /// Offer tokens to another governor.
    pub async fn offer_trade(
        &self,
        ctx: &SeasonCtx,
        from: &str,
        to: &str,
        token: TokenKind,
        amount: u32,
    ) -> Result<Uuid, EngineError> {
        for governor in [from, to] {
            if self.league.team_of(governor).is_none() {
                return Err(EngineError::UnknownGovernor(governor.to_string()));
            }
        }
        if amount == 0 {
            return Err(EngineError::Validation(
                crate::error::ValidationError::Malformed("trade amount must be positive".into()),
            ));
        }

        let mut state = self.state.lock().await;
        let balance = state.view.balance(from);
        if balance.get(token) < amount {
            return Err(EngineError::TokenInsufficient {
                kind: token,
                needed: amount,
                available: balance.get(token),
            });
        }

        let offer_id = Uuid::new_v4();
        let event = EventPayload::TradeOffered {
            offer_id,
            from: from.to_string(),
            to: to.to_string(),
            token,
            amount,
        };
        Self::append(&mut state, ctx.now_ms, vec![event])?;
        info!(%offer_id, from, to, %token, amount, "Trade offered");
        Ok(offer_id)
    }

    /// Accept or decline a pending trade offer. Only the recipient may
    /// resolve it; acceptance moves the tokens if the offeror still has them.
    pub async fn resolve_trade(
        &self,
        ctx: &SeasonCtx,
        offer_id: Uuid,
        governor: &str,
        accept: bool,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().await;
        let offer = state
            .view
            .trades
            .get(&offer_id)
            .ok_or(EngineError::UnknownTrade(offer_id))?
            .clone();

        if offer.accepted.is_some() {
            return Err(EngineError::TradeClosed(offer_id));
        }
        if offer.to != governor {
            return Err(EngineError::NotAuthor {
                proposal: offer_id,
                governor: governor.to_string(),
            });
        }
        if accept {
            let balance = state.view.balance(&offer.from);
            if balance.get(offer.token) < offer.amount {
                return Err(EngineError::TokenInsufficient {
                    kind: offer.token,
                    needed: offer.amount,
                    available: balance.get(offer.token),
                });
            }
        }

        let event = EventPayload::TradeResolved {
            offer_id,
            accepted: accept,
        };
        Self::append(&mut state, ctx.now_ms, vec![event])?;
        info!(%offer_id, governor, accept, "Trade resolved");
        Ok(())
    }

    // --- queries ---

    pub async fn proposal(&self, proposal_id: Uuid) -> Option<ProposalRecord> {
        self.state
            .lock()
            .await
            .view
            .proposals
            .get(&proposal_id)
            .cloned()
    }

    pub async fn proposals(&self) -> Vec<ProposalRecord> {
        let state = self.state.lock().await;
        let mut all: Vec<ProposalRecord> = state.view.proposals.values().cloned().collect();
        all.sort_by(|a, b| (a.created_ms, a.id).cmp(&(b.created_ms, b.id)));
        all
    }

    pub async fn balance(&self, governor: &str) -> TokenBalance {
        self.state.lock().await.view.balance(governor)
    }

    pub async fn trade(&self, offer_id: Uuid) -> Option<TradeOffer> {
        self.state.lock().await.view.trades.get(&offer_id).cloned()
    }

    /// Read-only audit feed over the full log.
    pub async fn events_since(
        &self,
        since: u64,
        limit: Option<usize>,
    ) -> Result<Vec<GovernanceEvent>, EngineError> {
        self.state
            .lock()
            .await
            .store
            .events_since(since, limit)
            .map_err(|e| EngineError::Store(e.to_string()))
    }

    /// The latest published rule-set version.
    pub fn current_ruleset(&self) -> Arc<RuleSetVersion> {
        self.ruleset_tx.borrow().clone()
    }

    // --- internals ---

    async fn interpret_with_policy(&self, sanitized: &str) -> Interpretation {
        let interpretation = self.interpreter.interpret(sanitized, &self.rule_space).await;

        if !interpretation.candidate.is_rejection()
            && interpretation.confidence < self.policy.min_confidence
        {
            if self.policy.fail_open {
                debug!(
                    confidence = interpretation.confidence,
                    "Ambiguous classification allowed through (fail-open)"
                );
            } else {
                return Interpretation {
                    candidate: Candidate::rejection(format!(
                        "ambiguous interpretation (confidence {:.2} below {:.2})",
                        interpretation.confidence, self.policy.min_confidence
                    )),
                    confidence: interpretation.confidence,
                };
            }
        }
        interpretation
    }

    /// Shared draft/revision evaluation: resolve the tier, validate, and
    /// check the author can afford confirmation. A token shortfall is fatal
    /// (cancels the proposal); validation failures leave it revisable.
    fn evaluate_draft(
        &self,
        view: &Projections,
        governor: &str,
        tier_hint: Option<u8>,
        interpretation: &Interpretation,
    ) -> (Tier, DraftOutcome) {
        match &interpretation.candidate {
            Candidate::Rejection(r) => (
                Tier(tier_hint.unwrap_or(1)),
                DraftOutcome::InterpreterRejected {
                    reason: r.reason.clone(),
                },
            ),
            candidate => {
                let required = required_tier(candidate, &self.rule_space);
                let tier = tier_hint.map(Tier).unwrap_or(required);

                match validate(
                    candidate,
                    &self.rule_space,
                    tier,
                    self.governance.max_mutations_per_proposal,
                ) {
                    Err(err) => (
                        tier,
                        DraftOutcome::ValidationFailed {
                            reason: err.to_string(),
                            fatal: false,
                        },
                    ),
                    Ok(()) => {
                        let cost = tier.propose_cost();
                        let balance = view.balance(governor);
                        if balance.propose < cost {
                            let err = EngineError::TokenInsufficient {
                                kind: TokenKind::Propose,
                                needed: cost,
                                available: balance.propose,
                            };
                            (
                                tier,
                                DraftOutcome::ValidationFailed {
                                    reason: err.to_string(),
                                    fatal: true,
                                },
                            )
                        } else {
                            (tier, DraftOutcome::Accepted)
                        }
                    }
                }
            }
        }
    }

    fn tally_event(ctx: &SeasonCtx, decision: &TallyDecision) -> EventPayload {
        EventPayload::TallyResolved {
            season_id: ctx.season_id.clone(),
            round: ctx.round,
            proposal_id: decision.proposal_id,
            outcome: decision.outcome,
            yes_weight: decision.yes_weight,
            no_weight: decision.no_weight,
            ratio: decision.ratio,
            threshold: decision.threshold,
        }
    }

    fn receipt(record: &ProposalRecord, outcome: &DraftOutcome) -> ProposeReceipt {
        let rejection = match outcome {
            DraftOutcome::Accepted => None,
            DraftOutcome::InterpreterRejected { reason } => Some(reason.clone()),
            DraftOutcome::ValidationFailed { reason, .. } => Some(reason.clone()),
        };
        ProposeReceipt {
            proposal_id: record.id,
            state: record.state,
            tier: record.tier,
            confirm_cost: record.tier.propose_cost(),
            interpretation: record.interpretation.clone(),
            rejection,
        }
    }

    fn proposal_ref(view: &Projections, proposal_id: Uuid) -> Result<&ProposalRecord, EngineError> {
        view.proposals
            .get(&proposal_id)
            .ok_or(EngineError::UnknownProposal(proposal_id))
    }

    fn require_author(p: &ProposalRecord, governor: &str) -> Result<(), EngineError> {
        if p.author != governor {
            return Err(EngineError::NotAuthor {
                proposal: p.id,
                governor: governor.to_string(),
            });
        }
        Ok(())
    }

    fn state_error(p: &ProposalRecord, expected: &'static str) -> EngineError {
        EngineError::InvalidState {
            proposal: p.id,
            expected,
            actual: p.state.as_str().to_string(),
        }
    }

    fn append(
        state: &mut EngineState,
        now_ms: u64,
        payloads: Vec<EventPayload>,
    ) -> Result<(), EngineError> {
        let events = state
            .store
            .append_all(now_ms, payloads)
            .map_err(|e| EngineError::Store(e.to_string()))?;
        for event in &events {
            state.view.apply(event);
        }
        Ok(())
    }
}

//! Projections — typed views folded over the event log
//!
//! Folding is total and deterministic: replaying events 1..N yields the same
//! state as replaying 1..N-1 and applying event N. Projections never reject
//! an event; commands validate before appending, so by the time an event is
//! in the log it is a fact.

use std::collections::HashMap;

use tracing::warn;
use uuid::Uuid;

use super::{DraftOutcome, EventPayload, GovernanceEvent};
use crate::league::GovernorId;
use crate::ledger::{TokenBalance, TokenKind};
use crate::proposal::{ProposalRecord, ProposalState, VoteRecord};
use crate::registry::RuleSpace;
use crate::ruleset::RuleSetVersion;
use crate::tally::Outcome;

/// A token trade offer between governors.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeOffer {
    pub id: Uuid,
    pub from: GovernorId,
    pub to: GovernorId,
    pub token: TokenKind,
    pub amount: u32,
    /// `None` while open; `Some(accepted)` once resolved
    pub accepted: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Projections {
    /// Sequence number of the last folded event
    pub last_seq: u64,
    /// Round of the most recent tally boundary
    pub current_round: u64,
    pub proposals: HashMap<Uuid, ProposalRecord>,
    pub balances: HashMap<GovernorId, TokenBalance>,
    pub trades: HashMap<Uuid, TradeOffer>,
    pub ruleset: RuleSetVersion,
}

impl Projections {
    pub fn new(rule_space: &RuleSpace) -> Self {
        Self {
            last_seq: 0,
            current_round: 0,
            proposals: HashMap::new(),
            balances: HashMap::new(),
            trades: HashMap::new(),
            ruleset: RuleSetVersion::genesis(rule_space),
        }
    }

    /// Fold a full log from genesis.
    pub fn replay<'a>(
        rule_space: &RuleSpace,
        events: impl IntoIterator<Item = &'a GovernanceEvent>,
    ) -> Self {
        let mut view = Self::new(rule_space);
        for event in events {
            view.apply(event);
        }
        view
    }

    pub fn balance(&self, governor: &str) -> TokenBalance {
        self.balances.get(governor).copied().unwrap_or_default()
    }

    /// Fold one event into the view.
    pub fn apply(&mut self, event: &GovernanceEvent) {
        self.last_seq = event.seq;
        match &event.payload {
            EventPayload::ProposalDrafted {
                proposal_id,
                governor,
                team,
                tier,
                raw_text,
                sanitized_text,
                interpretation,
                outcome,
            } => {
                let state = draft_state(outcome);
                self.proposals.insert(
                    *proposal_id,
                    ProposalRecord {
                        id: *proposal_id,
                        author: governor.clone(),
                        team: team.clone(),
                        tier: *tier,
                        state,
                        raw_text: raw_text.clone(),
                        sanitized_text: sanitized_text.clone(),
                        interpretation: interpretation.clone(),
                        rule_space_version: None,
                        votes: HashMap::new(),
                        created_ms: event.timestamp_ms,
                        resolved_ms: (state == ProposalState::Cancelled)
                            .then_some(event.timestamp_ms),
                    },
                );
            }

            EventPayload::ProposalRevised {
                proposal_id,
                tier,
                raw_text,
                sanitized_text,
                interpretation,
                outcome,
                ..
            } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.tier = *tier;
                    p.raw_text = raw_text.clone();
                    p.sanitized_text = sanitized_text.clone();
                    p.interpretation = interpretation.clone();
                    p.state = draft_state(outcome);
                    if p.state == ProposalState::Cancelled {
                        p.resolved_ms = Some(event.timestamp_ms);
                    }
                }
            }

            EventPayload::ProposalConfirmed {
                proposal_id,
                rule_space_version,
                ..
            } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.state = ProposalState::Open;
                    p.rule_space_version = Some(*rule_space_version);
                }
            }

            EventPayload::ProposalCancelled { proposal_id, .. } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.state = ProposalState::Cancelled;
                    p.resolved_ms = Some(event.timestamp_ms);
                }
            }

            EventPayload::ProposalAmended {
                proposal_id,
                raw_text,
                sanitized_text,
                interpretation,
                ..
            } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.raw_text = raw_text.clone();
                    p.sanitized_text = sanitized_text.clone();
                    p.interpretation = interpretation.clone();
                }
            }

            EventPayload::VoteCast {
                proposal_id,
                governor,
                choice,
                boosted,
                weight,
            } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.votes.insert(
                        governor.clone(),
                        VoteRecord {
                            choice: *choice,
                            boosted: *boosted,
                            weight: *weight,
                        },
                    );
                }
            }

            EventPayload::TokensGranted {
                governor,
                propose,
                amend,
                boost,
                round,
            } => {
                let balance = self.balances.entry(governor.clone()).or_default();
                balance.credit(TokenKind::Propose, *propose);
                balance.credit(TokenKind::Amend, *amend);
                balance.credit(TokenKind::Boost, *boost);
                // Grants share the tally cadence, so they also mark the
                // boundary on logs with no open proposals to resolve.
                self.current_round = (*round).max(self.current_round);
                self.ruleset.retire_expired(*round);
            }

            EventPayload::TokensSpent {
                governor,
                token,
                amount,
                ..
            } => {
                self.balances
                    .entry(governor.clone())
                    .or_default()
                    .debit(*token, *amount);
            }

            EventPayload::TallyResolved {
                proposal_id,
                outcome,
                round,
                ..
            } => {
                if let Some(p) = self.proposals.get_mut(proposal_id) {
                    p.state = match outcome {
                        Outcome::Passed => ProposalState::Passed,
                        Outcome::Failed => ProposalState::Failed,
                        Outcome::Expired => ProposalState::Expired,
                    };
                    p.resolved_ms = Some(event.timestamp_ms);
                }
                self.current_round = (*round).max(self.current_round);
                self.ruleset.retire_expired(*round);
            }

            EventPayload::RuleEnacted {
                proposal_id,
                candidate,
                round,
                ..
            } => {
                if let Err(reason) = self.ruleset.enact(candidate, *proposal_id, *round) {
                    // The engine only appends RuleEnacted after a successful
                    // dry run, so this can only mean a log written by a
                    // different catalog. Keep folding; the conflict is logged.
                    warn!(%proposal_id, %reason, "Enactment conflict during replay");
                }
            }

            EventPayload::TradeOffered {
                offer_id,
                from,
                to,
                token,
                amount,
            } => {
                self.trades.insert(
                    *offer_id,
                    TradeOffer {
                        id: *offer_id,
                        from: from.clone(),
                        to: to.clone(),
                        token: *token,
                        amount: *amount,
                        accepted: None,
                    },
                );
            }

            EventPayload::TradeResolved { offer_id, accepted } => {
                if let Some(offer) = self.trades.get_mut(offer_id) {
                    offer.accepted = Some(*accepted);
                    if *accepted {
                        self.balances
                            .entry(offer.from.clone())
                            .or_default()
                            .debit(offer.token, offer.amount);
                        self.balances
                            .entry(offer.to.clone())
                            .or_default()
                            .credit(offer.token, offer.amount);
                    }
                }
            }
        }
    }
}

fn draft_state(outcome: &DraftOutcome) -> ProposalState {
    match outcome {
        DraftOutcome::Accepted => ProposalState::AwaitingConfirmation,
        DraftOutcome::InterpreterRejected { .. } => ProposalState::Interpreting,
        DraftOutcome::ValidationFailed { fatal: false, .. } => ProposalState::Interpreting,
        DraftOutcome::ValidationFailed { fatal: true, .. } => ProposalState::Cancelled,
    }
}

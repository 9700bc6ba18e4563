//! HTTP route handlers
//!
//! Request/response DTOs live beside their handlers; engine errors map onto
//! status codes with the machine-readable kind in the body.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::engine::ProposeReceipt;
use crate::error::EngineError;
use crate::events::GovernanceEvent;
use crate::ledger::{TokenBalance, TokenKind};
use crate::proposal::{ProposalRecord, VoteChoice};
use crate::ruleset::RuleSetVersion;
use crate::tally::TallyDecision;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

// === Error mapping ===

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    reason: String,
}

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::UnknownProposal(_)
            | EngineError::UnknownGovernor(_)
            | EngineError::UnknownTrade(_) => StatusCode::NOT_FOUND,
            EngineError::NotAuthor { .. } => StatusCode::FORBIDDEN,
            EngineError::InterpreterRejection { .. } | EngineError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::TokenInsufficient { .. }
            | EngineError::DuplicateVote { .. }
            | EngineError::VoteAfterClose { .. }
            | EngineError::InvalidState { .. }
            | EngineError::TradeClosed(_)
            | EngineError::EnactmentConflict { .. } => StatusCode::CONFLICT,
            EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.kind(),
            reason: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// === Proposals ===

#[derive(Deserialize)]
pub struct ProposeRequest {
    pub governor: String,
    #[serde(default)]
    pub tier: Option<u8>,
    pub text: String,
}

/// POST /api/proposals
pub async fn propose(
    State(state): State<AppState>,
    Json(req): Json<ProposeRequest>,
) -> Result<Json<ProposeReceipt>, ApiError> {
    let ctx = state.clock.read().await.ctx();
    let receipt = state
        .engine
        .propose(&ctx, &req.governor, req.tier, &req.text)
        .await?;
    Ok(Json(receipt))
}

/// Summary row for proposal listings
#[derive(Serialize)]
pub struct ProposalSummary {
    pub id: Uuid,
    pub author: String,
    pub team: String,
    pub tier: u8,
    pub state: &'static str,
    pub sanitized_text: String,
    pub votes: usize,
    pub created_ms: u64,
}

impl From<&ProposalRecord> for ProposalSummary {
    fn from(p: &ProposalRecord) -> Self {
        Self {
            id: p.id,
            author: p.author.clone(),
            team: p.team.clone(),
            tier: p.tier.0,
            state: p.state.as_str(),
            sanitized_text: p.sanitized_text.clone(),
            votes: p.votes.len(),
            created_ms: p.created_ms,
        }
    }
}

/// GET /api/proposals
pub async fn list_proposals(State(state): State<AppState>) -> Json<Vec<ProposalSummary>> {
    let proposals = state.engine.proposals().await;
    Json(proposals.iter().map(ProposalSummary::from).collect())
}

/// GET /api/proposals/:id
pub async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProposalRecord>, ApiError> {
    let proposal = state
        .engine
        .proposal(id)
        .await
        .ok_or(EngineError::UnknownProposal(id))?;
    Ok(Json(proposal))
}

#[derive(Deserialize)]
pub struct ReviseRequest {
    pub governor: String,
    pub text: String,
}

/// POST /api/proposals/:id/revise
pub async fn revise(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviseRequest>,
) -> Result<Json<ProposeReceipt>, ApiError> {
    let ctx = state.clock.read().await.ctx();
    let receipt = state.engine.revise(&ctx, id, &req.governor, &req.text).await?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
pub struct GovernorRequest {
    pub governor: String,
}

/// POST /api/proposals/:id/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GovernorRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.clock.read().await.ctx();
    state.engine.confirm(&ctx, id, &req.governor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/proposals/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<GovernorRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.clock.read().await.ctx();
    state.engine.cancel(&ctx, id, &req.governor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/proposals/:id/amend
pub async fn amend(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviseRequest>,
) -> Result<Json<ProposeReceipt>, ApiError> {
    let ctx = state.clock.read().await.ctx();
    let receipt = state.engine.amend(&ctx, id, &req.governor, &req.text).await?;
    Ok(Json(receipt))
}

#[derive(Deserialize)]
pub struct VoteRequest {
    pub governor: String,
    pub choice: VoteChoice,
    #[serde(default)]
    pub boosted: bool,
}

/// POST /api/proposals/:id/vote
pub async fn vote(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VoteRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.clock.read().await.ctx();
    state
        .engine
        .vote(&ctx, id, &req.governor, req.choice, req.boosted)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Tally / rule set ===

/// POST /api/tally — resolve the current boundary out of cadence
pub async fn tally(
    State(state): State<AppState>,
) -> Result<Json<Vec<TallyDecision>>, ApiError> {
    let ctx = state.clock.read().await.ctx();
    let decisions = state.engine.tally(&ctx).await?;
    Ok(Json(decisions))
}

/// GET /api/ruleset
pub async fn ruleset(State(state): State<AppState>) -> Json<RuleSetVersion> {
    Json((*state.engine.current_ruleset()).clone())
}

// === Tokens / trades ===

/// GET /api/balances/:governor
pub async fn balance(
    State(state): State<AppState>,
    Path(governor): Path<String>,
) -> Json<TokenBalance> {
    Json(state.engine.balance(&governor).await)
}

#[derive(Deserialize)]
pub struct TradeRequest {
    pub from: String,
    pub to: String,
    pub token: TokenKind,
    pub amount: u32,
}

#[derive(Serialize)]
pub struct TradeResponse {
    pub offer_id: Uuid,
}

/// POST /api/trades
pub async fn offer_trade(
    State(state): State<AppState>,
    Json(req): Json<TradeRequest>,
) -> Result<Json<TradeResponse>, ApiError> {
    let ctx = state.clock.read().await.ctx();
    let offer_id = state
        .engine
        .offer_trade(&ctx, &req.from, &req.to, req.token, req.amount)
        .await?;
    Ok(Json(TradeResponse { offer_id }))
}

#[derive(Deserialize)]
pub struct ResolveTradeRequest {
    pub governor: String,
    pub accept: bool,
}

/// POST /api/trades/:id/resolve
pub async fn resolve_trade(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ResolveTradeRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = state.clock.read().await.ctx();
    state
        .engine
        .resolve_trade(&ctx, id, &req.governor, req.accept)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// === Audit feed ===

#[derive(Deserialize)]
pub struct EventsQuery {
    #[serde(default)]
    pub since: u64,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/events?since=N&limit=M — read-only log feed for audit and
/// report generation
pub async fn events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<GovernanceEvent>>, ApiError> {
    let events = state.engine.events_since(query.since, query.limit).await?;
    Ok(Json(events))
}

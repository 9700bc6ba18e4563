//! HTTP API — the transport the chat/web layer drives commands through
//!
//! JSON over axum. The engine owns all semantics; handlers translate
//! requests into commands and map engine errors onto status codes.

pub mod routes;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;

use crate::engine::{wall_clock_ms, GovernanceEngine, SeasonCtx};

/// The season/round clock owned by the round scheduler and read by handlers.
#[derive(Debug, Clone)]
pub struct SeasonClock {
    pub season_id: String,
    pub round: u64,
}

impl SeasonClock {
    pub fn ctx(&self) -> SeasonCtx {
        SeasonCtx::at(self.season_id.clone(), self.round, wall_clock_ms())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GovernanceEngine>,
    pub clock: Arc<RwLock<SeasonClock>>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/proposals",
            post(routes::propose).get(routes::list_proposals),
        )
        .route("/api/proposals/:id", get(routes::get_proposal))
        .route("/api/proposals/:id/revise", post(routes::revise))
        .route("/api/proposals/:id/confirm", post(routes::confirm))
        .route("/api/proposals/:id/cancel", post(routes::cancel))
        .route("/api/proposals/:id/amend", post(routes::amend))
        .route("/api/proposals/:id/vote", post(routes::vote))
        .route("/api/tally", post(routes::tally))
        .route("/api/ruleset", get(routes::ruleset))
        .route("/api/balances/:governor", get(routes::balance))
        .route("/api/trades", post(routes::offer_trade))
        .route("/api/trades/:id/resolve", post(routes::resolve_trade))
        .route("/api/events", get(routes::events))
        .with_state(state)
}

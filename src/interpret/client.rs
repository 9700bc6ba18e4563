//! HTTP client for the interpretation service
//!
//! POSTs the sanitized text plus the rule space snapshot and expects the
//! closed candidate schema back. Every transport or schema failure maps to a
//! `Rejection` with a diagnostic reason — the caller can never mistake a
//! failed call for a successful interpretation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Candidate, Interpretation, Interpreter};
use crate::config::InterpreterConfig;
use crate::registry::RuleSpace;

pub struct HttpInterpreter {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
}

#[derive(Serialize)]
struct InterpretRequest<'a> {
    /// Correlation id for service-side logs
    request_id: String,
    text: &'a str,
    rule_space: &'a RuleSpace,
}

#[derive(Deserialize)]
struct InterpretResponse {
    candidate: Candidate,
    #[serde(default)]
    confidence: Option<f64>,
}

impl HttpInterpreter {
    pub fn new(config: &InterpreterConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    async fn call(
        &self,
        sanitized: &str,
        rule_space: &RuleSpace,
    ) -> Result<InterpretResponse, String> {
        let request = InterpretRequest {
            request_id: format!("{:08x}", rand::random::<u32>()),
            text: sanitized,
            rule_space,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| format!("interpretation service unreachable: {}", e))?;

        if !response.status().is_success() {
            return Err(format!(
                "interpretation service returned HTTP {}",
                response.status()
            ));
        }

        response
            .json::<InterpretResponse>()
            .await
            .map_err(|e| format!("non-conformant interpreter output: {}", e))
    }
}

#[async_trait]
impl Interpreter for HttpInterpreter {
    async fn interpret(&self, sanitized: &str, rule_space: &RuleSpace) -> Interpretation {
        match self.call(sanitized, rule_space).await {
            Ok(resp) => {
                let confidence = resp.confidence.unwrap_or(1.0).clamp(0.0, 1.0);
                debug!(confidence, "Interpreter returned a candidate");
                Interpretation {
                    candidate: resp.candidate,
                    confidence,
                }
            }
            Err(reason) => {
                warn!(%reason, "Interpretation call failed, mapping to rejection");
                Interpretation::rejection(reason)
            }
        }
    }
}

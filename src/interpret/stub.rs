//! Deterministic scripted interpreter
//!
//! Returns queued interpretations in order, then a fallback rejection once
//! the script runs dry. Tests drive the validator/lifecycle/tally logic with
//! this stub so the real reasoning service is never involved.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Interpretation, Interpreter};
use crate::registry::RuleSpace;

#[derive(Default)]
pub struct ScriptedInterpreter {
    queue: Mutex<VecDeque<Interpretation>>,
}

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next interpretation to return.
    pub fn push(&self, interpretation: Interpretation) {
        self.queue.lock().unwrap().push_back(interpretation);
    }

    pub fn queued(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

#[async_trait]
impl Interpreter for ScriptedInterpreter {
    async fn interpret(&self, _sanitized: &str, _rule_space: &RuleSpace) -> Interpretation {
        self.queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Interpretation::rejection("no structural match"))
    }
}

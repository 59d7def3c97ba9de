//! Evaluation (§4.6 `evaluate`): once every plan step of the active
//! constraint has reached a terminal outcome, ask the oracle whether the
//! constraint is actually resolved.

use chrono::Utc;
use elon_llm::{extract_reply, Message, Oracle, OracleError, OracleRequest, TokenUsage};
use elon_queue::{Bucket, WorkQueue};

use crate::constraint::{ConstraintStatus, EngineLog, FailedAttempt};
use crate::oracle_protocol::EvaluationReply;

#[derive(Debug)]
pub enum EvaluateOutcome {
    /// Not every step has reached `completed` or `failed` yet.
    StillInFlight,
    /// No active constraint to evaluate.
    NoActiveConstraint,
    Resolved { tokens: TokenUsage },
    StillUnresolved { reason: String, tokens: TokenUsage },
    OracleUnavailable { reason: String, tokens: TokenUsage },
}

/// True once every step of `constraint_id` is present in `completed` or
/// `failed` (§4.6: "all its plan steps have a terminal outcome, counted by
/// finding `<constraintId>` in `completed/` vs `failed/`").
pub fn all_steps_terminal(queue: &WorkQueue, constraint_id: &str, step_count: usize) -> anyhow::Result<bool> {
    let completed = queue.list(Bucket::Completed)?;
    let failed = queue.list(Bucket::Failed)?;
    let terminal_count = completed
        .iter()
        .chain(failed.iter())
        .filter(|spec| spec.constraint_id.as_deref() == Some(constraint_id))
        .count();
    Ok(terminal_count >= step_count)
}

pub async fn evaluate(
    oracle: &dyn Oracle,
    log: &mut EngineLog,
    queue: &WorkQueue,
    new_evidence_summary: &str,
    timeout: std::time::Duration,
) -> EvaluateOutcome {
    let Some(constraint) = log.current.clone() else {
        return EvaluateOutcome::NoActiveConstraint;
    };
    if constraint.status != ConstraintStatus::Active {
        return EvaluateOutcome::NoActiveConstraint;
    }

    match all_steps_terminal(queue, &constraint.id, constraint.steps.len()) {
        Ok(true) => {}
        Ok(false) => return EvaluateOutcome::StillInFlight,
        Err(e) => {
            return EvaluateOutcome::OracleUnavailable {
                reason: e.to_string(),
                tokens: TokenUsage::default(),
            }
        }
    }

    let request = OracleRequest {
        messages: vec![
            Message::system("You decide whether a remediation constraint has been resolved."),
            Message::user(format!(
                "CONSTRAINT: {}\nWHY: {}\nCOMPLETION CRITERIA: {}\n\nNEW EVIDENCE:\n{new_evidence_summary}\n",
                constraint.description, constraint.why, constraint.completion_criteria
            )),
        ],
        timeout,
    };

    let reply = match oracle.ask(request).await {
        Ok(reply) => reply,
        Err(OracleError::Transport(reason)) => {
            return EvaluateOutcome::OracleUnavailable {
                reason,
                tokens: TokenUsage::default(),
            }
        }
        Err(e) => {
            return EvaluateOutcome::OracleUnavailable {
                reason: e.to_string(),
                tokens: TokenUsage::default(),
            }
        }
    };
    let tokens = TokenUsage::from(&reply);

    let parsed: EvaluationReply = match extract_reply(&reply) {
        Ok(parsed) => parsed,
        Err(e) => return EvaluateOutcome::OracleUnavailable { reason: e.to_string(), tokens },
    };

    if parsed.resolved {
        let mut solved = constraint.clone();
        solved.status = ConstraintStatus::Solved;
        solved.resolved_at = Some(Utc::now());
        log.solved.push(solved.clone());
        log.history.push(solved);
        log.current = None;
        EvaluateOutcome::Resolved { tokens }
    } else {
        log.failed_attempts.push(FailedAttempt {
            constraint: constraint.id.clone(),
            reason: parsed.reason.clone(),
            timestamp: Utc::now(),
        });
        EvaluateOutcome::StillUnresolved { reason: parsed.reason, tokens }
    }
}

//! Fix cycle (§4.6 `runFixCycle`).

use chrono::Utc;
use elon_llm::{extract_reply, Message, Oracle, OracleError, OracleRequest, TokenUsage};
use elon_queue::{Bucket, Specification};
use elon_safety::PathPolicy;
use uuid::Uuid;

use crate::constraint::{Constraint, ConstraintStatus, EngineLog};
use crate::dismissal::{is_auth_related_and_untrustworthy, is_near_duplicate};
use crate::materialize::materialize_plan;
use crate::oracle_protocol::LimitingFactorReply;

#[derive(Debug)]
pub enum FixCycleOutcome {
    /// Oracle returned `{action: "skip", ...}`.
    Skipped { reason: String, tokens: TokenUsage },
    /// Rejected before ever reaching the engine log: auth-related or
    /// near-duplicate of a blocked constraint.
    Dismissed { reason: String, tokens: TokenUsage },
    /// A new active constraint, with its materialised specs ready to
    /// file into the Work Queue.
    Created {
        constraint: Constraint,
        specs: Vec<(Specification, Bucket)>,
        tokens: TokenUsage,
    },
    /// Transport/parse failure — treated as oracle "skip" per §9.
    OracleUnavailable { reason: String, tokens: TokenUsage },
}

#[allow(clippy::too_many_arguments)]
pub async fn run_fix_cycle(
    oracle: &dyn Oracle,
    goals_text: &str,
    evidence_summary: &str,
    log: &EngineLog,
    crawl_authenticated: bool,
    path_policy: &PathPolicy,
    unlocked_categories: &[String],
    timeout: std::time::Duration,
) -> FixCycleOutcome {
    let prompt = compose_oracle_task(goals_text, evidence_summary, log);
    let request = OracleRequest {
        messages: vec![
            Message::system("You are the constraint-identification oracle for an autonomous code-improvement agent."),
            Message::user(prompt),
        ],
        timeout,
    };

    let reply = match oracle.ask(request).await {
        Ok(reply) => reply,
        Err(OracleError::Transport(reason)) => {
            return FixCycleOutcome::OracleUnavailable {
                reason,
                tokens: TokenUsage::default(),
            }
        }
        Err(e) => {
            return FixCycleOutcome::OracleUnavailable {
                reason: e.to_string(),
                tokens: TokenUsage::default(),
            }
        }
    };
    let tokens = TokenUsage::from(&reply);

    let parsed: LimitingFactorReply = match extract_reply(&reply) {
        Ok(parsed) => parsed,
        Err(e) => return FixCycleOutcome::OracleUnavailable { reason: e.to_string(), tokens },
    };

    let (limiting_factor, plan, verification_pages, completion_criteria) = match parsed {
        LimitingFactorReply::Skip { reason, .. } => return FixCycleOutcome::Skipped { reason, tokens },
        LimitingFactorReply::Proposal {
            limiting_factor,
            plan,
            verification_pages,
            completion_criteria,
        } => (limiting_factor, plan, verification_pages, completion_criteria),
    };

    if is_auth_related_and_untrustworthy(&limiting_factor.evidence_from_crawl, crawl_authenticated) {
        return FixCycleOutcome::Dismissed {
            reason: "Auth-related constraint auto-dismissed".to_string(),
            tokens,
        };
    }

    let blocked = log.blocked_descriptions();
    if is_near_duplicate(&limiting_factor.description, &blocked) {
        return FixCycleOutcome::Dismissed {
            reason: "Near-duplicate of a previously dismissed constraint".to_string(),
            tokens,
        };
    }

    let constraint = Constraint {
        id: Uuid::new_v4().to_string(),
        description: limiting_factor.description,
        why: limiting_factor.why,
        unblocks: limiting_factor.unblocks,
        score: limiting_factor.constraint_score,
        category: limiting_factor.category,
        evidence_from_crawl: limiting_factor.evidence_from_crawl,
        steps: plan
            .into_iter()
            .map(|p| crate::constraint::PlanStep {
                step: p.step,
                file_path: p.file_path,
                description: p.description,
                success_criteria: p.success_criteria,
                test_command: p.test_command,
                priority: p.priority,
            })
            .collect(),
        verification_pages,
        completion_criteria,
        identified_at: Utc::now(),
        status: ConstraintStatus::Active,
        resolved_at: None,
    };

    let specs = materialize_plan(&constraint, path_policy, unlocked_categories);

    FixCycleOutcome::Created { constraint, specs, tokens }
}

fn compose_oracle_task(goals_text: &str, evidence_summary: &str, log: &EngineLog) -> String {
    let blocked = log.blocked_descriptions().join("; ");
    let failed: Vec<String> = log
        .failed_attempts
        .iter()
        .map(|a| format!("{}: {}", a.constraint, a.reason))
        .collect();

    format!(
        "GOALS:\n{goals_text}\n\nEVIDENCE SUMMARY:\n{evidence_summary}\n\nBLOCKED CONSTRAINTS:\n{blocked}\n\nFAILED ATTEMPTS:\n{}\n",
        failed.join("\n")
    )
}

//! Spec materialization (§4.6 step 5): turn a constraint's plan steps
//! into Work Queue Specifications, with sensitive-category routing.

use chrono::Utc;
use elon_queue::{Bucket, SpecAction, SpecSource, Specification};
use elon_safety::PathPolicy;

use crate::constraint::{Constraint, PlanStep};

/// Keywords that force a step to `pending` regardless of auto-approve
/// category or path safety, unless the operator has explicitly unlocked
/// that category (§4.6 step 5).
const SENSITIVE_CATEGORY_KEYWORDS: &[&str] = &[
    "auth",
    "security",
    "permission",
    "database",
    "payment",
    "deletion",
    "credential",
];

#[must_use]
pub fn matches_sensitive_category(description: &str) -> Option<&'static str> {
    let lower = description.to_lowercase();
    SENSITIVE_CATEGORY_KEYWORDS
        .iter()
        .find(|kw| lower.contains(*kw))
        .copied()
}

/// Materialise one [`Specification`] per plan step, with id
/// `elon-<constraintId>-step<NN>` (zero-padded to 2 digits).
pub fn materialize_plan(
    constraint: &Constraint,
    path_policy: &PathPolicy,
    unlocked_categories: &[String],
) -> Vec<(Specification, Bucket)> {
    constraint
        .steps
        .iter()
        .map(|step| materialize_step(constraint, step, path_policy, unlocked_categories))
        .collect()
}

fn materialize_step(
    constraint: &Constraint,
    step: &PlanStep,
    path_policy: &PathPolicy,
    unlocked_categories: &[String],
) -> (Specification, Bucket) {
    let id = format!("elon-{}-step{:02}", constraint.id, step.step);
    let sensitive = matches_sensitive_category(&step.description);
    let sensitive_and_locked = sensitive
        .map(|kw| !unlocked_categories.iter().any(|c| c == kw))
        .unwrap_or(false);

    let path_decision = path_policy.check(&step.file_path);
    let bucket = if sensitive_and_locked {
        Bucket::Pending
    } else if path_decision.safe {
        Bucket::Approved
    } else {
        Bucket::Pending
    };

    let spec = Specification {
        id: id.clone(),
        file_path: step.file_path.clone(),
        description: step.description.clone(),
        success_criteria: step.success_criteria.clone(),
        action: SpecAction::Change,
        test_command: step.test_command.clone(),
        runtime_validation: None,
        priority: step.priority,
        category: sensitive.unwrap_or("general").to_string(),
        source: SpecSource::ConstraintFix,
        constraint_id: Some(constraint.id.clone()),
        created_at: Utc::now(),
        blocked_category: if sensitive_and_locked {
            sensitive.map(str::to_string)
        } else {
            None
        },
    };

    (spec, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstraintStatus;
    use elon_queue::Priority;
    use elon_safety::PathPolicyRules;

    fn policy() -> PathPolicy {
        PathPolicy::compile(PathPolicyRules {
            safe_paths: vec!["src/**".to_string()],
            never_touch: vec![],
        })
        .unwrap()
    }

    fn constraint_with_step(description: &str, file_path: &str) -> Constraint {
        Constraint {
            id: "c1".to_string(),
            description: "fix thing".to_string(),
            why: "because".to_string(),
            unblocks: vec![],
            score: 5,
            category: "bugfix".to_string(),
            evidence_from_crawl: vec![],
            steps: vec![PlanStep {
                step: 1,
                file_path: file_path.to_string(),
                description: description.to_string(),
                success_criteria: vec!["compiles".to_string()],
                test_command: None,
                priority: Priority::Medium,
            }],
            verification_pages: vec![],
            completion_criteria: "done".to_string(),
            identified_at: Utc::now(),
            status: ConstraintStatus::Active,
            resolved_at: None,
        }
    }

    #[test]
    fn sensitive_keyword_routes_to_pending_even_on_safe_path() {
        let constraint = constraint_with_step("Rework auth token refresh", "src/auth.ts");
        let result = materialize_plan(&constraint, &policy(), &[]);
        assert_eq!(result[0].1, Bucket::Pending);
        assert_eq!(result[0].0.blocked_category.as_deref(), Some("auth"));
    }

    #[test]
    fn unlocked_sensitive_category_routes_normally() {
        let constraint = constraint_with_step("Rework auth token refresh", "src/auth.ts");
        let result = materialize_plan(&constraint, &policy(), &["auth".to_string()]);
        assert_eq!(result[0].1, Bucket::Approved);
        assert!(result[0].0.blocked_category.is_none());
    }

    #[test]
    fn non_sensitive_step_on_unsafe_path_routes_pending() {
        let constraint = constraint_with_step("Tidy up formatting", "README.md");
        let result = materialize_plan(&constraint, &policy(), &[]);
        assert_eq!(result[0].1, Bucket::Pending);
    }

    #[test]
    fn non_sensitive_step_on_safe_path_auto_approves() {
        let constraint = constraint_with_step("Tidy up formatting", "src/format.ts");
        let result = materialize_plan(&constraint, &policy(), &[]);
        assert_eq!(result[0].1, Bucket::Approved);
    }

    #[test]
    fn step_id_is_zero_padded() {
        let constraint = constraint_with_step("Tidy up formatting", "src/format.ts");
        let result = materialize_plan(&constraint, &policy(), &[]);
        assert_eq!(result[0].0.id, "elon-c1-step01");
    }
}

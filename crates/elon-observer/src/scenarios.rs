//! Scenario tests (§4.5 step 4): a fixed list of named multi-step
//! browser scenarios (navigate → wait-for-selector → assert-no-error-toast
//! → API check). The browser driver itself is out of scope; this module
//! defines the step vocabulary and aggregates per-step results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    Navigate { url: String },
    WaitForSelector { selector: String },
    AssertNoErrorToast,
    ApiCheck { url: String, expect_status: u16 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps: Vec<StepResult>,
}

/// The browser-driven step executor, implemented externally.
#[async_trait]
pub trait ScenarioRunner: Send + Sync {
    async fn run_step(&self, step: &ScenarioStep) -> StepResult;
}

pub async fn run_scenario(runner: &dyn ScenarioRunner, scenario: &Scenario) -> ScenarioResult {
    let mut results = Vec::with_capacity(scenario.steps.len());
    let mut overall_passed = true;

    for (index, step) in scenario.steps.iter().enumerate() {
        let mut result = runner.run_step(step).await;
        result.step_index = index;
        if !result.passed {
            overall_passed = false;
        }
        results.push(result);
        if !overall_passed {
            break;
        }
    }

    ScenarioResult {
        name: scenario.name.clone(),
        passed: overall_passed,
        steps: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysPass;
    #[async_trait]
    impl ScenarioRunner for AlwaysPass {
        async fn run_step(&self, _step: &ScenarioStep) -> StepResult {
            StepResult {
                step_index: 0,
                passed: true,
                detail: "ok".to_string(),
            }
        }
    }

    struct FailsSecondStep;
    #[async_trait]
    impl ScenarioRunner for FailsSecondStep {
        async fn run_step(&self, step: &ScenarioStep) -> StepResult {
            let passed = !matches!(step, ScenarioStep::AssertNoErrorToast);
            StepResult {
                step_index: 0,
                passed,
                detail: if passed { "ok".to_string() } else { "toast visible".to_string() },
            }
        }
    }

    fn scenario() -> Scenario {
        Scenario {
            name: "checkout".to_string(),
            steps: vec![
                ScenarioStep::Navigate { url: "/".to_string() },
                ScenarioStep::AssertNoErrorToast,
                ScenarioStep::ApiCheck {
                    url: "/api/cart".to_string(),
                    expect_status: 200,
                },
            ],
        }
    }

    #[tokio::test]
    async fn scenario_passes_when_every_step_passes() {
        let result = run_scenario(&AlwaysPass, &scenario()).await;
        assert!(result.passed);
        assert_eq!(result.steps.len(), 3);
    }

    #[tokio::test]
    async fn scenario_stops_and_fails_at_first_failing_step() {
        let result = run_scenario(&FailsSecondStep, &scenario()).await;
        assert!(!result.passed);
        assert_eq!(result.steps.len(), 2);
    }
}

//! Integration health (§4.5 step 3): for each named external
//! integration, probe configuration presence and credentialed-endpoint
//! reachability.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Healthy,
    Degraded,
    Misconfigured,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationCheck {
    pub name: String,
    pub status: IntegrationStatus,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct IntegrationSpec {
    pub name: String,
    pub required_env_vars: Vec<String>,
    pub probe_url: Option<String>,
}

pub async fn check_integration(spec: &IntegrationSpec) -> IntegrationCheck {
    let missing: Vec<&String> = spec
        .required_env_vars
        .iter()
        .filter(|var| std::env::var(var).is_err())
        .collect();

    if !missing.is_empty() {
        return IntegrationCheck {
            name: spec.name.clone(),
            status: IntegrationStatus::Misconfigured,
            detail: format!(
                "missing environment variable(s): {}",
                missing.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            ),
        };
    }

    let Some(url) = &spec.probe_url else {
        return IntegrationCheck {
            name: spec.name.clone(),
            status: IntegrationStatus::Healthy,
            detail: "configuration present, no reachability probe configured".to_string(),
        };
    };

    let client = reqwest::Client::new();
    match client.get(url).timeout(PROBE_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => IntegrationCheck {
            name: spec.name.clone(),
            status: IntegrationStatus::Healthy,
            detail: "reachable".to_string(),
        },
        Ok(response) => IntegrationCheck {
            name: spec.name.clone(),
            status: IntegrationStatus::Degraded,
            detail: format!("http status {}", response.status()),
        },
        Err(e) => IntegrationCheck {
            name: spec.name.clone(),
            status: IntegrationStatus::Error,
            detail: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_env_var_is_misconfigured() {
        let spec = IntegrationSpec {
            name: "stripe".to_string(),
            required_env_vars: vec!["ELON_TEST_DEFINITELY_UNSET_VAR".to_string()],
            probe_url: None,
        };
        let check = check_integration(&spec).await;
        assert_eq!(check.status, IntegrationStatus::Misconfigured);
    }

    #[tokio::test]
    async fn no_probe_url_with_present_env_is_healthy() {
        std::env::set_var("ELON_TEST_PRESENT_VAR", "x");
        let spec = IntegrationSpec {
            name: "simple".to_string(),
            required_env_vars: vec!["ELON_TEST_PRESENT_VAR".to_string()],
            probe_url: None,
        };
        let check = check_integration(&spec).await;
        assert_eq!(check.status, IntegrationStatus::Healthy);
        std::env::remove_var("ELON_TEST_PRESENT_VAR");
    }
}

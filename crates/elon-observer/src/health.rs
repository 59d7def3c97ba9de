//! Health probe (§4.5 step 1): single GET, 10s cap.

use std::time::Duration;

const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy { reason: String },
}

pub async fn probe_health(url: &str) -> HealthStatus {
    let client = reqwest::Client::new();
    match client.get(url).timeout(HEALTH_PROBE_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => HealthStatus::Healthy,
        Ok(response) => HealthStatus::Unhealthy {
            reason: format!("http status {}", response.status()),
        },
        Err(e) if e.is_timeout() => HealthStatus::Unhealthy {
            reason: "timed out after 10s".to_string(),
        },
        Err(e) => HealthStatus::Unhealthy {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_is_unhealthy() {
        let status = probe_health("http://127.0.0.1:1/unreachable").await;
        assert!(matches!(status, HealthStatus::Unhealthy { .. }));
    }
}

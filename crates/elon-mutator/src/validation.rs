//! Test and runtime validation invoked by the Spec Executor after a
//! mutation is applied (§4.2).

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::Instant;

/// Token that, when present in test-command output, is treated as a
/// pass regardless of exit code (a project with literally no test
/// suite configured must not block the loop).
const NO_TEST_SPECIFIED_TOKEN: &str = "no test specified";

const TEST_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);
const CRASH_WATCH_WINDOW: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeValidation {
    pub health_url: String,
    pub start_command: Option<String>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Passed,
    Failed(String),
}

/// Run `test_command`, bounded at 60s. Non-zero exit fails unless the
/// output contains [`NO_TEST_SPECIFIED_TOKEN`].
pub async fn run_test_command(test_command: &str) -> ValidationOutcome {
    let child = Command::new("sh")
        .arg("-c")
        .arg(test_command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    let mut child = match child {
        Ok(c) => c,
        Err(e) => return ValidationOutcome::Failed(format!("failed to spawn test command: {e}")),
    };

    let wait = tokio::time::timeout(TEST_COMMAND_TIMEOUT, child.wait()).await;
    let status = match wait {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => return ValidationOutcome::Failed(format!("test command errored: {e}")),
        Err(_) => {
            let _ = child.kill().await;
            return ValidationOutcome::Failed("test command exceeded 60s timeout".to_string());
        }
    };

    let mut combined = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        let _ = stdout.read_to_string(&mut combined).await;
    }
    if let Some(mut stderr) = child.stderr.take() {
        let mut err_buf = String::new();
        let _ = stderr.read_to_string(&mut err_buf).await;
        combined.push_str(&err_buf);
    }

    if combined.to_lowercase().contains(NO_TEST_SPECIFIED_TOKEN) {
        return ValidationOutcome::Passed;
    }

    if status.success() {
        ValidationOutcome::Passed
    } else {
        ValidationOutcome::Failed(format!("test command exited with {status}: {combined}"))
    }
}

/// Probe `runtime_validation.healthUrl` every 2s up to `timeoutMs`,
/// accepting HTTP 2xx/3xx. A transport error is "not yet healthy", not
/// terminal, until the timeout budget is exhausted. Optionally starts a
/// process first and watches it for crashes during a 5s window.
pub async fn run_runtime_validation(runtime: &RuntimeValidation) -> ValidationOutcome {
    let mut started_process = None;
    if let Some(start_command) = &runtime.start_command {
        match Command::new("sh")
            .arg("-c")
            .arg(start_command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => started_process = Some(child),
            Err(e) => return ValidationOutcome::Failed(format!("failed to start process: {e}")),
        }

        let crash_deadline = Instant::now() + CRASH_WATCH_WINDOW;
        while Instant::now() < crash_deadline {
            if let Some(child) = started_process.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    return ValidationOutcome::Failed(format!(
                        "started process exited during crash watch window with {status}"
                    ));
                }
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    let client = reqwest::Client::new();
    let deadline = Instant::now() + Duration::from_millis(runtime.timeout_ms);

    loop {
        match client.get(&runtime.health_url).send().await {
            Ok(response) if response.status().is_success() || response.status().is_redirection() => {
                return ValidationOutcome::Passed;
            }
            _ => {
                if Instant::now() >= deadline {
                    return ValidationOutcome::Failed(format!(
                        "health url '{}' did not become healthy within {}ms",
                        runtime.health_url, runtime.timeout_ms
                    ));
                }
                tokio::time::sleep(HEALTH_POLL_INTERVAL).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_test_specified_token_is_a_pass_despite_nonzero_exit() {
        let outcome = run_test_command("echo 'no test specified'; exit 1").await;
        assert_eq!(outcome, ValidationOutcome::Passed);
    }

    #[tokio::test]
    async fn zero_exit_is_a_pass() {
        let outcome = run_test_command("exit 0").await;
        assert_eq!(outcome, ValidationOutcome::Passed);
    }

    #[tokio::test]
    async fn nonzero_exit_without_token_fails() {
        let outcome = run_test_command("echo boom; exit 1").await;
        assert!(matches!(outcome, ValidationOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn health_probe_against_unreachable_host_fails_after_timeout() {
        let runtime = RuntimeValidation {
            health_url: "http://127.0.0.1:1/definitely-unreachable".to_string(),
            start_command: None,
            timeout_ms: 500,
        };
        let outcome = run_runtime_validation(&runtime).await;
        assert!(matches!(outcome, ValidationOutcome::Failed(_)));
    }
}
